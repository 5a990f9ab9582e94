//! GitHub token discovery

use super::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Resolved GitHub credentials
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// API token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// Find a GitHub token
///
/// Environment variables win over `gh auth token`.
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    for var in TOKEN_ENV_VARS {
        if let Ok(token) = std::env::var(var)
            && !token.trim().is_empty()
        {
            debug!(var, "using token from environment");
            return Ok(GitHubAuthConfig {
                token: token.trim().to_string(),
                source: AuthSource::EnvVar,
                host: host.map(ToString::to_string),
            });
        }
    }

    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(h) = host {
        cmd.args(["--hostname", h]);
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| Error::Auth(format!("no token in environment and `gh` failed to run: {e}")))?;

    if !output.status.success() {
        return Err(Error::Auth(
            "no token in GITHUB_TOKEN/GH_TOKEN and `gh auth token` failed; run `gh auth login`"
                .to_string(),
        ));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("`gh auth token` returned an empty token".to_string()));
    }

    debug!("using token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
        host: host.map(ToString::to_string),
    })
}
