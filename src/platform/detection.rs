//! Repository detection from `owner/name` slugs and GitHub remote URLs

use crate::error::{Error, Result};
use crate::types::PlatformConfig;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static SSH_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ssh://)?git@(?P<host>[^:/]+)[:/](?P<path>.+?)(?:\.git)?/?$")
        .unwrap_or_else(|e| unreachable!("invalid SSH remote pattern: {e}"))
});

/// Parse repository coordinates
///
/// Accepts `owner/name`, `https://host/owner/name(.git)` and
/// `git@host:owner/name(.git)`. Hosts other than `github.com` are treated
/// as GitHub Enterprise.
pub fn parse_repo_info(input: &str) -> Result<PlatformConfig> {
    let input = input.trim();

    if let Some(caps) = SSH_REMOTE.captures(input) {
        return from_host_and_path(&caps["host"], &caps["path"], input);
    }

    if input.contains("://") {
        let url = Url::parse(input)
            .map_err(|e| Error::Config(format!("invalid repository URL {input}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("repository URL has no host: {input}")))?;
        let path = url.path().trim_start_matches('/').trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        return from_host_and_path(host, path, input);
    }

    let (owner, repo) = split_slug(input)?;
    Ok(PlatformConfig {
        owner,
        repo,
        host: None,
    })
}

fn from_host_and_path(host: &str, path: &str, input: &str) -> Result<PlatformConfig> {
    let (owner, repo) = split_slug(path)
        .map_err(|_| Error::Config(format!("could not find owner/name in {input}")))?;
    let host = (host != "github.com").then(|| host.to_string());
    Ok(PlatformConfig { owner, repo, host })
}

fn split_slug(slug: &str) -> Result<(String, String)> {
    match slug.split('/').collect::<Vec<_>>().as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Ok(((*owner).to_string(), (*repo).to_string()))
        }
        _ => Err(Error::Config(format!(
            "expected repository as owner/name, got `{slug}`"
        ))),
    }
}
