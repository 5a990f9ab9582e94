//! Per-repository configuration
//!
//! Read from `.github/pr-stacker.toml` on the repository's default branch.
//! Every key is optional; a missing file yields the defaults.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::rewrite::Settle;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Location of the configuration file in the repository
pub const CONFIG_PATH: &str = ".github/pr-stacker.toml";

/// Bot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StackerConfig {
    /// Respond to commands at all
    pub enabled: bool,
    /// Trunk override (repository default branch when unset)
    pub main_branch: Option<String>,
    /// Only the PR author may run commands on it
    pub restrict_commands_to_originator: bool,
    /// Edit one bot comment per PR instead of posting new ones
    pub single_comment: bool,
    /// Fold without checking merge readiness
    pub skip_ready_check: bool,
    /// Readiness additionally requires exactly one commit per PR
    pub require_single_commit: bool,
    /// Consistency polling after remote mutations
    pub settle: SettleConfig,
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            main_branch: None,
            restrict_commands_to_originator: true,
            single_comment: false,
            skip_ready_check: false,
            require_single_commit: false,
            settle: SettleConfig::default(),
        }
    }
}

/// Polling bounds used after each ref mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SettleConfig {
    /// Delay between reads
    pub interval_ms: u64,
    /// Give up after this long
    pub timeout_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            timeout_ms: 15_000,
        }
    }
}

impl From<SettleConfig> for Settle {
    fn from(c: SettleConfig) -> Self {
        Self::new(
            Duration::from_millis(c.interval_ms),
            Duration::from_millis(c.timeout_ms),
        )
    }
}

impl StackerConfig {
    /// Parse configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid {CONFIG_PATH}: {e}")))
    }

    /// Load configuration from the repository, falling back to defaults
    pub async fn load(platform: &dyn PlatformService) -> Result<Self> {
        match platform.get_file_content(CONFIG_PATH).await? {
            Some(content) => {
                debug!(path = CONFIG_PATH, "loaded repository configuration");
                Self::from_toml(&content)
            }
            None => {
                debug!("no repository configuration, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Trunk branch: configured override or the repository default branch
    pub async fn resolve_trunk(&self, platform: &dyn PlatformService) -> Result<String> {
        match self.main_branch {
            Some(ref branch) => Ok(branch.clone()),
            None => platform.default_branch().await,
        }
    }
}
