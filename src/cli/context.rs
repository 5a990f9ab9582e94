//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by every subcommand.

use pr_stacker::config::StackerConfig;
use pr_stacker::error::{Error, Result};
use pr_stacker::platform::{PlatformService, create_platform_service, parse_repo_info};

/// Shared context for CLI commands that interact with the platform
///
/// This struct encapsulates the common setup:
/// - Parsing the repository coordinates
/// - Discovering a token and creating the service
/// - Loading the repository configuration
/// - Resolving trunk
pub struct CommandContext {
    /// Platform service (GitHub)
    pub platform: Box<dyn PlatformService>,
    /// Repository configuration
    pub config: StackerConfig,
    /// Trunk branch name (e.g., "main")
    pub trunk: String,
}

impl CommandContext {
    /// Create a new command context
    pub async fn new(repo: Option<&str>) -> Result<Self> {
        let repo = repo.ok_or_else(|| {
            Error::Config("no repository given; pass --repo owner/name or set GITHUB_REPOSITORY".to_string())
        })?;

        let platform_config = parse_repo_info(repo)?;
        let platform = create_platform_service(&platform_config).await?;
        let config = StackerConfig::load(platform.as_ref()).await?;
        let trunk = config.resolve_trunk(platform.as_ref()).await?;

        Ok(Self {
            platform,
            config,
            trunk,
        })
    }

    /// Repository as `owner/name`
    pub fn repo_slug(&self) -> String {
        let config = self.platform.config();
        format!("{}/{}", config.owner, config.repo)
    }
}
