//! Platform services for GitHub
//!
//! Everything the stack engine needs from the host goes through
//! [`PlatformService`]. All history manipulation happens through remote
//! ref and commit primitives; nothing is checked out locally.

mod detection;
mod factory;
mod github;

pub use detection::parse_repo_info;
pub use factory::create_platform_service;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    CheckRun, GitCommit, NewCommit, PlatformConfig, PrComment, PrCommit, PullRequest,
    PullRequestDetails, Reaction, RequiredChecks,
};
use async_trait::async_trait;

/// Platform service trait for PR, ref and commit operations
///
/// Branch names are passed without the `refs/heads/` prefix.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;

    /// Name of the repository's default branch
    async fn default_branch(&self) -> Result<String>;

    /// Read a file from the default branch, `None` if it does not exist
    async fn get_file_content(&self, path: &str) -> Result<Option<String>>;

    // =========================================================================
    // Pull requests
    // =========================================================================

    /// List all open PRs
    async fn list_open_prs(&self) -> Result<Vec<PullRequest>>;

    /// Fetch a PR afresh
    ///
    /// On GitHub this also triggers a recomputation of mergeability.
    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequestDetails>;

    /// List the commits belonging to a PR, oldest first
    async fn list_pr_commits(&self, pr_number: u64) -> Result<Vec<PrCommit>>;

    /// Update the base branch of an existing PR
    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<PullRequest>;

    // =========================================================================
    // Refs and commits
    // =========================================================================

    /// SHA of the commit a branch points at
    async fn get_branch_sha(&self, branch: &str) -> Result<String>;

    /// Create a branch pointing at `sha`
    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()>;

    /// Point an existing branch at `sha`
    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> Result<()>;

    /// Delete a branch
    async fn delete_branch(&self, branch: &str) -> Result<()>;

    /// Read a commit object
    async fn get_commit(&self, sha: &str) -> Result<GitCommit>;

    /// Create a commit object, returning its SHA
    async fn create_commit(&self, commit: &NewCommit) -> Result<String>;

    /// Commits reachable from `head` but not from `base`, oldest first
    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<String>>;

    // =========================================================================
    // Status checks
    // =========================================================================

    /// Required status checks for a branch
    ///
    /// Returns [`RequiredChecks::NotProtected`] when the branch has no
    /// protection rules instead of failing.
    async fn required_status_checks(&self, branch: &str) -> Result<RequiredChecks>;

    /// Check runs evaluated against a commit
    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>>;

    // =========================================================================
    // Comments
    // =========================================================================

    /// List comments on a PR
    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>>;

    /// Create a comment on a PR
    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Update an existing comment on a PR
    async fn update_pr_comment(&self, pr_number: u64, comment_id: u64, body: &str) -> Result<()>;

    /// React to a PR comment
    async fn add_comment_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()>;

    /// Login the service acts as (used to find its own comments)
    async fn current_user(&self) -> Result<String>;
}
