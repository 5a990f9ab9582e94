//! Squash: collapse a PR into one commit on top of its base branch

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::rewrite::Settle;
use crate::types::{CommandOutcome, NewCommit, Signature};
use chrono::Utc;
use tracing::{debug, info};

/// Outcome of squashing one PR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashResult {
    /// PR that was squashed
    pub pr_number: u64,
    /// SHA of the single commit the head branch now points at
    pub sha: String,
    /// How many commits were collapsed
    pub squashed_commits: usize,
}

impl SquashResult {
    /// Notification for the squashed PR
    pub fn outcome(&self) -> CommandOutcome {
        CommandOutcome::for_pr(
            self.pr_number,
            format!(
                "✅ Successfully squashed {} commits into one commit with the PR title and description.",
                self.squashed_commits
            ),
        )
    }
}

/// Commit message for a squashed PR: title, blank line, body
pub fn squash_message(title: &str, body: Option<&str>) -> String {
    format!("{title}\n\n{}", body.unwrap_or_default())
}

/// Squash a PR into a single commit parented on its base branch's tip
///
/// The new commit keeps the head's tree, so content is unchanged. Author
/// identity comes from the PR's first commit, or from the PR author's
/// login when that commit carries none. The base tip is read once, so a
/// later base movement is not reconciled here.
pub async fn squash_pr(
    platform: &dyn PlatformService,
    pr_number: u64,
    settle: &Settle,
) -> Result<SquashResult> {
    squash_inner(platform, pr_number, settle)
        .await
        .map_err(|e| match e {
            Error::EmptyPr(_) => e,
            other => Error::Squash {
                pr_number,
                source: Box::new(other),
            },
        })
}

async fn squash_inner(
    platform: &dyn PlatformService,
    pr_number: u64,
    settle: &Settle,
) -> Result<SquashResult> {
    let details = platform.get_pr_details(pr_number).await?;
    let commits = platform.list_pr_commits(pr_number).await?;

    let Some(first) = commits.first() else {
        return Err(Error::EmptyPr(pr_number));
    };

    let author = first
        .author
        .clone()
        .unwrap_or_else(|| Signature::noreply(&details.author_login, Utc::now()));

    let base_sha = platform.get_branch_sha(&details.base_ref).await?;
    let head = platform.get_commit(&details.head_sha).await?;
    debug!(pr_number, base = %base_sha, tree = %head.tree_sha, "squashing onto base tip");

    let sha = platform
        .create_commit(&NewCommit {
            message: squash_message(&details.title, details.body.as_deref()),
            tree_sha: head.tree_sha,
            parents: vec![base_sha],
            author: Some(author),
            committer: None,
        })
        .await?;

    platform
        .update_branch(&details.head_ref, &sha, true)
        .await?;
    settle
        .wait_for_branch(platform, &details.head_ref, &sha)
        .await?;

    info!(
        pr_number,
        head_ref = %details.head_ref,
        commits = commits.len(),
        %sha,
        "squashed PR"
    );
    Ok(SquashResult {
        pr_number,
        sha,
        squashed_commits: commits.len(),
    })
}
