//! Merge readiness
//!
//! A PR may only be rewritten destructively when the host considers it
//! cleanly mergeable and every required status check has passed on its
//! head commit.

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{CheckRun, PullRequest, RequiredChecks};
use futures::future::try_join_all;
use tracing::debug;

/// Check whether a PR is ready to be folded
///
/// Re-fetches the PR so the host recomputes its mergeable state. Required
/// checks are those protecting the PR's base branch; a base without
/// protection rules requires nothing.
pub async fn check_merge_readiness(
    platform: &dyn PlatformService,
    pr_number: u64,
    require_single_commit: bool,
) -> Result<bool> {
    let details = platform.get_pr_details(pr_number).await?;

    if require_single_commit && details.commit_count != 1 {
        debug!(pr_number, commits = details.commit_count, "not ready: expected a single commit");
        return Ok(false);
    }

    if !details.is_clean() {
        debug!(pr_number, state = ?details.mergeable_state, "not ready: not cleanly mergeable");
        return Ok(false);
    }

    // Required checks come from the branch the PR merges into, not its head branch
    let required = match platform.required_status_checks(&details.base_ref).await? {
        RequiredChecks::NotProtected => {
            debug!(pr_number, base = %details.base_ref, "ready: base branch not protected");
            return Ok(true);
        }
        RequiredChecks::Contexts(contexts) => contexts,
    };

    let runs = platform.list_check_runs(&details.head_sha).await?;
    let ready = required_checks_passed(&required, &runs);
    debug!(pr_number, ready, required = required.len(), "checked required status checks");
    Ok(ready)
}

/// Every required check has at least one successful run
pub fn required_checks_passed(required: &[String], runs: &[CheckRun]) -> bool {
    required
        .iter()
        .all(|name| runs.iter().any(|run| &run.name == name && run.succeeded()))
}

/// Check a batch of PRs concurrently, returning the numbers of unready PRs
///
/// Order of the result follows `prs`. The first host failure aborts the
/// batch.
pub async fn find_unready_prs(
    platform: &dyn PlatformService,
    prs: &[PullRequest],
    require_single_commit: bool,
) -> Result<Vec<u64>> {
    let checks = try_join_all(
        prs.iter()
            .map(|pr| check_merge_readiness(platform, pr.number, require_single_commit)),
    )
    .await?;

    Ok(prs
        .iter()
        .zip(checks)
        .filter(|(_, ready)| !ready)
        .map(|(pr, _)| pr.number)
        .collect())
}
