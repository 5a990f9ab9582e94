//! Fold: replay a squashed prefix of the stack onto trunk
//!
//! New history is assembled on a scratch branch rooted at trunk's tip and
//! only published to trunk at the end. Each PR above the one being folded
//! is moved onto the scratch branch as soon as its parent lands there, so
//! its diff stays correct mid-operation.
//!
//! There is no rollback: a failure leaves every ref mutated so far in
//! place. On failure, PRs already moved onto the scratch branch get their
//! original base back before the scratch branch is deleted; if that fails
//! the scratch branch is kept, since deleting a PR's base closes the PR.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::rewrite::Settle;
use crate::types::{CommandOutcome, PullRequest};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Stage a fold has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldPhase {
    /// Scratch branch not yet created
    Started,
    /// Placing the PR at this stack position on the scratch branch
    Staging(usize),
    /// Trunk moved; replaying onto the new tip
    Reconciling,
    /// Trunk points at the folded history
    TrunkUpdated,
    /// Scratch branch deleted
    ScratchCleaned,
    /// Remaining stack reattached to trunk
    Done,
}

impl std::fmt::Display for FoldPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Staging(i) => write!(f, "staging PR {}", i + 1),
            Self::Reconciling => write!(f, "reconciling with trunk"),
            Self::TrunkUpdated => write!(f, "trunk updated"),
            Self::ScratchCleaned => write!(f, "scratch branch cleaned"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Outcome of a fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldResult {
    /// One notification per folded PR, bottom first
    pub outcomes: Vec<CommandOutcome>,
    /// Trunk's tip after the fold
    pub trunk_sha: String,
    /// Whether trunk moved mid-fold and the folded commits were replayed
    pub reconciled: bool,
    /// PR moved onto trunk after a mid-stack fold
    pub reattached: Option<u64>,
}

/// Name of the temporary branch used to assemble a fold
pub fn scratch_branch_name(first_pr: u64) -> String {
    format!("temp-fold-stack-{first_pr}-{}", Utc::now().timestamp_millis())
}

/// Fold `prs` (bottom first, each already squashed) into `trunk`
///
/// `next` is the PR directly above the folded range, if the fold stops
/// mid-stack; it is rebased onto the new trunk tip afterwards.
pub async fn fold_stack(
    platform: &dyn PlatformService,
    prs: &[PullRequest],
    next: Option<&PullRequest>,
    trunk: &str,
    settle: &Settle,
) -> Result<FoldResult> {
    let mut phase = FoldPhase::Started;
    let result = run_fold(platform, prs, next, trunk, settle, &mut phase).await;
    if let Err(ref e) = result {
        warn!(%phase, error = %e, "fold stopped; refs updated so far are left in place");
    }
    result
}

async fn run_fold(
    platform: &dyn PlatformService,
    prs: &[PullRequest],
    next: Option<&PullRequest>,
    trunk: &str,
    settle: &Settle,
    phase: &mut FoldPhase,
) -> Result<FoldResult> {
    let Some(first) = prs.first() else {
        return Err(Error::Validation("there are no PRs to fold".to_string()));
    };

    let start_sha = platform.get_branch_sha(trunk).await?;
    let scratch = scratch_branch_name(first.number);
    platform.create_branch(&scratch, &start_sha).await?;
    info!(%scratch, trunk, start = %start_sha, "created scratch branch");

    let mut retargeted = Vec::new();
    let published = match publish(
        platform,
        prs,
        trunk,
        &scratch,
        &start_sha,
        settle,
        phase,
        &mut retargeted,
    )
    .await
    {
        Ok(published) => published,
        Err(e) => {
            abandon_scratch(platform, &scratch, &retargeted).await;
            return Err(e);
        }
    };

    platform.delete_branch(&scratch).await?;
    *phase = FoldPhase::ScratchCleaned;

    let reattached = match next {
        Some(pr) => {
            reattach_to_trunk(platform, pr, trunk, settle).await?;
            Some(pr.number)
        }
        None => None,
    };
    *phase = FoldPhase::Done;

    Ok(FoldResult {
        reattached,
        ..published
    })
}

/// Best-effort cleanup after a failed fold
///
/// PRs in `retargeted` are pointed back at their original base. The scratch
/// branch is only deleted once nothing targets it any more.
async fn abandon_scratch(
    platform: &dyn PlatformService,
    scratch: &str,
    retargeted: &[PullRequest],
) {
    let mut stranded = Vec::new();
    for pr in retargeted {
        match platform.update_pr_base(pr.number, &pr.base_ref).await {
            Ok(_) => debug!(pr_number = pr.number, base = %pr.base_ref, "restored PR base"),
            Err(e) => {
                warn!(pr_number = pr.number, base = %pr.base_ref, error = %e, "could not restore PR base");
                stranded.push(pr.number);
            }
        }
    }

    if !stranded.is_empty() {
        warn!(%scratch, prs = ?stranded, "PRs still target scratch branch; leaving it in place");
        return;
    }
    if let Err(e) = platform.delete_branch(scratch).await {
        warn!(%scratch, error = %e, "could not delete scratch branch");
    }
}

/// Assemble the folded history on `scratch` and point trunk at it
///
/// Every PR whose base is moved to `scratch` is recorded in `retargeted`.
#[allow(clippy::too_many_arguments)]
async fn publish(
    platform: &dyn PlatformService,
    prs: &[PullRequest],
    trunk: &str,
    scratch: &str,
    start_sha: &str,
    settle: &Settle,
    phase: &mut FoldPhase,
    retargeted: &mut Vec<PullRequest>,
) -> Result<FoldResult> {
    settle.wait_for_branch(platform, scratch, start_sha).await?;

    let started_at = prs.last().map_or(0, |pr| pr.number);
    let mut tip = start_sha.to_string();
    let mut outcomes = Vec::with_capacity(prs.len());

    for (i, pr) in prs.iter().enumerate() {
        *phase = FoldPhase::Staging(i);
        info!(
            pr_number = pr.number,
            head_ref = %pr.head_ref,
            position = %format!("{}/{}", i + 1, prs.len()),
            "processing PR in stack"
        );

        let head_sha = platform.get_branch_sha(&pr.head_ref).await?;
        let head = platform.get_commit(&head_sha).await?;

        if head.parents == [tip.as_str()] {
            // Already on top of the assembled history: reuse verbatim
            platform.update_branch(scratch, &head_sha, true).await?;
            settle.wait_for_branch(platform, scratch, &head_sha).await?;
            tip = head_sha;
        } else {
            let rebuilt = platform.create_commit(&head.reparent(&tip)).await?;
            platform.update_branch(&pr.head_ref, &rebuilt, true).await?;
            settle.wait_for_branch(platform, &pr.head_ref, &rebuilt).await?;
            platform.update_branch(scratch, &rebuilt, true).await?;
            settle.wait_for_branch(platform, scratch, &rebuilt).await?;
            tip = rebuilt;
        }

        if let Some(above) = prs.get(i + 1) {
            info!(
                pr_number = above.number,
                old_base = %above.base_ref,
                new_base = %scratch,
                "changing base of PR to scratch branch"
            );
            platform.update_pr_base(above.number, scratch).await?;
            retargeted.push(above.clone());
            settle.wait_for_base(platform, above.number, scratch).await?;
            rebase_head(platform, above, &tip, settle).await?;
        }

        outcomes.push(CommandOutcome::for_pr(
            pr.number,
            format!(
                "✅ Folded this PR into `{trunk}` as part of a fold operation started at PR #{started_at}"
            ),
        ));
    }

    let current = platform.get_branch_sha(trunk).await?;
    let reconciled = current != start_sha;
    let final_sha = if reconciled {
        *phase = FoldPhase::Reconciling;
        info!(
            old_trunk = %short(start_sha),
            new_trunk = %short(&current),
            "trunk moved during fold, replaying folded commits on top of it"
        );
        let folded = platform.compare_commits(start_sha, &tip).await?;
        replay(platform, &folded, &current).await?
    } else {
        tip
    };

    platform.update_branch(trunk, &final_sha, true).await?;
    settle.wait_for_branch(platform, trunk, &final_sha).await?;
    *phase = FoldPhase::TrunkUpdated;
    info!(trunk, sha = %final_sha, folded = prs.len(), "updated trunk");

    Ok(FoldResult {
        outcomes,
        trunk_sha: final_sha,
        reconciled,
        reattached: None,
    })
}

/// Move a PR left above a mid-stack fold onto trunk
///
/// Its base becomes trunk and its head commit is recreated on trunk's tip
/// with the same tree, so its diff no longer repeats the folded changes.
/// Returns the new head SHA.
pub async fn reattach_to_trunk(
    platform: &dyn PlatformService,
    pr: &PullRequest,
    trunk: &str,
    settle: &Settle,
) -> Result<String> {
    info!(pr_number = pr.number, trunk, "setting base of next PR to trunk and rebasing its head");
    platform.update_pr_base(pr.number, trunk).await?;
    settle.wait_for_base(platform, pr.number, trunk).await?;

    let trunk_sha = platform.get_branch_sha(trunk).await?;
    let sha = rebase_head(platform, pr, &trunk_sha, settle).await?;
    info!(pr_number = pr.number, head_ref = %pr.head_ref, %sha, "rebased PR head onto trunk");
    Ok(sha)
}

/// Recreate a PR's head commit on `parent`, keeping tree and identities
///
/// A head already sitting directly on `parent` is left alone.
async fn rebase_head(
    platform: &dyn PlatformService,
    pr: &PullRequest,
    parent: &str,
    settle: &Settle,
) -> Result<String> {
    let head_sha = platform.get_branch_sha(&pr.head_ref).await?;
    let head = platform.get_commit(&head_sha).await?;
    if head.parents == [parent] {
        debug!(pr_number = pr.number, %head_sha, "head already on new parent");
        return Ok(head_sha);
    }
    let sha = platform.create_commit(&head.reparent(parent)).await?;
    platform.update_branch(&pr.head_ref, &sha, true).await?;
    settle.wait_for_branch(platform, &pr.head_ref, &sha).await?;
    Ok(sha)
}

/// Copy `commits` (oldest first) onto `onto`, returning the last copy
async fn replay(platform: &dyn PlatformService, commits: &[String], onto: &str) -> Result<String> {
    let mut rebased = onto.to_string();
    for sha in commits {
        let commit = platform.get_commit(sha).await?;
        rebased = platform.create_commit(&commit.reparent(&rebased)).await?;
    }
    Ok(rebased)
}

fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
