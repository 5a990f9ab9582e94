//! Reporting command outcomes as PR comments

use crate::command::handlers::CommandRequest;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{CommandOutcome, Reaction};
use tracing::{debug, warn};

/// Post each outcome on its target PR (or `origin_pr`)
///
/// With `single_comment`, the bot's existing comment on a PR is edited
/// instead of adding a new one.
pub async fn publish_outcomes(
    platform: &dyn PlatformService,
    origin_pr: u64,
    outcomes: &[CommandOutcome],
    single_comment: bool,
) -> Result<()> {
    for outcome in outcomes {
        let pr_number = outcome.target_issue_number.unwrap_or(origin_pr);
        post_comment(platform, pr_number, &outcome.message, single_comment).await?;
    }
    Ok(())
}

/// Post a failure message and a `confused` reaction; never fails itself
pub async fn report_failure(
    platform: &dyn PlatformService,
    request: &CommandRequest,
    error: &Error,
    single_comment: bool,
) {
    debug!(pr_number = request.pr_number, kind = ?error.kind(), "reporting failure");
    if let Some(comment_id) = request.comment_id {
        react(platform, comment_id, Reaction::Confused).await;
    }

    let body = format!("❌ {error}");
    if let Err(e) = post_comment(platform, request.pr_number, &body, single_comment).await {
        warn!(pr_number = request.pr_number, error = %e, "could not post failure comment");
    }
}

/// Best-effort reaction on the triggering comment
pub(crate) async fn react(platform: &dyn PlatformService, comment_id: u64, reaction: Reaction) {
    if let Err(e) = platform.add_comment_reaction(comment_id, reaction).await {
        warn!(comment_id, %reaction, error = %e, "could not react to comment");
    }
}

async fn post_comment(
    platform: &dyn PlatformService,
    pr_number: u64,
    body: &str,
    single_comment: bool,
) -> Result<()> {
    if single_comment {
        let me = platform.current_user().await?;
        let comments = platform.list_pr_comments(pr_number).await?;
        if let Some(existing) = comments.iter().find(|c| c.author == me) {
            return platform
                .update_pr_comment(pr_number, existing.id, body)
                .await;
        }
    }
    platform.create_pr_comment(pr_number, body).await
}
