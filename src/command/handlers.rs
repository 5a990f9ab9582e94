//! Command handlers
//!
//! Each handler runs one command end to end and returns the outcomes to
//! report. `handle_comment` wraps them with parsing, permission checks and
//! notification, the way a webhook event would drive them.

use crate::command::notify::{publish_outcomes, react, report_failure};
use crate::command::parse::{BOT_COMMAND, Command, is_bot_command, parse_command};
use crate::config::StackerConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::readiness::find_unready_prs;
use crate::rewrite::{Settle, fold_stack, squash_pr};
use crate::stack::{Scope, resolve_stack, select};
use crate::types::{CommandOutcome, PullRequest, Reaction};
use tracing::{debug, info};

/// A comment on a PR that may contain a bot command
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// PR the comment was posted on
    pub pr_number: u64,
    /// Comment ID, used for reactions
    pub comment_id: Option<u64>,
    /// Login of the commenter
    pub sender: String,
    /// Comment text
    pub body: String,
}

/// Usage text for `/stackbot help`
pub fn help_outcome() -> CommandOutcome {
    CommandOutcome {
        message: format!(
            "- `{BOT_COMMAND} fold [down|up|all|only]`: Folds a stack of PRs from this PR down into trunk\n\
             - `{BOT_COMMAND} squash [down|up|all|only]`: Squashes each selected PR to one commit using its title and description"
        ),
        target_issue_number: None,
    }
}

/// Resolve the stack around `pr_number` and narrow it to `scope`
///
/// Returns the full stack alongside the selection.
async fn stack_selection(
    platform: &dyn PlatformService,
    pr_number: u64,
    trunk: &str,
    scope: Scope,
) -> Result<(Vec<PullRequest>, Vec<PullRequest>)> {
    let open_prs = platform.list_open_prs().await?;
    let stack = resolve_stack(pr_number, trunk, &open_prs)?;
    let selected = select(pr_number, &stack, scope)?;
    debug!(
        pr_number,
        %scope,
        selected = ?selected.iter().map(|pr| pr.number).collect::<Vec<_>>(),
        "selected PRs"
    );
    Ok((stack, selected))
}

/// Squash every PR `scope` selects around `pr_number`
///
/// PRs are squashed bottom first, one at a time, so each lands on its
/// already-squashed base.
pub async fn handle_squash(
    platform: &dyn PlatformService,
    config: &StackerConfig,
    pr_number: u64,
    scope: Scope,
) -> Result<Vec<CommandOutcome>> {
    let trunk = config.resolve_trunk(platform).await?;
    let settle = Settle::from(config.settle);
    let (_, selected) = stack_selection(platform, pr_number, &trunk, scope).await?;

    let mut outcomes = Vec::with_capacity(selected.len());
    for pr in &selected {
        let squashed = squash_pr(platform, pr.number, &settle).await?;
        outcomes.push(squashed.outcome());
    }
    Ok(outcomes)
}

/// Fold the PRs `scope` selects around `pr_number` into trunk
///
/// Unless readiness checks are disabled, every selected PR must be ready
/// before anything is rewritten. Failures are wrapped as fold failures
/// without changing their kind.
pub async fn handle_fold(
    platform: &dyn PlatformService,
    config: &StackerConfig,
    pr_number: u64,
    scope: Scope,
) -> Result<Vec<CommandOutcome>> {
    fold_inner(platform, config, pr_number, scope)
        .await
        .map_err(|e| Error::Fold {
            source: Box::new(e),
        })
}

async fn fold_inner(
    platform: &dyn PlatformService,
    config: &StackerConfig,
    pr_number: u64,
    scope: Scope,
) -> Result<Vec<CommandOutcome>> {
    let trunk = config.resolve_trunk(platform).await?;
    let settle = Settle::from(config.settle);
    let (stack, selected) = stack_selection(platform, pr_number, &trunk, scope).await?;

    // Only a prefix of the stack can be replayed onto trunk
    if selected.first().map(|pr| pr.number) != stack.first().map(|pr| pr.number) {
        return Err(Error::Validation(format!(
            "Folding with scope `{scope}` from PR #{pr_number} would skip the bottom of the stack; fold must include the PR based on `{trunk}`."
        )));
    }
    if let Some(root) = stack.first().filter(|pr| pr.base_ref != trunk) {
        return Err(Error::Validation(format!(
            "PR #{} is based on `{}`, not `{trunk}`; only stacks based on `{trunk}` can be folded.",
            root.number, root.base_ref
        )));
    }

    if config.skip_ready_check {
        debug!(pr_number, "skipping readiness check");
    } else {
        let unready = find_unready_prs(platform, &selected, config.require_single_commit).await?;
        if !unready.is_empty() {
            let list: Vec<String> = unready.iter().map(|n| format!("- #{n}")).collect();
            return Err(Error::Validation(format!(
                "The following PRs are not ready to be folded:\n{}",
                list.join("\n")
            )));
        }
    }

    for pr in &selected {
        squash_pr(platform, pr.number, &settle).await?;
    }

    // PR directly above the folded range, when folding from mid-stack
    let next = stack
        .iter()
        .position(|pr| selected.last().is_some_and(|last| last.number == pr.number))
        .and_then(|idx| stack.get(idx + 1));

    let result = fold_stack(platform, &selected, next, &trunk, &settle).await?;
    info!(
        pr_number,
        folded = result.outcomes.len(),
        reconciled = result.reconciled,
        reattached = ?result.reattached,
        "fold complete"
    );
    Ok(result.outcomes)
}

/// Handle a PR comment as the bot would
///
/// Non-command comments and disabled repositories produce no outcomes.
/// On success outcomes are posted as comments; on failure, including an
/// unreadable configuration, the error is posted on the originating PR and
/// returned.
pub async fn handle_comment(
    platform: &dyn PlatformService,
    request: &CommandRequest,
) -> Result<Vec<CommandOutcome>> {
    if !is_bot_command(&request.body) {
        return Ok(Vec::new());
    }

    let config = match StackerConfig::load(platform).await {
        Ok(config) => config,
        Err(e) => {
            report_failure(platform, request, &e, false).await;
            return Err(e);
        }
    };
    if !config.enabled {
        debug!(pr_number = request.pr_number, "bot disabled for repository");
        return Ok(Vec::new());
    }

    match run_command(platform, &config, request).await {
        Ok(outcomes) => {
            publish_outcomes(platform, request.pr_number, &outcomes, config.single_comment).await?;
            Ok(outcomes)
        }
        Err(e) => {
            report_failure(platform, request, &e, config.single_comment).await;
            Err(e)
        }
    }
}

async fn run_command(
    platform: &dyn PlatformService,
    config: &StackerConfig,
    request: &CommandRequest,
) -> Result<Vec<CommandOutcome>> {
    let parsed = parse_command(&request.body).ok_or_else(|| {
        Error::Validation(format!(
            "The command `{}` was not recognized.",
            request.body.trim()
        ))
    })?;

    if config.restrict_commands_to_originator {
        let details = platform.get_pr_details(request.pr_number).await?;
        if details.author_login != request.sender {
            return Err(Error::Permission(format!(
                "Only @{} can run commands on PR #{}.",
                details.author_login, request.pr_number
            )));
        }
    }

    if let Some(comment_id) = request.comment_id {
        react(platform, comment_id, Reaction::Rocket).await;
    }

    let scope = parsed.scope_or_default();
    info!(pr_number = request.pr_number, command = %parsed.command, %scope, "running command");
    match parsed.command {
        Command::Squash => handle_squash(platform, config, request.pr_number, scope).await,
        Command::Fold => handle_fold(platform, config, request.pr_number, scope).await,
        Command::Help => Ok(vec![help_outcome()]),
    }
}
