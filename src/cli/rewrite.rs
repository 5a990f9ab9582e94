//! Squash, fold and comment commands

use crate::cli::context::CommandContext;
use crate::cli::style::{check, emphasis, spinner};
use anstream::println;
use pr_stacker::command::{CommandRequest, handle_comment, handle_fold, handle_squash};
use pr_stacker::error::Result;
use pr_stacker::stack::Scope;
use pr_stacker::types::CommandOutcome;

/// Run the squash command
pub async fn run_squash(repo: Option<&str>, pr_number: u64, scope: Scope) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let progress = spinner(format!(
        "Squashing {} from #{pr_number}...",
        emphasis(&scope.to_string())
    ));
    let outcomes = handle_squash(ctx.platform.as_ref(), &ctx.config, pr_number, scope).await;
    progress.finish_and_clear();
    print_outcomes(&outcomes?);
    Ok(())
}

/// Run the fold command
pub async fn run_fold(repo: Option<&str>, pr_number: u64, scope: Scope) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let progress = spinner(format!(
        "Folding {} from #{pr_number} into {}...",
        emphasis(&scope.to_string()),
        emphasis(&ctx.trunk)
    ));
    let outcomes = handle_fold(ctx.platform.as_ref(), &ctx.config, pr_number, scope).await;
    progress.finish_and_clear();
    print_outcomes(&outcomes?);
    Ok(())
}

/// Run the comment command: handle `body` as if it was posted on the PR
pub async fn run_comment(repo: Option<&str>, request: CommandRequest) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let outcomes = handle_comment(ctx.platform.as_ref(), &request).await?;
    if outcomes.is_empty() {
        println!("Nothing to do: not a command, or the bot is disabled for this repository");
    }
    print_outcomes(&outcomes);
    Ok(())
}

fn print_outcomes(outcomes: &[CommandOutcome]) {
    for outcome in outcomes {
        match outcome.target_issue_number {
            Some(n) => println!("{} #{n}: {}", check(), outcome.message),
            None => println!("{}", outcome.message),
        }
    }
}
