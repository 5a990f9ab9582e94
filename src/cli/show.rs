//! Stack command - print the stack a PR belongs to

use crate::cli::context::CommandContext;
use crate::cli::style::{emphasis, muted};
use anstream::println;
use pr_stacker::error::Result;
use pr_stacker::stack::resolve_stack;

/// Run the stack command
pub async fn run_stack(repo: Option<&str>, pr_number: u64) -> Result<()> {
    let ctx = CommandContext::new(repo).await?;
    let open_prs = ctx.platform.list_open_prs().await?;
    let stack = resolve_stack(pr_number, &ctx.trunk, &open_prs)?;

    println!("{}", emphasis(&ctx.repo_slug()));
    println!("  {}", muted(&ctx.trunk));
    for pr in &stack {
        let marker = if pr.number == pr_number { "●" } else { "○" };
        println!(
            "  {marker} #{} {} {}",
            pr.number,
            pr.title,
            muted(&format!("({} → {})", pr.head_ref, pr.base_ref))
        );
    }
    Ok(())
}
