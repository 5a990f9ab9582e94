//! pr-stacker CLI

mod cli;

use anstream::eprintln;
use clap::{Parser, Subcommand};
use cli::style::cross;
use pr_stacker::command::CommandRequest;
use pr_stacker::stack::Scope;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Squash and fold stacked GitHub pull requests
#[derive(Parser)]
#[command(name = "pr-stacker", version, about)]
struct Cli {
    /// Repository as owner/name or a GitHub URL
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    repo: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stack a PR belongs to
    Stack {
        /// PR number
        pr: u64,
    },
    /// Squash PRs into single commits carrying their title and description
    Squash {
        /// PR number
        pr: u64,
        /// Which PRs around the target to squash: down, up, all, only
        #[arg(long, default_value = "only")]
        scope: Scope,
    },
    /// Fold the stack from a PR down into trunk
    Fold {
        /// PR number
        pr: u64,
        /// Which PRs around the target to fold: down, up, all, only
        #[arg(long, default_value = "down")]
        scope: Scope,
    },
    /// Handle a PR comment as the bot would, posting results
    Comment {
        /// PR number the comment belongs to
        pr: u64,
        /// Login of the commenter
        #[arg(long)]
        sender: String,
        /// Comment ID to react to
        #[arg(long)]
        comment_id: Option<u64>,
        /// Comment text, e.g. "/stackbot fold all"
        body: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pr_stacker=debug"
    } else {
        "pr_stacker=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let repo = cli.repo.as_deref();
    let result = match cli.command {
        Commands::Stack { pr } => cli::run_stack(repo, pr).await,
        Commands::Squash { pr, scope } => cli::run_squash(repo, pr, scope).await,
        Commands::Fold { pr, scope } => cli::run_fold(repo, pr, scope).await,
        Commands::Comment {
            pr,
            sender,
            comment_id,
            body,
        } => {
            cli::run_comment(
                repo,
                CommandRequest {
                    pr_number: pr,
                    comment_id,
                    sender,
                    body,
                },
            )
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", cross());
            if e.kind().is_expected() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}
