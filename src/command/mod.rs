//! Command orchestration
//!
//! Turns a `/stackbot` comment on a PR into stack resolution, readiness
//! gating and history rewriting, then reports per-PR outcomes back as
//! comments.

mod handlers;
mod notify;
mod parse;

pub use handlers::{CommandRequest, handle_comment, handle_fold, handle_squash, help_outcome};
pub use notify::{publish_outcomes, report_failure};
pub use parse::{BOT_COMMAND, Command, ParsedCommand, is_bot_command, parse_command};
