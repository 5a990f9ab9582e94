//! CLI command implementations

mod context;
mod rewrite;
mod show;
pub mod style;

pub use rewrite::{run_comment, run_fold, run_squash};
pub use show::run_stack;
