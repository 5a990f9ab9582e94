//! Stack topology
//!
//! Resolves the chain of open PRs a target PR belongs to, then narrows it
//! to the range a command should act on.

mod graph;
mod select;

pub use graph::{StackGraph, StackNode, resolve_stack};
pub use select::{Scope, select};
