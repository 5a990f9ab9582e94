//! History rewriting for stacked PRs
//!
//! All operations work on the remote through [`PlatformService`] ref and
//! commit primitives:
//! 1. Squash - collapse one PR into a single commit on its base's tip
//! 2. Fold - replay squashed PRs onto trunk via a scratch branch
//!
//! Every ref mutation is followed by a [`Settle`] read-back so the next
//! step never observes stale state.
//!
//! [`PlatformService`]: crate::platform::PlatformService

mod fold;
mod settle;
mod squash;

pub use fold::{FoldPhase, FoldResult, fold_stack, reattach_to_trunk, scratch_branch_name};
pub use settle::Settle;
pub use squash::{SquashResult, squash_message, squash_pr};
