//! pr-stacker - squash and fold stacked pull requests on GitHub
//!
//! A stack is a chain of pull requests where each PR is based on the
//! previous PR's head branch instead of trunk. This crate resolves that
//! chain from the repository's open PRs and rewrites history directly on
//! the remote (no local checkout) to:
//!
//! - **squash** a PR into a single commit carrying its title and body
//! - **fold** a prefix of the stack onto trunk, reattaching what remains
//!
//! The host is reached through [`platform::PlatformService`], so every
//! component can be exercised against an in-memory implementation.

pub mod auth;
pub mod command;
pub mod config;
pub mod error;
pub mod platform;
pub mod readiness;
pub mod rewrite;
pub mod stack;
pub mod types;
