//! Narrowing a stack to the range a command acts on

use crate::error::{Error, Result};
use crate::types::PullRequest;
use std::str::FromStr;

/// Which part of the stack, relative to the target PR, a command covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Target and everything closer to trunk
    Down,
    /// Target and everything further from trunk
    Up,
    /// The whole stack
    All,
    /// Only the target
    Only,
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "down" => Ok(Self::Down),
            "up" => Ok(Self::Up),
            "all" => Ok(Self::All),
            "only" => Ok(Self::Only),
            other => Err(Error::UnrecognizedScope(other.to_string())),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Up => write!(f, "up"),
            Self::All => write!(f, "all"),
            Self::Only => write!(f, "only"),
        }
    }
}

/// Select the PRs `scope` covers around `pr_number`
pub fn select(pr_number: u64, stack: &[PullRequest], scope: Scope) -> Result<Vec<PullRequest>> {
    let idx = stack
        .iter()
        .position(|pr| pr.number == pr_number)
        .ok_or(Error::PrNotFound(pr_number))?;

    let range = match scope {
        Scope::Down => &stack[..=idx],
        Scope::Up => &stack[idx..],
        Scope::All => stack,
        Scope::Only => &stack[idx..=idx],
    };
    Ok(range.to_vec())
}
