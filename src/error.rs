//! Error types for pr-stacker

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// How a failure should be treated by whoever reports it
///
/// Everything except `Infrastructure` is an expected outcome of normal use:
/// it is shown to the user but is not a fault of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input or remote state does not permit the command
    Validation,
    /// The requester may not run the command
    Permission,
    /// Repository or process configuration is invalid
    Configuration,
    /// A host call or local I/O failed
    Infrastructure,
}

impl ErrorKind {
    /// Whether the failure is part of normal operation
    pub const fn is_expected(self) -> bool {
        !matches!(self, Self::Infrastructure)
    }
}

/// Errors produced by stack resolution and history rewriting
#[derive(Debug, Error)]
pub enum Error {
    /// PR is not an open member of the stack
    #[error("could not find PR #{0} in the stack")]
    PrNotFound(u64),

    /// Scope argument is not one of down/up/all/only
    #[error("could not understand the given scope: `{0}`")]
    UnrecognizedScope(String),

    /// Open PRs branch instead of forming a single chain
    #[error("unsupported stack topology: {0}")]
    UnsupportedTopology(String),

    /// PR has no commits to squash
    #[error("there are no commits in PR #{0}")]
    EmptyPr(u64),

    /// Remote state does not permit the command
    #[error("{0}")]
    Validation(String),

    /// Requester is not allowed to run the command
    #[error("{0}")]
    Permission(String),

    /// Invalid repository configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Could not obtain credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// GitHub API call failed
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Generic platform failure
    #[error("platform error: {0}")]
    Platform(String),

    /// A mutated ref never read back the expected value
    #[error("`{ref_name}` did not reach {expected} within {waited:?}")]
    ConsistencyTimeout {
        /// Branch or PR that was polled
        ref_name: String,
        /// Value that was expected to be observed
        expected: String,
        /// How long polling lasted
        waited: Duration,
    },

    /// Squashing a specific PR failed
    #[error("could not squash PR #{pr_number}: {source}")]
    Squash {
        /// PR being squashed
        pr_number: u64,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Folding the stack failed
    #[error("Failed to fold stack: {source}")]
    Fold {
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse failure
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Classify the error, looking through wrapping variants
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PrNotFound(_)
            | Self::UnrecognizedScope(_)
            | Self::UnsupportedTopology(_)
            | Self::EmptyPr(_)
            | Self::Validation(_) => ErrorKind::Validation,
            Self::Permission(_) => ErrorKind::Permission,
            Self::Config(_) | Self::Toml(_) => ErrorKind::Configuration,
            Self::Squash { source, .. } | Self::Fold { source } => source.kind(),
            Self::Auth(_)
            | Self::GitHubApi(_)
            | Self::Platform(_)
            | Self::ConsistencyTimeout { .. }
            | Self::Io(_) => ErrorKind::Infrastructure,
        }
    }

    /// The innermost error beneath any `Squash`/`Fold` wrapping
    pub fn root(&self) -> &Self {
        match self {
            Self::Squash { source, .. } | Self::Fold { source } => source.root(),
            other => other,
        }
    }
}

impl From<octocrab::Error> for Error {
    fn from(e: octocrab::Error) -> Self {
        Self::GitHubApi(e.to_string())
    }
}
