//! Core types for pr-stacker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open pull request as seen in the repository's PR listing
///
/// Snapshot taken at the start of a command; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR title
    pub title: String,
    /// PR description
    pub body: Option<String>,
}

/// Freshly fetched PR state used by readiness checks and squashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestDetails {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR body/description
    pub body: Option<String>,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// Commit the head branch pointed at when fetched
    pub head_sha: String,
    /// Number of commits on the PR
    pub commit_count: u64,
    /// Host-computed mergeable state (`clean`, `blocked`, `dirty`, ...)
    ///
    /// `None` while the host is still computing it.
    pub mergeable_state: Option<String>,
    /// Login of the PR author
    pub author_login: String,
}

impl PullRequestDetails {
    /// Whether the host reports the PR as cleanly mergeable
    pub fn is_clean(&self) -> bool {
        self.mergeable_state.as_deref() == Some("clean")
    }
}

/// Git identity attached to a commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    /// Name
    pub name: String,
    /// Email address
    pub email: String,
    /// Authored/committed timestamp
    pub date: DateTime<Utc>,
}

impl Signature {
    /// Identity for a user whose commits carry no author metadata
    pub fn noreply(login: &str, date: DateTime<Utc>) -> Self {
        Self {
            name: login.to_string(),
            email: format!("{login}@users.noreply.github.com"),
            date,
        }
    }
}

/// A commit object read from the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitCommit {
    /// Commit SHA
    pub sha: String,
    /// Tree SHA (content snapshot)
    pub tree_sha: String,
    /// Full commit message
    pub message: String,
    /// Author identity
    pub author: Option<Signature>,
    /// Committer identity
    pub committer: Option<Signature>,
    /// Parent commit SHAs
    pub parents: Vec<String>,
}

impl GitCommit {
    /// Describe a copy of this commit placed on top of `parent`
    ///
    /// Tree, message and identities are kept; only ancestry changes.
    pub fn reparent(&self, parent: &str) -> NewCommit {
        NewCommit {
            message: self.message.clone(),
            tree_sha: self.tree_sha.clone(),
            parents: vec![parent.to_string()],
            author: self.author.clone(),
            committer: self.committer.clone(),
        }
    }
}

/// Request to create a commit object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCommit {
    /// Commit message
    pub message: String,
    /// Tree SHA
    pub tree_sha: String,
    /// Parent SHAs
    pub parents: Vec<String>,
    /// Author (host default when `None`)
    pub author: Option<Signature>,
    /// Committer (host default when `None`)
    pub committer: Option<Signature>,
}

/// One entry in a PR's commit list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrCommit {
    /// Commit SHA
    pub sha: String,
    /// Author metadata, absent when the host could not attribute it
    pub author: Option<Signature>,
}

/// Required status checks configured on a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredChecks {
    /// Branch has no protection rules
    NotProtected,
    /// Names of checks that must succeed
    Contexts(Vec<String>),
}

/// A check run evaluated against a commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRun {
    /// Check name
    pub name: String,
    /// `queued`, `in_progress` or `completed`
    pub status: String,
    /// Conclusion once completed (`success`, `failure`, ...)
    pub conclusion: Option<String>,
}

impl CheckRun {
    /// Whether this run completed successfully
    pub fn succeeded(&self) -> bool {
        self.conclusion.as_deref() == Some("success")
    }
}

/// A comment on a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrComment {
    /// Comment ID
    pub id: u64,
    /// Comment body text
    pub body: String,
    /// Login of the comment author
    pub author: String,
}

/// Reaction placed on the comment that triggered a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Command accepted
    Rocket,
    /// Command failed
    Confused,
}

impl std::fmt::Display for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rocket => write!(f, "rocket"),
            Self::Confused => write!(f, "confused"),
        }
    }
}

/// Result of a command for one PR, handed to the notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Message to post
    pub message: String,
    /// PR to post on (the originating PR when `None`)
    pub target_issue_number: Option<u64>,
}

impl CommandOutcome {
    /// Outcome addressed to a specific PR
    pub fn for_pr(pr_number: u64, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target_issue_number: Some(pr_number),
        }
    }
}

/// Repository coordinates on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}
