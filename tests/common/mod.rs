//! Shared test helpers

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::{MockPlatformService, github_config};

use pr_stacker::config::StackerConfig;
use pr_stacker::types::{CheckRun, PullRequest};

/// A PR listing entry with no backing branches
pub fn make_pr(number: u64, base: &str, head: &str) -> PullRequest {
    PullRequest {
        number,
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        title: format!("PR {number}"),
        body: None,
    }
}

/// Listing for a linear stack on `main`: PR n+1 is based on PR n
pub fn make_linear_prs(heads: &[&str]) -> Vec<PullRequest> {
    let mut base = "main";
    heads
        .iter()
        .enumerate()
        .map(|(i, head)| {
            let pr = make_pr(i as u64 + 1, base, head);
            base = head;
            pr
        })
        .collect()
}

/// PR numbers, in order
pub fn numbers(prs: &[PullRequest]) -> Vec<u64> {
    prs.iter().map(|pr| pr.number).collect()
}

/// Completed check run with the given conclusion
pub fn check_run(name: &str, conclusion: &str) -> CheckRun {
    CheckRun {
        name: name.to_string(),
        status: "completed".to_string(),
        conclusion: Some(conclusion.to_string()),
    }
}

/// Default configuration with readiness checks as given
pub fn config(skip_ready_check: bool) -> StackerConfig {
    StackerConfig {
        skip_ready_check,
        ..StackerConfig::default()
    }
}
