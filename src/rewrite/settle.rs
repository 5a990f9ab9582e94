//! Bounded read-back after remote mutations
//!
//! The host applies ref and PR updates with some delay. Instead of sleeping
//! a fixed amount, re-read until the expected value shows up or the
//! timeout elapses.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Polling bounds for consistency checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settle {
    interval: Duration,
    timeout: Duration,
}

impl Default for Settle {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(15))
    }
}

impl Settle {
    /// Poll every `interval`, giving up after `timeout`
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Single read, no waiting (for hosts that are read-your-writes)
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Wait until `branch` points at `expected_sha`
    pub async fn wait_for_branch(
        &self,
        platform: &dyn PlatformService,
        branch: &str,
        expected_sha: &str,
    ) -> Result<()> {
        self.poll(branch, expected_sha, || platform.get_branch_sha(branch))
            .await
    }

    /// Wait until PR `pr_number` reports `expected_base` as its base
    pub async fn wait_for_base(
        &self,
        platform: &dyn PlatformService,
        pr_number: u64,
        expected_base: &str,
    ) -> Result<()> {
        let what = format!("PR #{pr_number} base");
        self.poll(&what, expected_base, || async move {
            Ok(platform.get_pr_details(pr_number).await?.base_ref)
        })
        .await
    }

    async fn poll<F, Fut>(&self, what: &str, expected: &str, mut read: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let started = Instant::now();
        loop {
            let observed = read().await?;
            if observed == expected {
                return Ok(());
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(Error::ConsistencyTimeout {
                    ref_name: what.to_string(),
                    expected: expected.to_string(),
                    waited,
                });
            }

            debug!(what, expected, observed = %observed, "waiting for remote to settle");
            tokio::time::sleep(self.interval).await;
        }
    }
}
