//! Polling until a condition on observed state holds

use crate::error::{OpsError, Result};
use crate::network::Network;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Something whose observed state can be re-read in place
#[async_trait]
pub trait Refreshable: Send {
    async fn refresh_state(&mut self);
}

#[async_trait]
impl Refreshable for Network {
    async fn refresh_state(&mut self) {
        self.refresh().await;
    }
}

/// Timeout and poll interval for one wait step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Optionally refresh `target`, then check `predicate`, until it holds or
/// `policy.timeout` elapses.
///
/// Exceeding the timeout is a hard failure.
pub async fn wait_for_condition<T, P>(
    what: &str,
    target: &mut T,
    refresh: bool,
    mut predicate: P,
    policy: WaitPolicy,
) -> Result<()>
where
    T: Refreshable + ?Sized,
    P: FnMut(&T) -> bool,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        if refresh {
            target.refresh_state().await;
        }

        if predicate(target) {
            info!(
                condition = %what,
                attempts,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Condition reached"
            );
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            return Err(OpsError::Timeout(format!(
                "{} not reached after {}s ({} attempts)",
                what,
                elapsed.as_secs(),
                attempts
            )));
        }

        debug!(condition = %what, attempts, "Condition not reached yet, retrying");
        tokio::time::sleep(policy.interval.min(policy.timeout - elapsed)).await;
    }
}
