use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{ProviderError, Stage};

/// Far enough out to never fire, close enough to stay representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Time budget shared by every external call of one connection attempt.
///
/// Passed explicitly into each stage so a slow identity lookup leaves less
/// time for minting and connecting rather than resetting the clock.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A budget too large to represent is capped rather than overflowing.
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(budget.min(FAR_FUTURE))
            .or_else(|| now.checked_add(Duration::from_secs(86_400)))
            .unwrap_or(now);
        Self { at, budget }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Run `fut` until the deadline. On expiry the error is the kind that
    /// belongs to `stage`, so callers still see which stage failed.
    pub async fn run<T, F>(&self, stage: Stage, operation: &str, fut: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::at_stage(
                stage,
                format!(
                    "{operation} did not complete within the {}s connect timeout",
                    self.budget.as_secs()
                ),
            )),
        }
    }
}
