//! Fire-and-forget delivery of wagers to the decision sink.

use crate::domain::model::Wager;
use crate::domain::ports::DecisionSink;
use crate::utils::error::{Result, SwipeError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Upper bound for a single backoff sleep.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total tries per wager, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, for hosts that want the unhardened at-most-once behaviour.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-indexed): `base * multiplier^(attempt - 1)`,
    /// capped at [`MAX_RETRY_DELAY`]. A multiplier below 1 or not finite counts as 1.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY)
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    recorded: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub submitted: u64,
    pub recorded: u64,
    pub failed: u64,
}

impl DispatchStats {
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.recorded)
            .saturating_sub(self.failed)
    }
}

/// Single-worker FIFO queue in front of a [`DecisionSink`].
///
/// `submit` never waits on the sink. Wagers are written in submission order;
/// a failed write is retried per the [`RetryPolicy`] and then logged and dropped.
pub struct DecisionDispatcher {
    tx: mpsc::UnboundedSender<Wager>,
    counters: Arc<Counters>,
    worker: JoinHandle<()>,
}

impl DecisionDispatcher {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(sink: Arc<dyn DecisionSink>, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let worker = tokio::spawn(run_worker(sink, policy, rx, Arc::clone(&counters)));
        Self {
            tx,
            counters,
            worker,
        }
    }

    /// Queues a wager. Fails only if the worker is gone; the wager then counts as failed.
    pub fn submit(&self, wager: Wager) -> Result<()> {
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);
        self.tx.send(wager).map_err(|mpsc::error::SendError(wager)| {
            self.counters.failed.fetch_add(1, Ordering::SeqCst);
            SwipeError::DispatchError {
                message: format!(
                    "decision queue closed, dropped {} on market {}",
                    wager.direction, wager.market_id
                ),
            }
        })
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            submitted: self.counters.submitted.load(Ordering::SeqCst),
            recorded: self.counters.recorded.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }

    /// Closes the queue and waits until every queued wager has been handled.
    pub async fn shutdown(self) -> DispatchStats {
        let Self {
            tx,
            counters,
            worker,
        } = self;
        drop(tx);
        if let Err(e) = worker.await {
            tracing::error!("Decision worker terminated abnormally: {}", e);
        }
        DispatchStats {
            submitted: counters.submitted.load(Ordering::SeqCst),
            recorded: counters.recorded.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
        }
    }
}

async fn run_worker(
    sink: Arc<dyn DecisionSink>,
    policy: RetryPolicy,
    mut rx: mpsc::UnboundedReceiver<Wager>,
    counters: Arc<Counters>,
) {
    while let Some(wager) = rx.recv().await {
        if deliver(sink.as_ref(), &policy, &wager).await {
            counters.recorded.fetch_add(1, Ordering::SeqCst);
        } else {
            counters.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
    tracing::debug!("Decision queue drained");
}

async fn deliver(sink: &dyn DecisionSink, policy: &RetryPolicy, wager: &Wager) -> bool {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match sink.record_decision(wager).await {
            Ok(()) => {
                tracing::info!(
                    "Recorded {} on market {} for user {}",
                    wager.direction,
                    wager.market_id,
                    wager.user_id
                );
                return true;
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.next_delay(attempt);
                tracing::warn!(
                    "Recording {} on market {} failed (attempt {}/{}): {}; retrying in {:?}",
                    wager.direction,
                    wager.market_id,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    "Dropping {} on market {} after {} attempt(s): {}",
                    wager.direction,
                    wager.market_id,
                    attempt,
                    e
                );
                return false;
            }
        }
    }
}
