//! Confirmation watching for submitted swaps

use crate::chain::{B256, TxWatcher};
use crate::config::HandlerConfig;
use std::time::Duration;

/// Bounds on receipt polling
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Total time to wait for inclusion
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WatcherConfig {
    pub fn from_config(config: &HandlerConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// The fate of a watched submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Mined; `success` is the receipt status
    Confirmed { success: bool },
    /// Not included within the timeout. The transaction is stuck, not
    /// necessarily failed; it may still confirm later.
    TimedOut,
}

/// Poll for a receipt until the transaction is mined or the timeout lapses.
/// Poll errors are logged and do not end the watch early.
pub async fn watch_submission(
    watcher: &dyn TxWatcher,
    config: &WatcherConfig,
    tx_hash: B256,
) -> WatchOutcome {
    let poll_loop = async {
        let mut interval = tokio::time::interval(config.poll_interval);
        loop {
            interval.tick().await;
            match watcher.receipt_status(tx_hash).await {
                Ok(Some(success)) => return WatchOutcome::Confirmed { success },
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                }
            }
        }
    };

    match tokio::time::timeout(config.timeout, poll_loop).await {
        Ok(outcome) => outcome,
        Err(_) => WatchOutcome::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedWatcher {
        /// Number of `None` polls before the receipt appears
        pending_polls: u32,
        success: bool,
        polls: AtomicU32,
    }

    #[async_trait]
    impl TxWatcher for ScriptedWatcher {
        async fn receipt_status(&self, _tx_hash: B256) -> Result<Option<bool>, ChainError> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            if poll < self.pending_polls {
                Ok(None)
            } else {
                Ok(Some(self.success))
            }
        }
    }

    fn fast_config() -> WatcherConfig {
        WatcherConfig {
            timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_confirms_after_pending_polls() {
        let watcher = ScriptedWatcher {
            pending_polls: 3,
            success: true,
            polls: AtomicU32::new(0),
        };
        let outcome = watch_submission(&watcher, &fast_config(), B256::ZERO).await;
        assert_eq!(outcome, WatchOutcome::Confirmed { success: true });
        assert_eq!(watcher.polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_revert_reported() {
        let watcher = ScriptedWatcher {
            pending_polls: 0,
            success: false,
            polls: AtomicU32::new(0),
        };
        let outcome = watch_submission(&watcher, &fast_config(), B256::ZERO).await;
        assert_eq!(outcome, WatchOutcome::Confirmed { success: false });
    }

    #[tokio::test]
    async fn test_never_mined_times_out() {
        let watcher = ScriptedWatcher {
            pending_polls: u32::MAX,
            success: true,
            polls: AtomicU32::new(0),
        };
        let outcome = watch_submission(&watcher, &fast_config(), B256::ZERO).await;
        assert_eq!(outcome, WatchOutcome::TimedOut);
    }

    struct FailingWatcher {
        polls: AtomicU32,
    }

    #[async_trait]
    impl TxWatcher for FailingWatcher {
        async fn receipt_status(&self, _tx_hash: B256) -> Result<Option<bool>, ChainError> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            if poll == 0 {
                Err(ChainError::Transport("node hiccup".to_string()))
            } else {
                Ok(Some(true))
            }
        }
    }

    #[tokio::test]
    async fn test_poll_errors_do_not_end_watch() {
        let watcher = FailingWatcher {
            polls: AtomicU32::new(0),
        };
        let outcome = watch_submission(&watcher, &fast_config(), B256::ZERO).await;
        assert_eq!(outcome, WatchOutcome::Confirmed { success: true });
    }
}
