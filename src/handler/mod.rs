//! Order dispatch
//!
//! Pulls one order at a time off the inbound queue, routes it to the venue
//! client matching its venue list, and watches DEX submissions for on-chain
//! inclusion. A submission that times out is treated as stuck, not failed:
//! the signed payload is never rebroadcast, a fresh order with the attempt
//! count bumped is re-enqueued instead.

mod watcher;

pub use watcher::{watch_submission, WatchOutcome, WatcherConfig};

use crate::chain::TxWatcher;
use crate::config::HandlerConfig;
use crate::order::Order;
use crate::telemetry;
use crate::venue::{DexPlacement, Placement, VenueClient};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-order dispatch state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Unplaced,
    Submitted,
    Confirmed,
    ResubmitPending,
}

/// Routes orders to venue clients
pub struct OrderHandler {
    routes: HashMap<String, Arc<dyn VenueClient>>,
    chain_watcher: Option<Arc<dyn TxWatcher>>,
    watcher_config: WatcherConfig,
    max_attempts: u32,
}

impl OrderHandler {
    pub fn new(config: &HandlerConfig) -> Self {
        Self {
            routes: HashMap::new(),
            chain_watcher: None,
            watcher_config: WatcherConfig::from_config(config),
            max_attempts: config.max_attempts,
        }
    }

    /// Route orders naming `venue` to the given client.
    pub fn register(&mut self, venue: impl Into<String>, client: Arc<dyn VenueClient>) {
        self.routes.insert(venue.into().to_lowercase(), client);
    }

    /// Enable confirmation watching for DEX submissions.
    pub fn set_chain_watcher(&mut self, watcher: Arc<dyn TxWatcher>) {
        self.chain_watcher = Some(watcher);
    }

    /// First venue in the order's list with a registered client.
    fn route(&self, order: &Order) -> Option<(&str, &Arc<dyn VenueClient>)> {
        order
            .venues
            .iter()
            .find_map(|venue| self.routes.get_key_value(venue.as_str()))
            .map(|(name, client)| (name.as_str(), client))
    }

    /// Consume orders until the queue closes. `order_tx` feeds resubmissions
    /// back into the same queue.
    pub async fn run(
        self: Arc<Self>,
        mut order_rx: mpsc::Receiver<Order>,
        order_tx: mpsc::Sender<Order>,
    ) -> anyhow::Result<()> {
        while let Some(order) = order_rx.recv().await {
            self.dispatch(order, &order_tx).await;
        }
        tracing::info!("Order queue closed, dispatcher stopping");
        Ok(())
    }

    async fn dispatch(&self, order: Order, order_tx: &mpsc::Sender<Order>) {
        let Some((venue, client)) = self.route(&order) else {
            // Lazy venue parsing: unknown venue lists are dropped, not fatal
            tracing::warn!(
                order_id = %order.id,
                venues = ?order.venues,
                "No registered venue client for order, dropping"
            );
            return;
        };

        tracing::info!(
            order_id = %order.id,
            venue,
            attempt = order.attempt_count,
            state = ?OrderState::Unplaced,
            "Dispatching order"
        );

        match client.place_order(&order).await {
            Ok(Placement::Cex { leg_ids }) => {
                telemetry::record_order_submitted();
                tracing::info!(
                    order_id = %order.id,
                    venue,
                    ?leg_ids,
                    state = ?OrderState::Confirmed,
                    "CEX order placed"
                );
            }
            Ok(Placement::Dex(placement)) => {
                telemetry::record_order_submitted();
                tracing::info!(
                    order_id = %order.id,
                    venue,
                    tx_hash = %placement.tx_hash,
                    state = ?OrderState::Submitted,
                    "Swap submitted, awaiting confirmation"
                );
                if let Some(watcher) = &self.chain_watcher {
                    tokio::spawn(watch_and_resubmit(
                        Arc::clone(watcher),
                        self.watcher_config.clone(),
                        order,
                        placement,
                        order_tx.clone(),
                        self.max_attempts,
                    ));
                }
            }
            Err(e) => {
                telemetry::record_order_failed();
                tracing::error!(
                    order_id = %order.id,
                    venue,
                    error = %e,
                    "Order placement failed"
                );
            }
        }
    }
}

/// Watch one submission; on timeout re-enqueue a fresh order.
pub(crate) async fn watch_and_resubmit(
    watcher: Arc<dyn TxWatcher>,
    config: WatcherConfig,
    order: Order,
    placement: DexPlacement,
    order_tx: mpsc::Sender<Order>,
    max_attempts: u32,
) {
    match watch_submission(watcher.as_ref(), &config, placement.tx_hash).await {
        WatchOutcome::Confirmed { success: true } => {
            telemetry::record_order_confirmed();
            tracing::info!(
                order_id = %order.id,
                tx_hash = %placement.tx_hash,
                state = ?OrderState::Confirmed,
                "Swap confirmed on-chain"
            );
        }
        WatchOutcome::Confirmed { success: false } => {
            telemetry::record_order_failed();
            tracing::error!(
                order_id = %order.id,
                tx_hash = %placement.tx_hash,
                "Swap reverted on-chain, not retrying"
            );
        }
        WatchOutcome::TimedOut => {
            if order.attempt_count + 1 >= max_attempts {
                tracing::error!(
                    order_id = %order.id,
                    tx_hash = %placement.tx_hash,
                    attempts = order.attempt_count + 1,
                    "Confirmation timed out and attempts are exhausted, giving up"
                );
                return;
            }
            let next = order.resubmit();
            telemetry::record_order_resubmitted();
            // The stuck transaction is left untouched and may still confirm
            // later, alongside the replacement. Operators must reconcile.
            tracing::warn!(
                order_id = %order.id,
                tx_hash = %placement.tx_hash,
                next_attempt = next.attempt_count,
                state = ?OrderState::ResubmitPending,
                "Confirmation timed out, re-enqueueing a fresh order; original transaction may still land"
            );
            if order_tx.send(next).await.is_err() {
                tracing::warn!(order_id = %order.id, "Order queue closed, resubmission dropped");
            }
        }
    }
}
