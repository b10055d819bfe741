//! LiveEntity trait implementation for the Order domain type.
//!
//! This module contains the [`LiveEntity`] implementation that enables
//! [`Order`] to be followed by the generic [`crate::framework::LiveActor`].

use crate::framework::{LiveEntity, Origin};
use crate::model::{Order, OrderId, OrderStatus};
use crate::tracker::alert::{ring, Alert};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Dependencies injected into the Order tracker.
#[derive(Debug, Clone)]
pub struct TrackerContext {
    pub alert: Arc<dyn Alert>,
}

impl TrackerContext {
    pub fn new(alert: Arc<dyn Alert>) -> Self {
        Self { alert }
    }
}

#[async_trait]
impl LiveEntity for Order {
    type Id = OrderId;
    type Context = TrackerContext;

    fn id(&self) -> &OrderId {
        &self.id
    }

    /// Logs the replacement and rings the alert on a pushed transition into `Ready`.
    async fn on_replace(&self, previous: Option<&Self>, origin: Origin, ctx: &TrackerContext) {
        let previous_status = previous.map(|p| p.status);

        if let Some(from) = previous_status {
            if from != self.status && !from.can_transition_to(self.status) {
                debug!(order_id = %self.id, %from, to = %self.status, "Out-of-graph status change");
            }
        }
        if self.total_price != self.items_subtotal() {
            debug!(
                order_id = %self.id,
                total = self.total_price,
                subtotal = self.items_subtotal(),
                "Total differs from item subtotal"
            );
        }

        let entered_ready =
            self.status == OrderStatus::Ready && previous_status != Some(OrderStatus::Ready);
        if origin == Origin::Push && entered_ready {
            info!(order_id = %self.id, "Order ready");
            ring(ctx.alert.as_ref());
        }
    }
}
