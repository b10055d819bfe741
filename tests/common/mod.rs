#![allow(dead_code)]

use nore_tracker::framework::mock::{MockChannel, MockSource};
use nore_tracker::framework::LiveState;
use nore_tracker::lifecycle::TrackerServices;
use nore_tracker::model::{LineItem, Order, OrderId, OrderStatus};
use nore_tracker::tracker::CountingAlert;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const WAIT: Duration = Duration::from_secs(5);

pub const ORDER_ID: &str = "abc123def456";

pub fn order_id() -> OrderId {
    OrderId::from(ORDER_ID)
}

/// Two burgers at 3 000, total 6 000.
pub fn burger_order(status: OrderStatus) -> Order {
    Order::new(
        ORDER_ID,
        status,
        vec![LineItem::new("Burger", 2, 3000.0)],
        6000.0,
    )
}

/// Mocked collaborators for one tracker session.
pub struct Harness {
    pub source: MockSource<Order>,
    pub channel: MockChannel<Order>,
    pub alert: Arc<CountingAlert>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_alert(CountingAlert::new())
    }

    pub fn with_alert(alert: CountingAlert) -> Self {
        Self {
            source: MockSource::new(),
            channel: MockChannel::new(),
            alert: Arc::new(alert),
        }
    }

    pub fn services(&self) -> TrackerServices {
        TrackerServices {
            source: Arc::new(self.source.clone()),
            channel: Arc::new(self.channel.clone()),
            alert: self.alert.clone(),
        }
    }
}

/// Waits until the tracker publishes a state matching `predicate`.
pub async fn wait_for_state(
    changes: &mut watch::Receiver<LiveState<Order>>,
    mut predicate: impl FnMut(&LiveState<Order>) -> bool,
) -> LiveState<Order> {
    let state = tokio::time::timeout(WAIT, changes.wait_for(|state| predicate(state)))
        .await
        .expect("timed out waiting for tracker state")
        .expect("tracker stopped");
    (*state).clone()
}

pub fn has_status(state: &LiveState<Order>, status: OrderStatus) -> bool {
    state.value().is_some_and(|order| order.status == status)
}

/// Polls `condition` until it holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
