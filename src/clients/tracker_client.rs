use crate::clients::live_client::TrackedClient;
use crate::framework::{FrameworkError, LiveClient, LiveState};
use crate::model::{Order, OrderId};
use crate::tracker::TrackerError;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, instrument};

/// Client for interacting with an Order tracker actor.
#[derive(Clone)]
pub struct TrackerClient {
    order_id: OrderId,
    inner: LiveClient<Order>,
}

impl TrackerClient {
    pub fn new(order_id: OrderId, inner: LiveClient<Order>) -> Self {
        Self { order_id, inner }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// The order as currently held, if it has been loaded.
    #[instrument(skip(self), fields(order_id = %self.order_id))]
    pub async fn current_order(&self) -> Result<Option<Order>, TrackerError> {
        debug!("Sending request");
        match self.snapshot().await? {
            LiveState::Ready { value, .. } => Ok(Some(value)),
            LiveState::Loading { .. } => Ok(None),
            LiveState::NotFound { reason } => Err(TrackerError::NotFound(reason)),
        }
    }

    /// A receiver that observes every state change of this tracker.
    pub fn changes(&self) -> watch::Receiver<LiveState<Order>> {
        self.inner.changes()
    }
}

#[async_trait]
impl TrackedClient<Order> for TrackerClient {
    type Error = TrackerError;

    fn inner(&self) -> &LiveClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        TrackerError::ActorCommunicationError(e.to_string())
    }
}
