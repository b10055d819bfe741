use crate::clients::{TrackedClient, TrackerClient};
use crate::framework::{live_feed, ChangeFeed, ReleaseHandle, SnapshotSource};
use crate::model::{Order, OrderId, RestaurantProfile};
use crate::tracker::{self, Alert, TrackerContext, TrackerError};
use crate::view::DisplayState;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The external collaborators a tracker session is wired to.
#[derive(Clone)]
pub struct TrackerServices {
    /// Order Query Service
    pub source: Arc<dyn SnapshotSource<Order>>,
    /// Change Notification Channel
    pub channel: Arc<dyn ChangeFeed<Order>>,
    /// Played when the order becomes ready
    pub alert: Arc<dyn Alert>,
}

/// One order-tracking view: a running tracker actor plus the branding it is shown with.
///
/// `TrackerSession` is responsible for:
/// - **Wiring**: opening the live feed and injecting the alert into the tracker
/// - **Lifecycle**: spawning the tracker task and tearing it down
///
/// # Teardown
///
/// [`shutdown`](Self::shutdown) releases the change subscription before it
/// returns. Dropping the session without calling it releases the subscription
/// inside `drop` and then aborts the tracker task.
///
/// # Example
///
/// ```ignore
/// let session = TrackerSession::start(order_id, services, profile);
/// let mut changes = session.client.changes();
/// changes.changed().await?;
/// println!("{}", session.render(&changes.borrow()));
/// session.shutdown().await?;
/// ```
pub struct TrackerSession {
    /// Client for interacting with the tracker actor
    pub client: TrackerClient,

    profile: RestaurantProfile,

    /// Releases the change subscription held by the tracker's feed
    release: ReleaseHandle,

    /// Tracker task handle (used for teardown)
    handle: Option<JoinHandle<()>>,
}

impl TrackerSession {
    /// Subscribes to changes of `order_id`, issues the initial lookup and
    /// starts the tracker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(order_id: OrderId, services: TrackerServices, profile: RestaurantProfile) -> Self {
        let feed = live_feed::<Order, _, _>(
            Arc::clone(&services.source),
            services.channel.as_ref(),
            order_id.clone(),
        );
        let release = feed.release_handle();
        let (actor, client) = tracker::new(order_id.clone());
        let handle = tokio::spawn(actor.run(feed.into_stream(), TrackerContext::new(services.alert)));
        info!(%order_id, "Tracker session started");

        Self {
            client,
            profile,
            release,
            handle: Some(handle),
        }
    }

    pub fn order_id(&self) -> &OrderId {
        self.client.order_id()
    }

    /// Display state for the tracker's current state.
    pub fn view(&self) -> DisplayState {
        DisplayState::from_state(&self.client.changes().borrow())
    }

    /// Plain-text rendering of `view` with this session's branding.
    pub fn render(&self, view: &DisplayState) -> String {
        view.render_text(&self.profile)
    }

    /// Tears the view down.
    ///
    /// The subscription is released before the tracker acknowledges the close,
    /// then the tracker task is awaited.
    pub async fn shutdown(mut self) -> Result<(), TrackerError> {
        info!(order_id = %self.client.order_id(), "Shutting down tracker session...");

        // The actor may already be gone if the task was aborted; nothing left to release then.
        if let Err(e) = self.client.close().await {
            info!(error = %e, "Tracker already stopped");
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("Tracker task failed: {:?}", e);
                return Err(TrackerError::TaskFailed(e.to_string()));
            }
        }

        info!("Tracker session shutdown complete.");
        Ok(())
    }
}

impl Drop for TrackerSession {
    fn drop(&mut self) {
        self.release.release();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
