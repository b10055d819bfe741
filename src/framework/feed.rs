//! # Live Feeds
//!
//! A live feed merges the two ways a record reaches the tracker, the initial
//! lookup and the pushed change events, into one lazy stream of
//! [`LiveEvent`]s. The initial lookup is simply the stream's first value.
//!
//! ## Ordering
//!
//! The subscription is opened *before* the lookup is issued, so no change can
//! slip between the two. If a pushed event is emitted before the lookup
//! resolves, the lookup result is stale and is discarded.

use crate::framework::core::{LiveEntity, LiveEvent, Origin};
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Errors raised by snapshot sources and change channels.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed payload: {0}")]
    Malformed(String),
    #[error("Subscription failed: {0}")]
    Subscribe(String),
}

/// Request/response lookup of a record by identifier.
#[async_trait]
pub trait SnapshotSource<T: LiveEntity>: Send + Sync {
    async fn fetch(&self, id: &T::Id) -> Result<T, SourceError>;
}

/// Push delivery of change events for a single record.
pub trait ChangeFeed<T: LiveEntity>: Send + Sync {
    /// Opens a subscription. It stays open until the returned value is dropped.
    fn subscribe(&self, id: &T::Id) -> Result<Subscription<T>, SourceError>;
}

/// An event delivered on a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T> {
    /// The full updated row.
    Updated(T),
    /// The channel stopped delivering; nothing more will arrive.
    Lost(String),
}

struct Release {
    task: Option<JoinHandle<()>>,
    callback: Option<Box<dyn FnOnce() + Send>>,
}

/// Releases a subscription from outside the stream that owns it.
///
/// Clones share one release: the first call aborts the delivery task and runs
/// the release callback, later calls (and the subscription's own `Drop`) do
/// nothing. A default handle has nothing to release.
#[derive(Clone, Default)]
pub struct ReleaseHandle {
    release: Arc<Mutex<Option<Release>>>,
}

impl ReleaseHandle {
    fn armed() -> Self {
        Self {
            release: Arc::new(Mutex::new(Some(Release {
                task: None,
                callback: None,
            }))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Release>> {
        self.release.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut Release)) {
        if let Some(release) = self.lock().as_mut() {
            apply(release);
        }
    }

    /// Returns `false` if the subscription was already released.
    pub fn release(&self) -> bool {
        let taken = self.lock().take();
        match taken {
            Some(release) => {
                if let Some(task) = release.task {
                    task.abort();
                }
                if let Some(callback) = release.callback {
                    callback();
                }
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.lock().is_none()
    }
}

/// An open subscription to a change channel.
///
/// Dropping it releases the channel: the delivery task (if any) is aborted
/// and the release callback (if any) runs, both before `drop` returns.
/// [`release_handle`](Self::release_handle) allows the same from elsewhere.
pub struct Subscription<T> {
    key: String,
    receiver: mpsc::UnboundedReceiver<ChangeEvent<T>>,
    release: ReleaseHandle,
}

impl<T> Subscription<T> {
    pub fn new(key: impl Into<String>, receiver: mpsc::UnboundedReceiver<ChangeEvent<T>>) -> Self {
        Self {
            key: key.into(),
            receiver,
            release: ReleaseHandle::armed(),
        }
    }

    /// Ties a delivery task to the subscription's lifetime.
    pub fn with_task(self, task: JoinHandle<()>) -> Self {
        self.release.update(|release| release.task = Some(task));
        self
    }

    /// Registers a callback to run when the subscription is released.
    pub fn on_release(self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.release.update(|release| release.callback = Some(Box::new(callback)));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn release_handle(&self) -> ReleaseHandle {
        self.release.clone()
    }
}

impl<T> Unpin for Subscription<T> {}

impl<T> Stream for Subscription<T> {
    type Item = ChangeEvent<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if self.release.release() {
            debug!(key = %self.key, "Subscription released");
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("released", &self.release.is_released())
            .finish()
    }
}

enum Step<T> {
    Fetched(Result<T, SourceError>),
    Changed(Option<ChangeEvent<T>>),
}

async fn next_change<T>(subscription: &mut Option<Subscription<T>>) -> Option<ChangeEvent<T>> {
    use futures::StreamExt;
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}

/// The merged event stream for one record.
///
/// Whoever owns the stream owns the subscription; [`release_handle`](Self::release_handle)
/// lets a second owner release it without waiting for the stream to be dropped.
pub struct LiveFeed<T> {
    events: BoxStream<'static, LiveEvent<T>>,
    release: ReleaseHandle,
}

impl<T> LiveFeed<T> {
    pub fn release_handle(&self) -> ReleaseHandle {
        self.release.clone()
    }

    pub fn into_stream(self) -> BoxStream<'static, LiveEvent<T>> {
        self.events
    }
}

impl<T> Stream for LiveFeed<T> {
    type Item = LiveEvent<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().events.as_mut().poll_next(cx)
    }
}

/// Builds the live feed for the record identified by `id`.
///
/// The subscription is opened immediately; the lookup runs when the stream is
/// first polled. When a change and the lookup are ready together, the change
/// is taken first. Pushed rows for any other record are dropped. The stream
/// ends once the lookup has settled and the subscription is gone, or right
/// after a failed lookup.
pub fn live_feed<T, S, C>(source: Arc<S>, channel: &C, id: T::Id) -> LiveFeed<T>
where
    T: LiveEntity,
    S: SnapshotSource<T> + ?Sized + 'static,
    C: ChangeFeed<T> + ?Sized,
{
    let subscribed = channel.subscribe(&id);
    let release = match &subscribed {
        Ok(subscription) => subscription.release_handle(),
        Err(_) => ReleaseHandle::default(),
    };

    let events = Box::pin(async_stream::stream! {
        let mut subscription = match subscribed {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!(%id, error = %e, "Could not open change channel");
                yield LiveEvent::ChannelLost(e.to_string());
                None
            }
        };

        let fetch = source.fetch(&id);
        tokio::pin!(fetch);
        let mut fetch_pending = true;
        let mut pushed = false;

        loop {
            let step = tokio::select! {
                biased;
                change = next_change(&mut subscription) => Step::Changed(change),
                result = &mut fetch, if fetch_pending => Step::Fetched(result),
            };

            match step {
                Step::Fetched(result) => {
                    fetch_pending = false;
                    match result {
                        _ if pushed => {
                            debug!(%id, "Discarding lookup that resolved after a pushed change");
                        }
                        Ok(value) => {
                            yield LiveEvent::Snapshot { origin: Origin::Fetch, value };
                        }
                        Err(e) => {
                            yield LiveEvent::LoadFailed(e.to_string());
                            break;
                        }
                    }
                }
                Step::Changed(Some(ChangeEvent::Updated(value))) if value.id() != &id => {
                    warn!(%id, other = %value.id(), "Dropping pushed change for another record");
                }
                Step::Changed(Some(ChangeEvent::Updated(value))) => {
                    pushed = true;
                    yield LiveEvent::Snapshot { origin: Origin::Push, value };
                }
                Step::Changed(Some(ChangeEvent::Lost(reason))) => {
                    subscription = None;
                    yield LiveEvent::ChannelLost(reason);
                }
                Step::Changed(None) => {
                    subscription = None;
                    yield LiveEvent::ChannelLost("change channel closed".to_string());
                }
            }

            if !fetch_pending && subscription.is_none() {
                break;
            }
        }
    });

    LiveFeed { events, release }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{MockChannel, MockSource};
    use crate::model::{LineItem, Order, OrderId, OrderStatus};
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    fn order(status: OrderStatus) -> Order {
        Order::new("abc123", status, vec![LineItem::new("Burger", 2, 3000.0)], 6000.0)
    }

    #[tokio::test]
    async fn test_lookup_is_first_value() {
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("abc123"))
            .return_ok(order(OrderStatus::Pending));
        let channel = MockChannel::<Order>::new();

        let mut feed = live_feed::<Order, _, _>(Arc::new(source.clone()), &channel, OrderId::from("abc123"));
        assert_eq!(channel.subscriber_count(&OrderId::from("abc123")), 1);

        let first = feed.next().await.unwrap();
        assert_eq!(
            first,
            LiveEvent::Snapshot {
                origin: Origin::Fetch,
                value: order(OrderStatus::Pending)
            }
        );

        channel.emit(order(OrderStatus::Preparing));
        let second = feed.next().await.unwrap();
        assert_eq!(
            second,
            LiveEvent::Snapshot {
                origin: Origin::Push,
                value: order(OrderStatus::Preparing)
            }
        );
        source.verify();
    }

    #[tokio::test]
    async fn test_push_before_lookup_discards_lookup() {
        let gate = Arc::new(Notify::new());
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("abc123"))
            .until(gate.clone())
            .return_ok(order(OrderStatus::Pending));
        let channel = MockChannel::<Order>::new();

        let mut feed = live_feed::<Order, _, _>(Arc::new(source.clone()), &channel, OrderId::from("abc123"));
        channel.emit(order(OrderStatus::Preparing));

        let first = feed.next().await.unwrap();
        assert_eq!(
            first,
            LiveEvent::Snapshot {
                origin: Origin::Push,
                value: order(OrderStatus::Preparing)
            }
        );

        gate.notify_one();
        channel.disconnect(&OrderId::from("abc123"));

        // The stale lookup is skipped; the next thing seen is the disconnect.
        let next = feed.next().await.unwrap();
        assert!(matches!(next, LiveEvent::ChannelLost(_)));
        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_lookup_ends_feed_and_releases_channel() {
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("missing"))
            .return_err(SourceError::NotFound("404 Not Found".into()));
        let channel = MockChannel::<Order>::new();

        let mut feed = live_feed::<Order, _, _>(Arc::new(source), &channel, OrderId::from("missing"));
        let first = feed.next().await.unwrap();
        assert_eq!(first, LiveEvent::LoadFailed("Not found: 404 Not Found".into()));
        assert!(feed.next().await.is_none());
        assert_eq!(channel.subscriber_count(&OrderId::from("missing")), 0);
    }

    #[tokio::test]
    async fn test_refused_subscription_still_loads() {
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("abc123"))
            .return_ok(order(OrderStatus::Ready));
        let channel = MockChannel::<Order>::new();
        channel.refuse_subscriptions();

        let events: Vec<_> = live_feed::<Order, _, _>(Arc::new(source), &channel, OrderId::from("abc123"))
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LiveEvent::ChannelLost(_)));
        assert_eq!(
            events[1],
            LiveEvent::Snapshot {
                origin: Origin::Fetch,
                value: order(OrderStatus::Ready)
            }
        );
    }

    /// Hands out one pre-filled subscription.
    struct ScriptedChannel(std::sync::Mutex<Option<mpsc::UnboundedReceiver<ChangeEvent<Order>>>>);

    impl ScriptedChannel {
        fn new() -> (Self, mpsc::UnboundedSender<ChangeEvent<Order>>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self(std::sync::Mutex::new(Some(rx))), tx)
        }
    }

    impl ChangeFeed<Order> for ScriptedChannel {
        fn subscribe(&self, id: &OrderId) -> Result<Subscription<Order>, SourceError> {
            let rx = self
                .0
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| SourceError::Subscribe("already subscribed".into()))?;
            Ok(Subscription::new(format!("scripted:{id}"), rx))
        }
    }

    #[tokio::test]
    async fn test_push_for_other_record_is_dropped() {
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("abc123"))
            .return_ok(order(OrderStatus::Pending));
        let (channel, tx) = ScriptedChannel::new();

        let stranger = Order::new("someone-else", OrderStatus::Ready, vec![LineItem::new("Pizza", 1, 9000.0)], 9000.0);
        tx.send(ChangeEvent::Updated(stranger)).unwrap();

        let mut feed = live_feed::<Order, _, _>(Arc::new(source.clone()), &channel, OrderId::from("abc123"));

        // The stray row neither shows up nor counts as a push that outdates the lookup.
        let first = feed.next().await.unwrap();
        assert_eq!(
            first,
            LiveEvent::Snapshot {
                origin: Origin::Fetch,
                value: order(OrderStatus::Pending)
            }
        );

        tx.send(ChangeEvent::Updated(order(OrderStatus::Preparing))).unwrap();
        let second = feed.next().await.unwrap();
        assert_eq!(
            second,
            LiveEvent::Snapshot {
                origin: Origin::Push,
                value: order(OrderStatus::Preparing)
            }
        );
        source.verify();
    }

    #[tokio::test]
    async fn test_buffered_push_wins_over_ready_lookup() {
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("abc123"))
            .return_ok(order(OrderStatus::Pending));
        let (channel, tx) = ScriptedChannel::new();
        tx.send(ChangeEvent::Updated(order(OrderStatus::Ready))).unwrap();

        let mut feed = live_feed::<Order, _, _>(Arc::new(source.clone()), &channel, OrderId::from("abc123"));

        let first = feed.next().await.unwrap();
        assert_eq!(
            first,
            LiveEvent::Snapshot {
                origin: Origin::Push,
                value: order(OrderStatus::Ready)
            }
        );

        drop(tx);
        assert!(matches!(feed.next().await, Some(LiveEvent::ChannelLost(_))));
        assert!(feed.next().await.is_none());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_release_handle_releases_without_dropping_feed() {
        let source = MockSource::<Order>::new();
        let channel = MockChannel::<Order>::new();

        let feed = live_feed::<Order, _, _>(Arc::new(source), &channel, OrderId::from("abc123"));
        let release = feed.release_handle();
        assert_eq!(channel.subscriber_count(&OrderId::from("abc123")), 1);
        assert!(!release.is_released());

        assert!(release.release());
        assert_eq!(channel.subscriber_count(&OrderId::from("abc123")), 0);
        assert!(!release.release());

        drop(feed);
        assert_eq!(channel.subscriber_count(&OrderId::from("abc123")), 0);
    }

    #[tokio::test]
    async fn test_subscription_drop_runs_release() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let (_tx, rx) = mpsc::unbounded_channel::<ChangeEvent<Order>>();
        let subscription = Subscription::new("orders:UPDATE:id=eq.abc123", rx)
            .on_release(move || flag.store(true, Ordering::SeqCst));

        assert_eq!(subscription.key(), "orders:UPDATE:id=eq.abc123");
        drop(subscription);
        assert!(released.load(Ordering::SeqCst));
    }
}
