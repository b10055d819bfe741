//! # Core Live-State Framework
//!
//! This module defines the generic building blocks for following a single
//! backend record for the lifetime of a view.
//!
//! ## Key Types
//!
//! - [`LiveEntity`]: The trait that every followed record type implements.
//! - [`LiveActor`]: The generic actor that owns the local copy of the record.
//! - [`LiveClient`]: The generic client for talking to that actor.
//! - [`LiveState`]: What the actor currently knows (loading, ready, not found).
//! - [`FrameworkError`]: Errors of the plumbing itself (e.g., ActorClosed).

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Where a new copy of the record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Request/response lookup (the initial load).
    Fetch,
    /// Pushed by the change notification channel.
    Push,
}

/// Trait that any record must implement to be followed by a [`LiveActor`].
///
/// # Architecture Note
/// The actor loop (ordering, staleness, teardown) is written once here and
/// reused for any record type. The entity only supplies its identifier and,
/// optionally, a hook that observes each replacement.
///
/// # Async & Context
/// The hook is `#[async_trait]` and receives a `Context` injected when the
/// actor is started with [`LiveActor::run`], not when it is constructed.
#[async_trait]
pub trait LiveEntity: Clone + Debug + Send + Sync + 'static {
    /// The unique identifier for this record.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// Dependencies injected into the hook. Use `()` if none are needed.
    type Context: Send + Sync + 'static;

    fn id(&self) -> &Self::Id;

    /// Called when `self` is about to replace `previous` as the local copy.
    ///
    /// The replacement always happens; the hook cannot veto it.
    async fn on_replace(&self, _previous: Option<&Self>, _origin: Origin, _ctx: &Self::Context) {}
}

/// Health of the change notification channel as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Live,
    Lost,
}

/// What the actor currently knows about the followed record.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveState<T> {
    /// Nothing received yet.
    Loading { connection: Connection },
    /// A copy is held. `revision` counts replacements, starting at 1.
    Ready {
        value: T,
        revision: u64,
        connection: Connection,
    },
    /// The initial load failed. Terminal: no further events are applied.
    NotFound { reason: String },
}

impl<T> LiveState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            LiveState::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn revision(&self) -> u64 {
        match self {
            LiveState::Ready { revision, .. } => *revision,
            _ => 0,
        }
    }

    pub fn connection(&self) -> Connection {
        match self {
            LiveState::Loading { connection } | LiveState::Ready { connection, .. } => *connection,
            LiveState::NotFound { .. } => Connection::Lost,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LiveState::NotFound { .. })
    }

    fn mark_lost(&mut self) {
        match self {
            LiveState::Loading { connection } | LiveState::Ready { connection, .. } => {
                *connection = Connection::Lost;
            }
            LiveState::NotFound { .. } => {}
        }
    }
}

/// One item of a live feed (see [`live_feed`](crate::framework::live_feed)).
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent<T> {
    /// A full copy of the record, replacing whatever is held.
    Snapshot { origin: Origin, value: T },
    /// The initial load failed.
    LoadFailed(String),
    /// The change channel could not be opened or stopped delivering.
    ChannelLost(String),
}

// =============================================================================
// 2. THE MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the live-state framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
}

/// Requests a [`LiveClient`] can send to its [`LiveActor`].
#[derive(Debug)]
pub enum LiveRequest<T: LiveEntity> {
    Snapshot {
        respond_to: oneshot::Sender<LiveState<T>>,
    },
    /// Release the feed (and with it the subscription), then stop.
    Close { respond_to: oneshot::Sender<()> },
}

/// Whether the feed is still wanted after an event was applied.
enum Flow {
    Continue,
    Release,
}

// =============================================================================
// 3. THE ACTOR
// =============================================================================

/// The generic actor that owns the local copy of one followed record.
///
/// **Concurrency Model**:
/// The actor multiplexes two inputs on a single task: requests from clients
/// and events from the live feed. Both are handled one at a time, so the held
/// state needs no lock. Every change is published on a `watch` channel.
pub struct LiveActor<T: LiveEntity> {
    id: T::Id,
    receiver: mpsc::Receiver<LiveRequest<T>>,
    publisher: watch::Sender<LiveState<T>>,
    state: LiveState<T>,
    revision: u64,
}

impl<T: LiveEntity> LiveActor<T> {
    pub fn new(id: T::Id, buffer_size: usize) -> (Self, LiveClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let state = LiveState::Loading {
            connection: Connection::Live,
        };
        let (publisher, observer) = watch::channel(state.clone());
        let actor = Self {
            id,
            receiver,
            publisher,
            state,
            revision: 0,
        };
        (actor, LiveClient::new(sender, observer))
    }

    /// Runs the actor until it is closed or every client is dropped.
    ///
    /// The feed is dropped before a `Close` request is acknowledged, so the
    /// subscription behind it is already released when `close()` returns.
    pub async fn run(mut self, feed: BoxStream<'static, LiveEvent<T>>, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let id = self.id.clone();
        info!(entity_type, %id, "Tracker started");

        let mut feed = Some(feed);
        loop {
            tokio::select! {
                request = self.receiver.recv() => match request {
                    Some(LiveRequest::Snapshot { respond_to }) => {
                        let _ = respond_to.send(self.state.clone());
                    }
                    Some(LiveRequest::Close { respond_to }) => {
                        drop(feed.take());
                        info!(entity_type, %id, "Closed");
                        let _ = respond_to.send(());
                        break;
                    }
                    None => break,
                },
                event = next_event(&mut feed) => match event {
                    Some(event) => {
                        if let Flow::Release = self.apply(event, &context).await {
                            drop(feed.take());
                            debug!(entity_type, %id, "Feed released");
                        }
                    }
                    None => {
                        debug!(entity_type, %id, "Feed ended");
                        feed = None;
                    }
                },
            }
        }

        drop(feed);
        info!(entity_type, %id, revision = self.revision, "Shutdown");
    }

    async fn apply(&mut self, event: LiveEvent<T>, context: &T::Context) -> Flow {
        if self.state.is_not_found() {
            return Flow::Release;
        }

        let flow = match event {
            LiveEvent::Snapshot { origin, value } => {
                value.on_replace(self.state.value(), origin, context).await;
                self.revision += 1;
                debug!(id = %self.id, ?origin, revision = self.revision, "Replaced");
                self.state = LiveState::Ready {
                    value,
                    revision: self.revision,
                    connection: self.state.connection(),
                };
                Flow::Continue
            }
            LiveEvent::LoadFailed(reason) => {
                warn!(id = %self.id, %reason, "Load failed");
                self.state = LiveState::NotFound { reason };
                Flow::Release
            }
            LiveEvent::ChannelLost(reason) => {
                warn!(id = %self.id, %reason, "Change channel lost, keeping last known state");
                self.state.mark_lost();
                Flow::Continue
            }
        };
        self.publisher.send_replace(self.state.clone());
        flow
    }
}

async fn next_event<T>(feed: &mut Option<BoxStream<'static, LiveEvent<T>>>) -> Option<LiveEvent<T>> {
    match feed {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

// =============================================================================
// 4. THE CLIENT
// =============================================================================

/// A type-safe client for interacting with a [`LiveActor`].
#[derive(Clone)]
pub struct LiveClient<T: LiveEntity> {
    sender: mpsc::Sender<LiveRequest<T>>,
    observer: watch::Receiver<LiveState<T>>,
}

impl<T: LiveEntity> LiveClient<T> {
    pub fn new(sender: mpsc::Sender<LiveRequest<T>>, observer: watch::Receiver<LiveState<T>>) -> Self {
        Self { sender, observer }
    }

    pub async fn snapshot(&self) -> Result<LiveState<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LiveRequest::Snapshot { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }

    /// A receiver that observes every state change.
    pub fn changes(&self) -> watch::Receiver<LiveState<T>> {
        self.observer.clone()
    }

    pub async fn close(&self) -> Result<(), FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(LiveRequest::Close { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Ticket {
        id: u32,
        stage: &'static str,
    }

    #[async_trait]
    impl LiveEntity for Ticket {
        type Id = u32;
        type Context = Arc<AtomicUsize>;

        fn id(&self) -> &u32 {
            &self.id
        }

        async fn on_replace(&self, _previous: Option<&Self>, origin: Origin, pushes: &Self::Context) {
            if origin == Origin::Push {
                pushes.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn channel_feed(
        mut rx: mpsc::UnboundedReceiver<LiveEvent<Ticket>>,
    ) -> BoxStream<'static, LiveEvent<Ticket>> {
        Box::pin(async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        })
    }

    fn ticket(stage: &'static str) -> Ticket {
        Ticket { id: 7, stage }
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_live_actor_applies_events_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let pushes = Arc::new(AtomicUsize::new(0));
        let (actor, client) = LiveActor::<Ticket>::new(7, 8);
        let handle = tokio::spawn(actor.run(channel_feed(rx), pushes.clone()));

        let mut changes = client.changes();
        assert_eq!(
            *changes.borrow(),
            LiveState::Loading {
                connection: Connection::Live
            }
        );

        tx.send(LiveEvent::Snapshot {
            origin: Origin::Fetch,
            value: ticket("open"),
        })
        .unwrap();
        tx.send(LiveEvent::Snapshot {
            origin: Origin::Push,
            value: ticket("closed"),
        })
        .unwrap();

        let state = changes
            .wait_for(|state| state.revision() == 2)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.value(), Some(&ticket("closed")));
        assert_eq!(state.connection(), Connection::Live);
        assert_eq!(pushes.load(Ordering::SeqCst), 1);

        client.close().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_lost_keeps_last_value() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (actor, client) = LiveActor::<Ticket>::new(7, 8);
        tokio::spawn(actor.run(channel_feed(rx), Arc::new(AtomicUsize::new(0))));

        tx.send(LiveEvent::Snapshot {
            origin: Origin::Fetch,
            value: ticket("open"),
        })
        .unwrap();
        tx.send(LiveEvent::ChannelLost("reset by peer".into())).unwrap();

        let mut changes = client.changes();
        let state = changes
            .wait_for(|state| state.connection() == Connection::Lost)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.value(), Some(&ticket("open")));
        assert_eq!(state.revision(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_terminal() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (actor, client) = LiveActor::<Ticket>::new(7, 8);
        tokio::spawn(actor.run(channel_feed(rx), Arc::new(AtomicUsize::new(0))));

        tx.send(LiveEvent::LoadFailed("404 Not Found".into())).unwrap();

        let mut changes = client.changes();
        changes.wait_for(LiveState::is_not_found).await.unwrap();

        // The feed was released: its receiving half is gone.
        tokio::task::yield_now().await;
        let late = tx.send(LiveEvent::Snapshot {
            origin: Origin::Push,
            value: ticket("open"),
        });
        assert!(late.is_err());

        let state = client.snapshot().await.unwrap();
        assert_eq!(
            state,
            LiveState::NotFound {
                reason: "404 Not Found".into()
            }
        );
    }

    #[tokio::test]
    async fn test_close_releases_feed_and_stops_actor() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (actor, client) = LiveActor::<Ticket>::new(7, 8);
        let handle = tokio::spawn(actor.run(channel_feed(rx), Arc::new(AtomicUsize::new(0))));

        client.close().await.unwrap();
        assert!(tx.is_closed());
        handle.await.unwrap();

        assert_eq!(client.snapshot().await, Err(FrameworkError::ActorClosed));
    }

    #[tokio::test]
    async fn test_dropping_all_clients_stops_actor() {
        let (tx, rx) = mpsc::unbounded_channel::<LiveEvent<Ticket>>();
        let (actor, client) = LiveActor::<Ticket>::new(7, 8);
        let handle = tokio::spawn(actor.run(channel_feed(rx), Arc::new(AtomicUsize::new(0))));

        drop(client);
        handle.await.unwrap();
        assert!(tx.is_closed());
    }
}
