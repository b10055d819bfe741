//! # Mock Framework
//!
//! Utilities for testing trackers without a backend.
//!
//! - [`MockSource`] answers lookups from a queue of expectations.
//! - [`MockChannel`] is an in-memory change channel; tests push rows with
//!   [`MockChannel::emit`] and observe subscriptions coming and going.

use crate::framework::core::LiveEntity;
use crate::framework::feed::{ChangeEvent, ChangeFeed, SnapshotSource, SourceError, Subscription};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected lookup and the answer to give.
struct Expectation<T: LiveEntity> {
    id: T::Id,
    gate: Option<Arc<Notify>>,
    response: Result<T, SourceError>,
}

/// A snapshot source with expectation tracking for fluent testing.
///
/// # Example
/// ```ignore
/// let source = MockSource::<Order>::new();
/// source.expect_fetch(OrderId::from("abc123")).return_ok(order);
///
/// let feed = live_feed(Arc::new(source.clone()), &channel, OrderId::from("abc123"));
/// // Drive the feed...
/// source.verify(); // Ensures all expectations were met
/// ```
pub struct MockSource<T: LiveEntity> {
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
    calls: Arc<AtomicUsize>,
}

impl<T: LiveEntity> Clone for MockSource<T> {
    fn clone(&self) -> Self {
        Self {
            expectations: Arc::clone(&self.expectations),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T: LiveEntity> Default for MockSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LiveEntity> MockSource<T> {
    /// Creates a new mock source with no expectations.
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Expects a lookup of `id`.
    pub fn expect_fetch(&self, id: T::Id) -> FetchExpectationBuilder<T> {
        FetchExpectationBuilder {
            id,
            gate: None,
            expectations: Arc::clone(&self.expectations),
        }
    }

    /// Number of lookups received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().expect("mock expectations poisoned");
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl<T: LiveEntity> SnapshotSource<T> for MockSource<T> {
    async fn fetch(&self, id: &T::Id) -> Result<T, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let expectation = self
            .expectations
            .lock()
            .expect("mock expectations poisoned")
            .pop_front();

        match expectation {
            Some(Expectation { id: expected, gate, response }) => {
                assert_eq!(&expected, id, "Unexpected lookup id");
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                response
            }
            None => panic!("Unexpected lookup of {id}"),
        }
    }
}

/// Builder for lookup expectations.
pub struct FetchExpectationBuilder<T: LiveEntity> {
    id: T::Id,
    gate: Option<Arc<Notify>>,
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
}

impl<T: LiveEntity> FetchExpectationBuilder<T> {
    /// Holds the answer back until `gate` is notified.
    pub fn until(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: SourceError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, SourceError>) {
        let mut exps = self.expectations.lock().expect("mock expectations poisoned");
        exps.push_back(Expectation {
            id: self.id,
            gate: self.gate,
            response,
        });
    }
}

// =============================================================================
// IN-MEMORY CHANGE CHANNEL
// =============================================================================

type Subscribers<T> = HashMap<<T as LiveEntity>::Id, Vec<(u64, mpsc::UnboundedSender<ChangeEvent<T>>)>>;

struct ChannelState<T: LiveEntity> {
    subscribers: Subscribers<T>,
    next_token: u64,
    refuse: bool,
}

/// An in-memory change channel keyed by record id.
pub struct MockChannel<T: LiveEntity> {
    state: Arc<Mutex<ChannelState<T>>>,
}

impl<T: LiveEntity> Clone for MockChannel<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: LiveEntity> Default for MockChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LiveEntity> MockChannel<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChannelState {
                subscribers: HashMap::new(),
                next_token: 0,
                refuse: false,
            })),
        }
    }

    /// Makes every later `subscribe` call fail.
    pub fn refuse_subscriptions(&self) {
        self.lock().refuse = true;
    }

    /// Delivers `value` to every open subscription on its id.
    ///
    /// Returns the number of subscriptions it reached.
    pub fn emit(&self, value: T) -> usize {
        let id = value.id().clone();
        self.emit_on(&id, value)
    }

    /// Delivers `value` on the subscriptions for `id`, whatever id `value` carries.
    pub fn emit_on(&self, id: &T::Id, value: T) -> usize {
        self.send(id, ChangeEvent::Updated(value))
    }

    /// Tells every open subscription on `id` that the channel is gone.
    pub fn disconnect(&self, id: &T::Id) -> usize {
        self.send(id, ChangeEvent::Lost("connection reset".to_string()))
    }

    pub fn subscriber_count(&self, id: &T::Id) -> usize {
        self.lock().subscribers.get(id).map_or(0, Vec::len)
    }

    fn send(&self, id: &T::Id, event: ChangeEvent<T>) -> usize {
        let state = self.lock();
        state.subscribers.get(id).map_or(0, |subscribers| {
            subscribers
                .iter()
                .filter(|(_, tx)| tx.send(event.clone()).is_ok())
                .count()
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelState<T>> {
        self.state.lock().expect("mock channel poisoned")
    }
}

impl<T: LiveEntity> ChangeFeed<T> for MockChannel<T> {
    fn subscribe(&self, id: &T::Id) -> Result<Subscription<T>, SourceError> {
        let mut state = self.lock();
        if state.refuse {
            return Err(SourceError::Subscribe("mock channel refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let token = state.next_token;
        state.next_token += 1;
        state.subscribers.entry(id.clone()).or_default().push((token, tx));
        drop(state);

        let shared = Arc::clone(&self.state);
        let key = id.clone();
        Ok(Subscription::new(format!("mock:{id}"), rx).on_release(move || {
            if let Ok(mut state) = shared.lock() {
                if let Some(subscribers) = state.subscribers.get_mut(&key) {
                    subscribers.retain(|(t, _)| *t != token);
                    if subscribers.is_empty() {
                        state.subscribers.remove(&key);
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Order, OrderId, OrderStatus};
    use futures::StreamExt;

    fn order(status: OrderStatus) -> Order {
        Order::new("abc123", status, Vec::new(), 0.0)
    }

    #[tokio::test]
    async fn test_mock_source_with_expectations() {
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("abc123"))
            .return_ok(order(OrderStatus::Pending));
        source
            .expect_fetch(OrderId::from("abc123"))
            .return_err(SourceError::NotFound("gone".into()));

        let first = source.fetch(&OrderId::from("abc123")).await;
        assert_eq!(first, Ok(order(OrderStatus::Pending)));
        let second = source.fetch(&OrderId::from("abc123")).await;
        assert_eq!(second, Err(SourceError::NotFound("gone".into())));

        assert_eq!(source.calls(), 2);
        source.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met")]
    async fn test_verify_reports_unmet_expectations() {
        let source = MockSource::<Order>::new();
        source
            .expect_fetch(OrderId::from("abc123"))
            .return_ok(order(OrderStatus::Pending));
        source.verify();
    }

    #[tokio::test]
    async fn test_mock_channel_routes_by_id() {
        let channel = MockChannel::<Order>::new();
        let mut subscription = channel.subscribe(&OrderId::from("abc123")).unwrap();
        let _other = channel.subscribe(&OrderId::from("zzz999")).unwrap();

        assert_eq!(channel.emit(order(OrderStatus::Ready)), 1);
        assert_eq!(
            subscription.next().await,
            Some(ChangeEvent::Updated(order(OrderStatus::Ready)))
        );

        drop(subscription);
        assert_eq!(channel.subscriber_count(&OrderId::from("abc123")), 0);
        assert_eq!(channel.emit(order(OrderStatus::Delivered)), 0);
        assert_eq!(channel.subscriber_count(&OrderId::from("zzz999")), 1);
    }
}
