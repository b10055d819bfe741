//! Change Notification Channel over Server-Sent Events.
//!
//! A subscription is keyed by table, event type and row filter, e.g.
//! `orders` / `UPDATE` / `id=eq.abc123`. The realtime gateway streams one SSE
//! message per matching row change; the message data is the full updated row,
//! either bare or wrapped as `{"new": row}` / `{"record": row}`.

use crate::clients::http::endpoint;
use crate::clients::session::SessionContext;
use crate::framework::{ChangeEvent, ChangeFeed, SourceError, Subscription};
use crate::model::{Order, OrderId};
use futures::StreamExt;
use reqwest::{Client, Url};
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use std::fmt::Display;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const ORDERS_TABLE: &str = "orders";

/// Change event name for row updates.
pub const UPDATE_EVENT: &str = "UPDATE";

/// Identifies what a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub table: String,
    pub event: &'static str,
    pub filter: String,
}

impl ChannelKey {
    /// Updates to the single `orders` row with the given id.
    pub fn order_updates(id: &OrderId) -> Self {
        Self {
            table: ORDERS_TABLE.to_string(),
            event: UPDATE_EVENT,
            filter: format!("id=eq.{id}"),
        }
    }
}

impl Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.table, self.event, self.filter)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChangePayload {
    Row(Order),
    Envelope {
        #[serde(alias = "record")]
        new: Order,
    },
}

/// Decodes one SSE message into an order row.
///
/// Returns `None` for keepalives, other event types and malformed payloads.
pub fn decode_change(event: &str, data: &str, expected: &str) -> Option<Order> {
    if data.is_empty() || data == "keepalive" {
        return None;
    }
    if event != expected && event != "message" {
        debug!(event, "Ignoring change event of another kind");
        return None;
    }
    match serde_json::from_str::<ChangePayload>(data) {
        Ok(ChangePayload::Row(order)) | Ok(ChangePayload::Envelope { new: order }) => Some(order),
        Err(e) => {
            warn!(error = %e, "Skipping malformed change payload");
            None
        }
    }
}

/// Change channel backed by the realtime gateway's SSE endpoint.
#[derive(Debug, Clone)]
pub struct SseChangeChannel {
    client: Client,
    realtime_url: Url,
    session: SessionContext,
}

impl SseChangeChannel {
    /// `client` must not carry a request timeout; the stream is long-lived.
    pub fn new(client: Client, realtime_url: Url, session: SessionContext) -> Self {
        Self {
            client,
            realtime_url,
            session,
        }
    }

    pub fn changes_url(&self, key: &ChannelKey) -> Result<Url, SourceError> {
        let mut url = endpoint(&self.realtime_url, &["changes"])?;
        url.query_pairs_mut()
            .append_pair("table", &key.table)
            .append_pair("event", key.event)
            .append_pair("filter", &key.filter);
        Ok(url)
    }
}

impl ChangeFeed<Order> for SseChangeChannel {
    fn subscribe(&self, id: &OrderId) -> Result<Subscription<Order>, SourceError> {
        let key = ChannelKey::order_updates(id);
        let url = self.changes_url(&key)?;
        let request = self.session.authorize(self.client.get(url));
        let mut source =
            EventSource::new(request).map_err(|e| SourceError::Subscribe(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let kind = key.event;
        let label = key.to_string();
        info!(key = %label, "Opening change channel");

        let task = tokio::spawn(async move {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => debug!(key = %label, "Change channel open"),
                    Ok(Event::Message(message)) => {
                        if let Some(order) = decode_change(&message.event, &message.data, kind) {
                            if tx.send(ChangeEvent::Updated(order)).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        // No reconnect: the view keeps its last snapshot and shows the loss.
                        let _ = tx.send(ChangeEvent::Lost(e.to_string()));
                        break;
                    }
                }
            }
            source.close();
        });

        Ok(Subscription::new(key.to_string(), rx).with_task(task))
    }
}
