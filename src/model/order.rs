//! Customer orders as reported by the order-management backend.
//!
//! # Live Tracking
//! [`Order`] implements the [`LiveEntity`](crate::framework::LiveEntity) trait,
//! allowing it to be followed by a [`LiveActor`](crate::framework::LiveActor).
//!
//! The tracker never mutates an order. Every update replaces the local copy
//! wholesale with the row delivered by the backend.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Orders.
///
/// Opaque to the tracker; it is only echoed back to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage of an order.
///
/// Legal progression is `Pending → Preparing → Ready → Delivered`, with
/// `Cancelled` reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Number of steps on the progress indicator.
    pub const MAX_STEP: u8 = 4;

    /// Position on the progress indicator. `Cancelled` sits outside it at 0.
    pub fn step(self) -> u8 {
        match self {
            OrderStatus::Pending => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::Ready => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Cancelled => 0,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Fill fraction of the progress bar, `(step - 1) / (MAX_STEP - 1)`.
    ///
    /// Returns `None` for `Cancelled`, which has no progress bar.
    pub fn progress(self) -> Option<f64> {
        match self {
            OrderStatus::Cancelled => None,
            status => Some(f64::from(status.step() - 1) / f64::from(Self::MAX_STEP - 1)),
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match (self, next) {
            (from, OrderStatus::Cancelled) => !from.is_terminal(),
            (OrderStatus::Pending, OrderStatus::Preparing)
            | (OrderStatus::Preparing, OrderStatus::Ready)
            | (OrderStatus::Ready, OrderStatus::Delivered) => true,
            _ => false,
        }
    }

    /// Customer-facing label.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order received",
            OrderStatus::Preparing => "In the kitchen",
            OrderStatus::Ready => "Ready",
            OrderStatus::Delivered => "Served",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line of an order. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Trusted from the backend; never recomputed from `items`.
    pub total_price: f64,
    /// Present only for on-premise orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u16>,
}

impl Order {
    /// Creates a new Order instance.
    ///
    /// # Arguments
    /// * `id` - Backend identifier
    /// * `status` - Current lifecycle stage
    /// * `items` - Line items in display order
    /// * `total_price` - Total as reported by the backend
    pub fn new(
        id: impl Into<OrderId>,
        status: OrderStatus,
        items: Vec<LineItem>,
        total_price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            items,
            total_price,
            table_number: None,
        }
    }

    pub fn with_table(mut self, table_number: u16) -> Self {
        self.table_number = Some(table_number);
        self
    }

    /// Sum of `quantity * unit_price` over all items.
    pub fn items_subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::line_total).sum()
    }
}
