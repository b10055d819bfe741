//! Display model for the order-tracking view.
//!
//! [`DisplayState::from_state`] turns what the tracker knows into what the
//! customer sees. It is pure: no I/O, no clock, no styling.

pub mod format;

pub use format::*;

use crate::framework::{Connection, LiveState};
use crate::model::{Order, OrderStatus, RestaurantProfile};
use std::fmt::Write;

/// Progress indicator for non-cancelled orders.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    pub step: u8,
    pub max_step: u8,
    pub fill: f64,
}

impl ProgressBar {
    /// `None` for cancelled orders, which have no progress bar.
    pub fn for_status(status: OrderStatus) -> Option<Self> {
        status.progress().map(|fill| Self {
            step: status.step(),
            max_step: OrderStatus::MAX_STEP,
            fill,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemLine {
    pub name: String,
    pub quantity: u32,
    pub amount: String,
}

/// What the order-tracking view shows.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Loading {
        connection_lost: bool,
    },
    /// Terminal error state with a way back.
    NotFound {
        reason: String,
        back_label: &'static str,
    },
    Cancelled {
        order_id: String,
        lines: Vec<ItemLine>,
        total: String,
        connection_lost: bool,
    },
    Tracking {
        order_id: String,
        status: OrderStatus,
        progress: ProgressBar,
        lines: Vec<ItemLine>,
        total: String,
        table_number: Option<u16>,
        connection_lost: bool,
    },
}

impl DisplayState {
    pub const BACK_LABEL: &'static str = "Back to menu";

    pub fn from_state(state: &LiveState<Order>) -> Self {
        let connection_lost = state.connection() == Connection::Lost;
        match state {
            LiveState::Loading { .. } => DisplayState::Loading { connection_lost },
            LiveState::NotFound { reason } => DisplayState::NotFound {
                reason: reason.clone(),
                back_label: Self::BACK_LABEL,
            },
            LiveState::Ready { value, .. } => Self::from_order(value, connection_lost),
        }
    }

    fn from_order(order: &Order, connection_lost: bool) -> Self {
        let lines = order
            .items
            .iter()
            .map(|item| ItemLine {
                name: item.name.clone(),
                quantity: item.quantity,
                amount: format_amount(item.line_total()),
            })
            .collect();
        let total = format_amount(order.total_price);

        match ProgressBar::for_status(order.status) {
            None => DisplayState::Cancelled {
                order_id: order.id.to_string(),
                lines,
                total,
                connection_lost,
            },
            Some(progress) => DisplayState::Tracking {
                order_id: order.id.to_string(),
                status: order.status,
                progress,
                lines,
                total,
                table_number: order.table_number,
                connection_lost,
            },
        }
    }

    pub fn step(&self) -> Option<u8> {
        match self {
            DisplayState::Tracking { progress, .. } => Some(progress.step),
            DisplayState::Cancelled { .. } => Some(OrderStatus::Cancelled.step()),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<&ProgressBar> {
        match self {
            DisplayState::Tracking { progress, .. } => Some(progress),
            _ => None,
        }
    }

    pub fn total(&self) -> Option<&str> {
        match self {
            DisplayState::Tracking { total, .. } | DisplayState::Cancelled { total, .. } => Some(total),
            _ => None,
        }
    }

    pub fn connection_lost(&self) -> bool {
        match self {
            DisplayState::Loading { connection_lost }
            | DisplayState::Cancelled { connection_lost, .. }
            | DisplayState::Tracking { connection_lost, .. } => *connection_lost,
            DisplayState::NotFound { .. } => false,
        }
    }

    /// Nothing further will change on screen.
    pub fn is_final(&self) -> bool {
        match self {
            DisplayState::NotFound { .. } | DisplayState::Cancelled { .. } => true,
            DisplayState::Tracking { status, .. } => status.is_terminal(),
            DisplayState::Loading { .. } => false,
        }
    }

    /// Plain-text rendering, used by the terminal front-end.
    pub fn render_text(&self, profile: &RestaurantProfile) -> String {
        let mut out = String::new();
        if let Some(name) = &profile.name {
            let _ = writeln!(out, "{name}");
        }

        match self {
            DisplayState::Loading { .. } => {
                let _ = writeln!(out, "Loading your order...");
            }
            DisplayState::NotFound { back_label, .. } => {
                let _ = writeln!(out, "Order not found.");
                let _ = writeln!(out, "[{back_label}]");
            }
            DisplayState::Cancelled {
                order_id,
                lines,
                total,
                ..
            } => {
                let _ = writeln!(out, "Order #{} has been cancelled.", short_id(order_id));
                render_lines(&mut out, lines, total, &profile.currency);
            }
            DisplayState::Tracking {
                order_id,
                status,
                progress,
                lines,
                total,
                table_number,
                ..
            } => {
                let _ = write!(out, "Order #{}", short_id(order_id));
                if let Some(table) = table_number {
                    let _ = write!(out, " - table {table}");
                }
                let _ = writeln!(out);
                let _ = writeln!(
                    out,
                    "{} {} ({}/{})",
                    render_bar(progress.fill, 20),
                    status.label(),
                    progress.step,
                    progress.max_step
                );
                render_lines(&mut out, lines, total, &profile.currency);
            }
        }

        if self.connection_lost() {
            let _ = writeln!(out, "Connection lost, showing last known status.");
        }
        out
    }
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn render_bar(fill: f64, width: usize) -> String {
    let filled = (fill.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn render_lines(out: &mut String, lines: &[ItemLine], total: &str, currency: &str) {
    for line in lines {
        let _ = writeln!(out, "  {} x {}  {} {}", line.quantity, line.name, line.amount, currency);
    }
    let _ = writeln!(out, "  Total  {total} {currency}");
}
