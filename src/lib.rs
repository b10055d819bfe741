//! # Nore Tracker
//!
//! > **Live order-status tracking for Nore Menu restaurants.**
//!
//! A customer who has placed an order follows its progress in real time:
//! received, in the kitchen, ready, served (or cancelled). This crate loads the
//! order once, listens for pushed updates on a change channel, and keeps a
//! display model in step with whatever arrived last.
//!
//! ## 🏗️ Design
//!
//! ### One actor per tracked value
//! Each tracked order is owned by a single [`LiveActor`](framework::LiveActor)
//! running in its own Tokio task. The initial lookup and every pushed change
//! arrive on one merged feed, so the actor applies them sequentially with no
//! locks. Every change of state is published on a `watch` channel that views
//! subscribe to.
//!
//! ### Subscribe first, then fetch
//! The change subscription is opened *before* the initial lookup is issued, so
//! nothing pushed during the lookup is missed. A lookup that resolves after a
//! push has been applied is discarded instead of overwriting newer data.
//!
//! ### Async Context Injection
//! Collaborators such as the ready alert are injected at `run()` time, not at
//! construction time, exactly like the entity hooks expect them.
//!
//! ### Observability
//! `tracing` is used everywhere with structured fields (`order_id`, `origin`,
//! `revision`). See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Generic live-value machinery: [`LiveEntity`](framework::LiveEntity),
//! [`LiveActor`](framework::LiveActor), [`live_feed`](framework::live_feed) and
//! the test doubles in [`framework::mock`].
//!
//! ### 2. The Tracker ([`tracker`])
//! The order-specific hooks: transition logging and the ready alert.
//!
//! ### 3. The Interface ([`clients`])
//! The HTTP lookups, the server-sent-events change channel, the session
//! credentials and the typed [`TrackerClient`](clients::TrackerClient).
//!
//! ### 4. The View ([`view`])
//! Pure mapping from tracker state to what the customer sees.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! [`TrackerSession`](lifecycle::TrackerSession) wires everything together and
//! tears it down when the view goes away.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! NORE_API_URL=https://api.nore.app RUST_LOG=info cargo run -- abc123
//! ```

pub mod clients;
pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod tracker;
pub mod view;
