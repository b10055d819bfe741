//! # Session Lifecycle & Orchestration
//!
//! A tracker is simple on its own; the work is in wiring it to its
//! collaborators and tearing it down cleanly. This module does both.
//!
//! **Key Responsibilities:**
//! 1. **Feed Creation** - Open the change subscription and issue the initial lookup
//! 2. **Context Injection** - Hand the alert to the tracker at `run()` time
//! 3. **Teardown** - Release the subscription whenever the view goes away
//! 4. **Observability Setup** - Initialize tracing and logging
//!
//! # Main Components
//!
//! - [`TrackerSession`] - One order-tracking view and its running tracker
//! - [`TrackerServices`] - The external collaborators a session is wired to
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod tracing;
pub mod tracker_session;

pub use self::tracing::*;
pub use tracker_session::*;
