//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the
//! `tracing` crate. Log lines are compact and carry structured fields such as
//! `order_id`, `origin` and `revision` instead of module paths.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Tracker lifecycle only
//! RUST_LOG=info nore-track abc123
//!
//! # Every replacement, lookup and channel event
//! RUST_LOG=debug nore-track abc123
//!
//! # Only the change channel
//! RUST_LOG=nore_tracker::clients::change_channel=debug nore-track abc123
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=debug`**:
//!
//! ```text
//! INFO Opening change channel key=orders:UPDATE:id=eq.abc123
//! INFO Tracker started entity_type="Order" id=abc123
//! DEBUG fetch: GET url=https://api.nore.app/orders/abc123/status order_id=abc123
//! DEBUG Replaced id=abc123 origin=Fetch revision=1
//! DEBUG Replaced id=abc123 origin=Push revision=2
//! INFO Order ready order_id=abc123
//! INFO Closed entity_type="Order" id=abc123
//! ```
//!
//! Logs go to stderr so they never interleave with the rendered view on stdout.

/// Initializes the tracing/logging infrastructure for the application.
///
/// Set `RUST_LOG` to control verbosity; without it only errors are shown.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
