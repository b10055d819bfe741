//! Generic live-state framework for following a single backend record.
//!
//! # Main Components
//!
//! - [`LiveEntity`] - Trait that followed record types implement
//! - [`LiveActor`] - Generic actor that owns the local copy of the record
//! - [`LiveClient`] - Type-safe client for that actor
//! - [`live_feed`] - Merges the initial lookup and pushed changes into one stream
//! - [`SnapshotSource`] / [`ChangeFeed`] - The two external collaborators
//!
//! # Testing
//!
//! See [`mock`] module for an expectation-driven source and an in-memory channel.

pub mod core;
pub mod feed;
pub mod mock;

// Re-export core types for convenience
pub use self::core::*;
pub use feed::*;
