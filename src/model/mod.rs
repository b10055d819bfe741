//! Pure data structures for orders and restaurant branding.
//!
//! [`Order`] implements the [`LiveEntity`](crate::framework::LiveEntity) trait
//! (see [`crate::tracker::entity`]).

pub mod order;
pub mod profile;

pub use order::*;
pub use profile::*;
