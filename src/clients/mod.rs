//! Type-safe clients: the tracker handle handed to views, and the backend
//! collaborators (order lookup, restaurant profile, change channel).

pub mod change_channel;
pub mod http;
pub mod live_client;
pub mod order_query;
pub mod profile_client;
pub mod session;
pub mod tracker_client;

pub use change_channel::*;
pub use http::build_client;
pub use live_client::*;
pub use order_query::*;
pub use profile_client::*;
pub use session::*;
pub use tracker_client::*;
