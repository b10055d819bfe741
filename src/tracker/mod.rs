//! Order-specific tracking logic and entity implementation.

pub mod alert;
pub mod entity;
pub mod error;

pub use alert::*;
pub use entity::*;
pub use error::*;

use crate::clients::TrackerClient;
use crate::framework::LiveActor;
use crate::model::{Order, OrderId};

/// Creates a new Order tracker actor and its client.
pub fn new(order_id: OrderId) -> (LiveActor<Order>, TrackerClient) {
    let (actor, generic_client) = LiveActor::new(order_id.clone(), 16);
    let client = TrackerClient::new(order_id, generic_client);

    (actor, client)
}
