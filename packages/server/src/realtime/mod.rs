mod broadcaster;
mod hub;
pub mod socket;

pub use broadcaster::Broadcaster;
pub use hub::{BroadcastReport, ConnectionHub};
