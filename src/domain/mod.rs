pub mod order;
pub mod snapshot;

pub use order::{Order, OrderStatus, OrderUpdate, Venue};
pub use snapshot::StatusSnapshot;
