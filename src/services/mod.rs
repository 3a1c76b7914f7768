pub mod active_orders;
pub mod fanout;

pub use active_orders::ActiveOrderCache;
pub use fanout::{StatusFanout, Subscription};
