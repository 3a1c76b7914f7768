pub mod adapters;
pub mod api;
pub mod config;
pub mod dex;
pub mod domain;
pub mod error;
pub mod queue;
pub mod server;
pub mod services;

pub use adapters::{OrderStore, PostgresStore};
pub use config::AppConfig;
pub use dex::{DexExecution, DexQuote, DexRouter, MockDexRouter};
pub use domain::{Order, OrderStatus, OrderUpdate, StatusSnapshot, Venue};
pub use error::{PipelineError, Result, SwapflowError};
pub use queue::{JobQueue, OrderWorker};
pub use services::{ActiveOrderCache, StatusFanout};
