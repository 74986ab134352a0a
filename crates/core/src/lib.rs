pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;

pub use config::{DispatcherConfig, MetricsOptions};
pub use error::{MetricsError, MetricsResult};
pub use types::{AddonType, AnalyticsParams, EventPayload, EventRecord, Uid};
