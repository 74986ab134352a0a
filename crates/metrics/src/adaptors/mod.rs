//! Adaptors for translating add-on events into collector parameters.
//!
//! Each adaptor implements [`EventAdaptor`] to turn an [`EventRecord`] into the
//! flat parameter set expected by its collector.

pub mod ga;

use addon_core::{AnalyticsParams, DispatcherConfig, EventRecord};

/// Adaptor trait: transforms an event into a collector's measurement protocol.
///
/// Implementations must be pure: no I/O, and the record is only borrowed.
pub trait EventAdaptor: Send + Sync {
    /// Platform identifier (e.g. "ua").
    fn platform(&self) -> &str;

    /// Transform an event into the collector's flat parameters.
    fn transform(&self, config: &DispatcherConfig, record: &EventRecord) -> AnalyticsParams;
}
