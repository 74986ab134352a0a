//! Add-on event telemetry: local re-broadcast of application events and
//! best-effort forwarding to an analytics collector.
//!
//! # Modules
//!
//! - [`dispatcher`]: The per-add-on [`Dispatcher`] and its `send_event` entry point
//! - [`broadcast`]: Local bus selection by add-on type, plus an in-process channel
//! - [`adaptors`]: Event → collector parameter transforms (Measurement Protocol)
//! - [`encoder`]: Form encoding of collector hits
//! - [`beacon`]: Fire-and-forget HTTP beacon

pub mod adaptors;
pub mod beacon;
pub mod broadcast;
pub mod dispatcher;
pub mod encoder;

pub use adaptors::ga::GaAdaptor;
pub use adaptors::EventAdaptor;
pub use beacon::HttpBeacon;
pub use broadcast::{HostCapabilities, LocalTransport, TokioChannel};
pub use dispatcher::{Dispatched, Dispatcher};
pub use encoder::{encode_params, form_encode};
