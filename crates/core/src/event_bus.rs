//! Host capabilities: the buses and network primitive the dispatcher talks to.
//!
//! The dispatcher never reaches for host globals. The host hands it an
//! `Arc<dyn LocalChannel>` (webextension hosts), an `Arc<dyn ObserverBus>`
//! (sdk and bootstrapped hosts) and an `Arc<dyn BeaconSender>` for the remote
//! collector. The capture implementations below record every call and are
//! what the tests plug in.

use crate::types::EventPayload;
use std::sync::{Arc, Mutex};

/// Channel-style local bus: structured payloads, no serialization.
pub trait LocalChannel: Send + Sync {
    fn publish(&self, topic: &str, payload: &EventPayload) -> anyhow::Result<()>;
}

/// Observer-style notification bus. Observers receive string data, so the
/// payload arrives JSON-encoded.
pub trait ObserverBus: Send + Sync {
    fn notify(&self, topic: &str, data: &str) -> anyhow::Result<()>;
}

/// Best-effort network send. Nothing comes back and nothing is awaited.
pub trait BeaconSender: Send + Sync {
    fn send_beacon(&self, url: &str, body: String);
}

/// Beacon that drops every hit.
pub struct NoopBeacon;

impl BeaconSender for NoopBeacon {
    fn send_beacon(&self, _url: &str, _body: String) {}
}

/// In-memory channel that captures publishes for testing.
#[derive(Default)]
pub struct CaptureChannel {
    published: Mutex<Vec<(String, EventPayload)>>,
}

impl CaptureChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, EventPayload)> {
        self.published.lock().expect("capture mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.published.lock().expect("capture mutex poisoned").len()
    }
}

impl LocalChannel for CaptureChannel {
    fn publish(&self, topic: &str, payload: &EventPayload) -> anyhow::Result<()> {
        self.published
            .lock()
            .expect("capture mutex poisoned")
            .push((topic.to_string(), payload.clone()));
        Ok(())
    }
}

/// In-memory observer bus that captures notifications for testing.
#[derive(Default)]
pub struct CaptureBus {
    notified: Mutex<Vec<(String, String)>>,
}

impl CaptureBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notified(&self) -> Vec<(String, String)> {
        self.notified.lock().expect("capture mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.notified.lock().expect("capture mutex poisoned").len()
    }
}

impl ObserverBus for CaptureBus {
    fn notify(&self, topic: &str, data: &str) -> anyhow::Result<()> {
        self.notified
            .lock()
            .expect("capture mutex poisoned")
            .push((topic.to_string(), data.to_string()));
        Ok(())
    }
}

/// In-memory beacon that captures `(url, body)` pairs for testing.
#[derive(Default)]
pub struct CaptureBeacon {
    sent: Mutex<Vec<(String, String)>>,
}

impl CaptureBeacon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("capture mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().expect("capture mutex poisoned").len()
    }
}

impl BeaconSender for CaptureBeacon {
    fn send_beacon(&self, url: &str, body: String) {
        self.sent
            .lock()
            .expect("capture mutex poisoned")
            .push((url.to_string(), body));
    }
}

/// Convenience: a beacon for hosts that never send remotely.
pub fn noop_beacon() -> Arc<dyn BeaconSender> {
    Arc::new(NoopBeacon)
}

pub fn capture_channel() -> Arc<CaptureChannel> {
    Arc::new(CaptureChannel::new())
}

pub fn capture_bus() -> Arc<CaptureBus> {
    Arc::new(CaptureBus::new())
}

pub fn capture_beacon() -> Arc<CaptureBeacon> {
    Arc::new(CaptureBeacon::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::EventRecord;

    #[test]
    fn test_capture_channel() {
        let channel = capture_channel();
        assert_eq!(channel.count(), 0);

        let payload = EventPayload::merge("@my-addon", &EventRecord::action("button", "click"));
        channel.publish("testpilot-telemetry", &payload).unwrap();

        let published = channel.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "testpilot-telemetry");
        assert_eq!(published[0].1, payload);
    }

    #[test]
    fn test_capture_bus_and_beacon() {
        let bus = capture_bus();
        bus.notify("testpilottest", "{}").unwrap();
        assert_eq!(bus.notified(), vec![("testpilottest".to_string(), "{}".to_string())]);

        let beacon = capture_beacon();
        beacon.send_beacon("https://collector.test/collect", "v=1".into());
        assert_eq!(beacon.count(), 1);
        assert_eq!(beacon.sent()[0].1, "v=1");
    }

    #[test]
    fn test_noop_beacon() {
        // Should not panic
        noop_beacon().send_beacon("https://collector.test/collect", String::new());
    }
}
