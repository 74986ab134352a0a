//! Local broadcast: picks the host bus for the add-on type and publishes
//! events to in-process listeners.

use std::sync::Arc;

use addon_core::event_bus::{noop_beacon, BeaconSender, LocalChannel, ObserverBus};
use addon_core::{AddonType, EventPayload, MetricsError, MetricsResult};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

const CHANNEL_CAPACITY: usize = 256;

/// Capabilities the embedding host provides. Only the bus matching the add-on
/// type has to be present.
#[derive(Clone)]
pub struct HostCapabilities {
    pub channel: Option<Arc<dyn LocalChannel>>,
    pub observers: Option<Arc<dyn ObserverBus>>,
    pub beacon: Arc<dyn BeaconSender>,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            channel: None,
            observers: None,
            beacon: noop_beacon(),
        }
    }
}

impl HostCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: Arc<dyn LocalChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_observers(mut self, observers: Arc<dyn ObserverBus>) -> Self {
        self.observers = Some(observers);
        self
    }

    pub fn with_beacon(mut self, beacon: Arc<dyn BeaconSender>) -> Self {
        self.beacon = beacon;
        self
    }
}

/// Resolved local bus. Chosen once and held for the dispatcher's lifetime.
#[derive(Clone)]
pub enum LocalTransport {
    /// webextension: structured payload on a broadcast channel.
    Channel(Arc<dyn LocalChannel>),
    /// sdk / bootstrapped: JSON string on the observer bus.
    Observer(Arc<dyn ObserverBus>),
}

impl LocalTransport {
    pub fn select(addon_type: AddonType, host: &HostCapabilities) -> MetricsResult<Self> {
        let transport = if addon_type.uses_observer_bus() {
            host.observers.clone().map(Self::Observer)
        } else {
            host.channel.clone().map(Self::Channel)
        };

        transport.ok_or_else(|| {
            MetricsError::config(format!(
                "host provides no {} for add-on type '{addon_type}'",
                if addon_type.uses_observer_bus() {
                    "observer bus"
                } else {
                    "broadcast channel"
                }
            ))
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Channel(_) => "channel",
            Self::Observer(_) => "observer",
        }
    }

    /// Publish to local listeners. Capability errors pass through unchanged.
    pub fn publish(&self, topic: &str, payload: &EventPayload) -> MetricsResult<()> {
        match self {
            Self::Channel(channel) => channel.publish(topic, payload)?,
            Self::Observer(bus) => {
                let data = payload.to_json_string()?;
                bus.notify(topic, &data)?;
            }
        }
        trace!(topic, transport = self.kind(), "local broadcast published");
        Ok(())
    }
}

/// In-process broadcast channel keyed by topic. Each topic gets its own
/// `tokio::sync::broadcast` sender, created on first use.
pub struct TokioChannel {
    topics: DashMap<String, broadcast::Sender<EventPayload>>,
    capacity: usize,
}

impl Default for TokioChannel {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

impl TokioChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity,
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<EventPayload> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<EventPayload> {
        self.sender(topic).subscribe()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl LocalChannel for TokioChannel {
    fn publish(&self, topic: &str, payload: &EventPayload) -> anyhow::Result<()> {
        // A channel with no listeners drops the message, same as a browser
        // BroadcastChannel.
        match self.sender(topic).send(payload.clone()) {
            Ok(receivers) => trace!(topic, receivers, "payload delivered"),
            Err(_) => debug!(topic, "no local listeners, payload dropped"),
        }
        Ok(())
    }
}
