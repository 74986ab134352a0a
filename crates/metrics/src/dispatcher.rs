//! Event dispatcher: re-broadcasts every event locally and, when a tracking
//! id is configured, forwards a measurement-protocol hit to the collector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use addon_core::event_bus::BeaconSender;
use addon_core::{
    AddonType, DispatcherConfig, EventPayload, EventRecord, MetricsOptions, MetricsResult,
};
use tracing::{debug, info, trace};

use crate::adaptors::ga::GaAdaptor;
use crate::adaptors::EventAdaptor;
use crate::broadcast::{HostCapabilities, LocalTransport};
use crate::encoder::encode_params;

/// What a single `send_event` call did. Callers are free to ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// Form-encoded hit, present whenever a tracking id is configured.
    pub hit: Option<String>,
    /// Whether the hit was handed to the beacon (false on dry runs).
    pub beacon_sent: bool,
}

/// One dispatcher per add-on instance.
pub struct Dispatcher {
    config: DispatcherConfig,
    transport: LocalTransport,
    beacon: Arc<dyn BeaconSender>,
    adaptor: Arc<dyn EventAdaptor>,
    dryrun: AtomicBool,
    debug: AtomicBool,
}

impl Dispatcher {
    /// Validate options and bind the host capabilities. No event traffic
    /// happens here; a validation failure leaves nothing behind.
    pub fn new(options: MetricsOptions, host: HostCapabilities) -> MetricsResult<Self> {
        let config = options.validate()?;
        let transport = LocalTransport::select(config.addon_type, &host)?;

        info!(
            addon_id = %config.id,
            addon_type = %config.addon_type,
            topic = %config.topic,
            transport = transport.kind(),
            remote = config.remote_enabled(),
            "metrics dispatcher ready"
        );

        Ok(Self {
            config,
            transport,
            beacon: host.beacon,
            adaptor: Arc::new(GaAdaptor::new()),
            dryrun: AtomicBool::new(options.dryrun),
            debug: AtomicBool::new(options.debug),
        })
    }

    /// Replace the collector adaptor.
    pub fn with_adaptor(mut self, adaptor: Arc<dyn EventAdaptor>) -> Self {
        self.adaptor = adaptor;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    pub fn addon_type(&self) -> AddonType {
        self.config.addon_type
    }

    pub fn transport(&self) -> &LocalTransport {
        &self.transport
    }

    pub fn dryrun(&self) -> bool {
        self.dryrun.load(Ordering::Relaxed)
    }

    pub fn set_dryrun(&self, dryrun: bool) {
        self.dryrun.store(dryrun, Ordering::Relaxed);
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Broadcast `record` locally, then forward it to the collector if a
    /// tracking id is configured.
    ///
    /// Local bus errors are returned as-is. The remote send is fire-and-forget
    /// and never fails this call.
    pub fn send_event(&self, record: &EventRecord) -> MetricsResult<Dispatched> {
        let verbose = self.debug();
        let payload = EventPayload::merge(&self.config.id, record);

        metrics::counter!("addon_metrics.events").increment(1);
        if verbose {
            info!(topic = %self.config.topic, payload = ?payload, "sending event to local listeners");
        } else {
            trace!(topic = %self.config.topic, "sending event to local listeners");
        }
        self.transport.publish(&self.config.topic, &payload)?;

        let Some(tid) = self.config.tid.as_deref() else {
            return Ok(Dispatched::default());
        };

        let params = self.adaptor.transform(&self.config, record);
        let hit = encode_params(Some(&params));

        if self.dryrun() {
            metrics::counter!("addon_metrics.hits_dry_run").increment(1);
            if verbose {
                info!(tid, hit = %hit, "dry run, collector hit not sent");
            } else {
                debug!(tid, "dry run, collector hit not sent");
            }
            return Ok(Dispatched {
                hit: Some(hit),
                beacon_sent: false,
            });
        }

        if verbose {
            info!(
                tid,
                platform = self.adaptor.platform(),
                url = %self.config.collector_url,
                hit = %hit,
                "sending collector hit"
            );
        }
        self.beacon
            .send_beacon(&self.config.collector_url, hit.clone());
        metrics::counter!("addon_metrics.hits_sent").increment(1);

        Ok(Dispatched {
            hit: Some(hit),
            beacon_sent: true,
        })
    }
}
