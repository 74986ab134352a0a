//! addon-metrics-cli: send a single telemetry event the way an add-on would.
//!
//! Options come from `ADDON_METRICS__*` environment variables, overridden by
//! flags. The event is re-broadcast on an in-process channel (and printed by a
//! local listener) and, with a tracking id, encoded as a collector hit. Hits are
//! only sent over the network with `--send`.

use std::sync::Arc;
use std::time::Duration;

use addon_core::config::MetricsOptions;
use addon_core::EventRecord;
use addon_metrics::{Dispatcher, HostCapabilities, HttpBeacon, TokioChannel};
use clap::Parser;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "addon-metrics-cli")]
#[command(about = "Dispatch an add-on telemetry event locally and to the analytics collector")]
#[command(version)]
struct Cli {
    /// Add-on id (overrides config)
    #[arg(long, env = "ADDON_METRICS__ID")]
    id: Option<String>,

    /// Non-PII user id (overrides config; random when unset)
    #[arg(long, env = "ADDON_METRICS__UID")]
    uid: Option<String>,

    /// Add-on version
    #[arg(long = "addon-version")]
    addon_version: Option<String>,

    /// Add-on type: webextension, sdk, bootstrapped
    #[arg(long = "type")]
    addon_type: Option<String>,

    /// Analytics tracking id, e.g. UA-XXXXXXXX-YY
    #[arg(long, env = "ADDON_METRICS__TID")]
    tid: Option<String>,

    /// Event object (collector event category)
    #[arg(long, default_value = "cli-button")]
    object: String,

    /// Event method (collector event action)
    #[arg(long, default_value = "click")]
    method: String,

    /// Optional event label
    #[arg(long)]
    label: Option<String>,

    /// Actually send the hit to the collector (dry run otherwise)
    #[arg(long, default_value_t = false)]
    send: bool,

    /// Verbose dispatcher diagnostics
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Emit JSON logs
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "addon_metrics=info,addon_metrics_cli=info".into());
    if cli.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut options = MetricsOptions::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load options from environment, using flags only");
        MetricsOptions::default()
    });

    // Apply CLI overrides
    if let Some(id) = cli.id {
        options.id = Some(id);
    }
    if let Some(uid) = cli.uid {
        options.uid = Some(uid.into());
    }
    if options.uid.is_none() {
        options.uid = Some(Uuid::new_v4().to_string().into());
    }
    if let Some(version) = cli.addon_version {
        options.version = Some(version);
    }
    if let Some(addon_type) = cli.addon_type {
        options.addon_type = Some(addon_type);
    }
    if let Some(tid) = cli.tid {
        options.tid = Some(tid);
    }
    options.dryrun = !cli.send;
    options.debug |= cli.debug;

    let channel = Arc::new(TokioChannel::default());
    let beacon = Arc::new(HttpBeacon::with_timeout(Duration::from_secs(5))?);
    let host = HostCapabilities::new()
        .with_channel(channel.clone())
        .with_observers(Arc::new(StdoutObservers))
        .with_beacon(beacon.clone());

    let dispatcher = Dispatcher::new(options, host)?;
    let mut listener = channel.subscribe(dispatcher.topic());

    let mut record = EventRecord::action(cli.object, cli.method);
    if let Some(label) = cli.label {
        record = record.with("label", label);
    }

    let outcome = dispatcher.send_event(&record)?;

    if let Ok(payload) = listener.try_recv() {
        println!("local  {} {}", dispatcher.topic(), serde_json::to_string(&payload)?);
    }
    match outcome.hit {
        Some(hit) if outcome.beacon_sent => println!("sent   {hit}"),
        Some(hit) => println!("dryrun {hit}"),
        None => info!("no tracking id configured, collector hit skipped"),
    }

    beacon.drain().await;
    Ok(())
}

/// Observer bus stand-in for sdk/bootstrapped runs: prints notifications.
struct StdoutObservers;

impl addon_core::event_bus::ObserverBus for StdoutObservers {
    fn notify(&self, topic: &str, data: &str) -> anyhow::Result<()> {
        println!("notify {topic} {data}");
        Ok(())
    }
}
