use serde::Deserialize;

use crate::error::{MetricsError, MetricsResult};
use crate::types::{AddonType, Uid};

/// Add-on id of the flagship product. Its events go to the product-wide topic.
pub const FLAGSHIP_ADDON_ID: &str = "@testpilot-addon";
pub const FLAGSHIP_TOPIC: &str = "testpilot";
pub const SDK_TOPIC: &str = "testpilottest";
pub const DEFAULT_TOPIC: &str = "testpilot-telemetry";

pub const DEFAULT_COLLECTOR_URL: &str = "https://ssl.google-analytics.com/collect";

/// Raw dispatcher options as supplied by the host. Loaded from environment
/// variables with the prefix `ADDON_METRICS__`, or built in code.
///
/// Every field may be absent here; [`MetricsOptions::validate`] enforces the
/// required ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsOptions {
    pub id: Option<String>,
    pub uid: Option<Uid>,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub addon_type: Option<String>,
    pub tid: Option<String>,
    pub dryrun: bool,
    pub debug: bool,
    pub collector_url: Option<String>,
}

/// Validated, immutable dispatcher configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    pub id: String,
    pub uid: String,
    pub version: Option<String>,
    pub addon_type: AddonType,
    pub tid: Option<String>,
    pub collector_url: String,
    pub topic: String,
}

impl MetricsOptions {
    pub fn new(id: impl Into<String>, uid: impl Into<Uid>) -> Self {
        Self {
            id: Some(id.into()),
            uid: Some(uid.into()),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, addon_type: impl Into<String>) -> Self {
        self.addon_type = Some(addon_type.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_tid(mut self, tid: impl Into<String>) -> Self {
        self.tid = Some(tid.into());
        self
    }

    pub fn with_dryrun(mut self, dryrun: bool) -> Self {
        self.dryrun = dryrun;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_collector_url(mut self, url: impl Into<String>) -> Self {
        self.collector_url = Some(url.into());
        self
    }

    /// Check required fields and resolve defaults. Runtime flags (`dryrun`,
    /// `debug`) are not part of the frozen config.
    pub fn validate(&self) -> MetricsResult<DispatcherConfig> {
        let id = self
            .id
            .clone()
            .ok_or_else(|| MetricsError::config("missing required option 'id' (add-on id)"))?;
        let uid = self
            .uid
            .as_ref()
            .map(Uid::to_string)
            .ok_or_else(|| MetricsError::config("missing required option 'uid' (non-PII user id)"))?;

        let addon_type = match self.addon_type.as_deref() {
            Some(raw) => raw.parse::<AddonType>()?,
            None => AddonType::default(),
        };

        let topic = resolve_topic(&id, addon_type).to_string();

        Ok(DispatcherConfig {
            id,
            uid,
            version: self.version.clone(),
            addon_type,
            tid: self.tid.clone(),
            collector_url: self
                .collector_url
                .clone()
                .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_string()),
            topic,
        })
    }

    /// Load options from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            // Values stay strings: ids such as "00123" or "1.10" must not be
            // reparsed as numbers. Booleans are still coerced on deserialize.
            config::Environment::with_prefix("ADDON_METRICS").separator("__"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

impl DispatcherConfig {
    pub fn remote_enabled(&self) -> bool {
        self.tid.is_some()
    }
}

/// Flagship id takes precedence over the sdk type.
pub fn resolve_topic(id: &str, addon_type: AddonType) -> &'static str {
    if id == FLAGSHIP_ADDON_ID {
        FLAGSHIP_TOPIC
    } else if addon_type == AddonType::Sdk {
        SDK_TOPIC
    } else {
        DEFAULT_TOPIC
    }
}
