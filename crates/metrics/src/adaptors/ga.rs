//! Google Analytics Measurement Protocol (v1) adaptor: maps add-on events
//! onto event hits for the `/collect` endpoint.

use addon_core::{AnalyticsParams, DispatcherConfig, EventRecord};
use tracing::trace;

use super::EventAdaptor;

pub const PROTOCOL_VERSION: &str = "1";
pub const HIT_TYPE_EVENT: &str = "event";

/// Universal Analytics adaptor.
///
/// Parameter order is fixed: `v`, `tid`, `cid`, `t`, `ec`, `ea`, `el`, `ev`,
/// `an`, `av`. Optional fields the record or config lacks are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaAdaptor;

impl GaAdaptor {
    pub fn new() -> Self {
        Self
    }
}

impl EventAdaptor for GaAdaptor {
    fn platform(&self) -> &str {
        "ua"
    }

    fn transform(&self, config: &DispatcherConfig, record: &EventRecord) -> AnalyticsParams {
        let mut params = AnalyticsParams::new();

        params.push("v", PROTOCOL_VERSION);
        params.push_opt("tid", config.tid.clone());
        params.push("cid", config.uid.clone());
        params.push("t", HIT_TYPE_EVENT);

        // Event category/action/label/value
        params.push_opt("ec", record.text("object"));
        params.push_opt("ea", record.text("method"));
        params.push_opt("el", record.text("label"));
        params.push_opt("ev", record.text("value"));

        // Application name/version
        params.push("an", config.id.clone());
        params.push_opt("av", config.version.clone().filter(|v| !v.is_empty()));

        trace!(
            addon_id = %config.id,
            param_count = params.len(),
            "measurement protocol params built"
        );

        params
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use addon_core::MetricsOptions;

    fn test_config() -> DispatcherConfig {
        MetricsOptions::new("@my-addon", "12345")
            .with_version("1.0.2")
            .with_tid("UA-49796218-47")
            .validate()
            .unwrap()
    }

    #[test]
    fn test_click_transform() {
        let params = GaAdaptor.transform(&test_config(), &EventRecord::action("button", "click"));

        assert_eq!(params.keys(), vec!["v", "tid", "cid", "t", "ec", "ea", "an", "av"]);
        assert_eq!(params.get("v"), Some("1"));
        assert_eq!(params.get("tid"), Some("UA-49796218-47"));
        assert_eq!(params.get("cid"), Some("12345"));
        assert_eq!(params.get("t"), Some("event"));
        assert_eq!(params.get("ec"), Some("button"));
        assert_eq!(params.get("ea"), Some("click"));
        assert_eq!(params.get("an"), Some("@my-addon"));
        assert_eq!(params.get("av"), Some("1.0.2"));
    }

    #[test]
    fn test_label_and_value() {
        let record = EventRecord::action("menu", "open")
            .with("label", "toolbar")
            .with("value", 4)
            .with("unrelated", "ignored");
        let params = GaAdaptor.transform(&test_config(), &record);

        assert_eq!(params.get("el"), Some("toolbar"));
        assert_eq!(params.get("ev"), Some("4"));
        assert_eq!(params.get("unrelated"), None);
        assert_eq!(
            params.keys(),
            vec!["v", "tid", "cid", "t", "ec", "ea", "el", "ev", "an", "av"]
        );
    }

    #[test]
    fn test_missing_fields_are_omitted() {
        let config = MetricsOptions::new("@my-addon", 42u64)
            .with_tid("UA-1")
            .validate()
            .unwrap();
        let params = GaAdaptor.transform(&config, &EventRecord::new());

        assert_eq!(params.keys(), vec!["v", "tid", "cid", "t", "an"]);
        assert_eq!(params.get("cid"), Some("42"));
    }

    #[test]
    fn test_empty_version_is_omitted() {
        let mut config = test_config();
        config.version = Some(String::new());
        let params = GaAdaptor.transform(&config, &EventRecord::action("button", "click"));
        assert_eq!(params.get("av"), None);
    }

    #[test]
    fn test_record_is_not_mutated() {
        let record = EventRecord::action("button", "click");
        let before = record.clone();
        let _ = GaAdaptor.transform(&test_config(), &record);
        assert_eq!(record, before);
    }
}
