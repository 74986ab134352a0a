use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::MetricsError;

/// Packaging flavor of the host add-on. Decides which local bus carries events.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AddonType {
    #[default]
    WebExtension,
    Sdk,
    Bootstrapped,
}

impl AddonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebExtension => "webextension",
            Self::Sdk => "sdk",
            Self::Bootstrapped => "bootstrapped",
        }
    }

    /// Sdk and bootstrapped add-ons both talk to an observer-notification bus.
    pub fn uses_observer_bus(&self) -> bool {
        matches!(self, Self::Sdk | Self::Bootstrapped)
    }
}

impl fmt::Display for AddonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddonType {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webextension" => Ok(Self::WebExtension),
            "sdk" => Ok(Self::Sdk),
            "bootstrapped" => Ok(Self::Bootstrapped),
            other => Err(MetricsError::config(format!(
                "unknown add-on type '{other}', expected one of: webextension, sdk, bootstrapped"
            ))),
        }
    }
}

/// Non-PII user identifier. Hosts hand it over either as text or as a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Uid {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u64> for Uid {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// A single telemetry event as handed over by application code.
///
/// Keys are free-form; the analytics transform only looks at `object`,
/// `method`, `label` and `value`. Everything else rides along to local
/// listeners untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EventRecord(Map<String, Value>);

impl EventRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the common object/method pair.
    pub fn action(object: impl Into<String>, method: impl Into<String>) -> Self {
        Self::new().with("object", object.into()).with("method", method.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Scalar field rendered as text. Null and missing keys both yield `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for EventRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// What local listeners receive: the event record stamped with the add-on id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EventPayload(Map<String, Value>);

impl EventPayload {
    /// Copies `record` and sets `id`. The add-on id wins over an `id` key in
    /// the record.
    pub fn merge(addon_id: &str, record: &EventRecord) -> Self {
        let mut map = record.as_map().clone();
        map.insert("id".to_string(), Value::String(addon_id.to_string()));
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

/// Flat measurement-protocol parameters, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsParams {
    pairs: Vec<(String, String)>,
}

impl AnalyticsParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn push_opt(&mut self, key: impl Into<String>, value: Option<String>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_addon_type_parse() {
        assert_eq!("webextension".parse::<AddonType>().unwrap(), AddonType::WebExtension);
        assert_eq!("sdk".parse::<AddonType>().unwrap(), AddonType::Sdk);
        assert_eq!("bootstrapped".parse::<AddonType>().unwrap(), AddonType::Bootstrapped);

        let err = "foo".parse::<AddonType>().unwrap_err();
        assert!(err.is_config());
        assert!("WebExtension".parse::<AddonType>().is_err());
    }

    #[test]
    fn test_uid_accepts_text_and_number() {
        let text: Uid = serde_json::from_str("\"12345\"").unwrap();
        let number: Uid = serde_json::from_str("123").unwrap();
        assert_eq!(text.to_string(), "12345");
        assert_eq!(number.to_string(), "123");
    }

    #[test]
    fn test_record_text_rendering() {
        let record = EventRecord::action("button", "click")
            .with("value", 3)
            .with("flag", true)
            .with("nothing", Value::Null);

        assert_eq!(record.text("object").as_deref(), Some("button"));
        assert_eq!(record.text("value").as_deref(), Some("3"));
        assert_eq!(record.text("flag").as_deref(), Some("true"));
        assert_eq!(record.text("nothing"), None);
        assert_eq!(record.text("missing"), None);
    }

    #[test]
    fn test_payload_merge_stamps_id() {
        let record = EventRecord::action("button", "click").with("id", "spoofed");
        let payload = EventPayload::merge("@my-addon", &record);

        assert_eq!(payload.get("id").unwrap(), "@my-addon");
        assert_eq!(payload.get("object").unwrap(), "button");
        assert_eq!(payload.as_map().len(), 3);
        // the caller's record is left alone
        assert_eq!(record.get("id").unwrap(), "spoofed");
    }

    #[test]
    fn test_params_keep_insertion_order() {
        let mut params = AnalyticsParams::new();
        params.push("v", "1");
        params.push("tid", "UA-1");
        params.push_opt("el", None);
        params.push_opt("ev", Some("7".into()));

        assert_eq!(params.keys(), vec!["v", "tid", "ev"]);
        assert_eq!(params.get("ev"), Some("7"));
        assert_eq!(params.get("el"), None);
    }
}
