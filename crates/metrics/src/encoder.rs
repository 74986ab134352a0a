//! Form encoder for collector hits.
//!
//! Standard `application/x-www-form-urlencoded` value escaping with one
//! deviation: spaces become `%20` rather than `+`, which is what the
//! measurement protocol documents. Keys are protocol-defined and written as-is.
//!
//! Only alphanumerics and `*-._` stay literal. `~ ! ' ( )` are percent-encoded
//! as well; the collector decodes either form to the same value.

use addon_core::AnalyticsParams;
use url::form_urlencoded::byte_serialize;

/// Encode `key=value` pairs joined by `&`, in iteration order.
pub fn form_encode<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), encode_value(value.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode a parameter set. An absent set encodes to the empty string.
pub fn encode_params(params: Option<&AnalyticsParams>) -> String {
    match params {
        Some(params) if !params.is_empty() => form_encode(params.iter()),
        _ => String::new(),
    }
}

// A literal '+' is already escaped to %2B, so every '+' left is a space.
fn encode_value(value: &str) -> String {
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
