use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DciError;

/// Opaque, case-sensitive identifier of a service.
///
/// Borrows as `str`, so maps keyed by `ServiceId` can be queried with a
/// plain `&str`.
///
/// # Examples
///
/// ```
/// use dci_core::ServiceId;
///
/// let id = ServiceId::from("checkout");
/// assert_eq!(id.as_str(), "checkout");
/// assert_ne!(id, ServiceId::from("Checkout"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One aggregated caller → callee relationship observed in traces.
///
/// Immutable once built. `count` is how many times the call was seen; it is
/// carried through to reports and exports but never affects coupling scores.
///
/// # Examples
///
/// ```
/// use dci_core::CallRecord;
///
/// let record = CallRecord::new("frontend", "cart", 12).unwrap();
/// assert_eq!(record.caller().as_str(), "frontend");
/// assert_eq!(record.count(), 12);
/// assert!(!record.is_self_call());
///
/// assert!(CallRecord::new("", "cart", 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    caller: ServiceId,
    callee: ServiceId,
    count: u64,
}

impl CallRecord {
    /// Build a record, rejecting empty service identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`DciError::InvalidRecord`] if `caller` or `callee` is empty.
    pub fn new(
        caller: impl Into<ServiceId>,
        callee: impl Into<ServiceId>,
        count: u64,
    ) -> Result<Self, DciError> {
        let caller = caller.into();
        let callee = callee.into();
        if caller.as_str().is_empty() {
            return Err(DciError::InvalidRecord(format!(
                "empty caller (callee: {callee})"
            )));
        }
        if callee.as_str().is_empty() {
            return Err(DciError::InvalidRecord(format!(
                "empty callee (caller: {caller})"
            )));
        }
        Ok(Self {
            caller,
            callee,
            count,
        })
    }

    pub fn caller(&self) -> &ServiceId {
        &self.caller
    }

    pub fn callee(&self) -> &ServiceId {
        &self.callee
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `true` when a service calls itself.
    pub fn is_self_call(&self) -> bool {
        self.caller == self.callee
    }
}

/// How `dci analyze` prints its summary. Parsing is case-insensitive and
/// accepts `md` for Markdown.
///
/// # Examples
///
/// ```
/// use dci_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    /// camelCase keys.
    Json,
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ("text", OutputFormat::Text),
            ("json", OutputFormat::Json),
            ("markdown", OutputFormat::Markdown),
            ("md", OutputFormat::Markdown),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s))
        .map(|(_, format)| format)
        .ok_or_else(|| format!("unknown output format `{s}` (expected text, json or markdown)"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_display_and_default() {
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn service_id_lookup_by_str() {
        let mut map: HashMap<ServiceId, u32> = HashMap::new();
        map.insert(ServiceId::from("orders"), 3);
        assert_eq!(map.get("orders"), Some(&3));
        assert_eq!(map.get("Orders"), None);
    }

    #[test]
    fn service_id_serializes_as_plain_string() {
        let id = ServiceId::from("payments");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"payments\"");
    }

    #[test]
    fn record_rejects_empty_ids() {
        assert!(matches!(
            CallRecord::new("a", "", 1),
            Err(DciError::InvalidRecord(_))
        ));
        assert!(matches!(
            CallRecord::new("", "b", 1),
            Err(DciError::InvalidRecord(_))
        ));
    }

    #[test]
    fn record_allows_zero_count_and_self_calls() {
        let record = CallRecord::new("a", "a", 0).unwrap();
        assert!(record.is_self_call());
        assert_eq!(record.count(), 0);
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = CallRecord::new("a", "b", 2).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["caller"], "a");
        assert_eq!(json["callee"], "b");
        assert_eq!(json["count"], 2);
    }
}
