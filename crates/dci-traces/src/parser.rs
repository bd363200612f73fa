use std::collections::BTreeMap;
use std::path::Path;

use dci_core::{CallRecord, DciError, TracesConfig};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Result of parsing one trace document.
///
/// # Examples
///
/// ```
/// use dci_traces::TraceParser;
///
/// let json = r#"[
///   {"localEndpoint": {"serviceName": "web"}, "remoteEndpoint": {"serviceName": "api"}},
///   {"localEndpoint": {"serviceName": "web"}, "remoteEndpoint": {"serviceName": "api"}},
///   {"localEndpoint": {"serviceName": "api"}}
/// ]"#;
/// let parsed = TraceParser::default().parse_str(json).unwrap();
/// assert_eq!(parsed.total_spans, 3);
/// assert_eq!(parsed.skipped_spans, 1);
/// assert_eq!(parsed.records.len(), 1);
/// assert_eq!(parsed.records[0].count(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTraces {
    /// One record per ordered (caller, callee) pair, sorted by caller then callee.
    pub records: Vec<CallRecord>,
    /// Spans seen in the document.
    pub total_spans: usize,
    /// Spans without a usable caller or callee service name.
    pub skipped_spans: usize,
}

impl ParsedTraces {
    /// `true` when no service-to-service call was found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all record counts.
    pub fn call_count(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.count()))
    }
}

/// Extracts caller/callee pairs from span JSON.
///
/// Accepts either a flat array of spans or an array of traces, each trace
/// being an array of spans (the shape returned by the Zipkin v2 API). The
/// caller is the span's local endpoint service, the callee its remote
/// endpoint service; both object names are configurable.
#[derive(Debug, Clone)]
pub struct TraceParser {
    caller_field: String,
    callee_field: String,
}

impl Default for TraceParser {
    fn default() -> Self {
        Self::new(&TracesConfig::default())
    }
}

impl TraceParser {
    pub fn new(config: &TracesConfig) -> Self {
        Self {
            caller_field: config.caller_field.clone(),
            callee_field: config.callee_field.clone(),
        }
    }

    /// Parse a trace file.
    ///
    /// # Errors
    ///
    /// Returns [`DciError::FileNotFound`] for a missing path,
    /// [`DciError::Io`] if it cannot be read, and the errors of
    /// [`TraceParser::parse_str`] for its content.
    pub fn parse_file(&self, path: &Path) -> Result<ParsedTraces, DciError> {
        if !path.exists() {
            return Err(DciError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = content.len(), "read trace file");
        self.parse_str(&content)
    }

    /// Parse a trace document held in memory.
    ///
    /// Self-calls are kept; spans lacking either service name are skipped
    /// and counted in [`ParsedTraces::skipped_spans`].
    ///
    /// # Errors
    ///
    /// Returns [`DciError::Serialization`] for malformed JSON and
    /// [`DciError::Parse`] when the top level is not an array.
    pub fn parse_str(&self, json: &str) -> Result<ParsedTraces, DciError> {
        let document: Value = serde_json::from_str(json)?;
        let spans = collect_spans(&document)?;

        if spans.is_empty() {
            warn!("trace document contains no spans");
            return Ok(ParsedTraces::default());
        }
        info!(spans = spans.len(), "processing spans");

        let mut pairs: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        let mut skipped_spans = 0;
        for span in &spans {
            let caller = service_name(span, &self.caller_field);
            let callee = service_name(span, &self.callee_field);
            match (caller, callee) {
                (Some(caller), Some(callee)) => {
                    *pairs.entry((caller, callee)).or_default() += 1;
                }
                _ => skipped_spans += 1,
            }
        }

        let records = pairs
            .into_iter()
            .map(|((caller, callee), count)| CallRecord::new(caller, callee, count))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            pairs = records.len(),
            skipped = skipped_spans,
            "aggregated service calls"
        );

        Ok(ParsedTraces {
            records,
            total_spans: spans.len(),
            skipped_spans,
        })
    }

    /// `true` if `path` parses as a trace document with at least one span.
    pub fn is_valid_trace_file(&self, path: &Path) -> bool {
        let Ok(content) = std::fs::read_to_string(path) else {
            return false;
        };
        let Ok(document) = serde_json::from_str::<Value>(&content) else {
            return false;
        };
        collect_spans(&document).is_ok_and(|spans| !spans.is_empty())
    }
}

/// Flatten the document into its span objects.
///
/// Non-object entries inside a trace are ignored.
fn collect_spans(document: &Value) -> Result<Vec<&Value>, DciError> {
    let Value::Array(items) = document else {
        return Err(DciError::Parse(
            "expected a JSON array of spans or an array of traces".into(),
        ));
    };

    let mut spans = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(trace) => spans.extend(trace.iter().filter(|s| s.is_object())),
            Value::Object(_) => spans.push(item),
            _ => {}
        }
    }
    Ok(spans)
}

fn service_name<'a>(span: &'a Value, endpoint: &str) -> Option<&'a str> {
    span.get(endpoint)?
        .get("serviceName")?
        .as_str()
        .filter(|name| !name.is_empty())
}
