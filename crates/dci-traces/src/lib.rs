//! Trace ingestion: Zipkin-style JSON spans to aggregated call records.
//!
//! Reads span files exported by Zipkin or OpenTelemetry collectors, pulls the
//! calling and called service names out of each span's endpoints, and counts
//! how often each ordered pair occurs.

pub mod parser;

pub use parser::{ParsedTraces, TraceParser};
