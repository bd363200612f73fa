//! Shared vocabulary of the DCI workspace.
//!
//! A [`CallRecord`] is one observed caller -> callee interaction between two
//! [`ServiceId`]s; the graph, trace and report crates all speak in these
//! terms. Settings come from `.dci.toml` through [`DciConfig`], and every
//! fallible operation in the workspace reports a [`DciError`].

mod config;
mod error;
mod types;

pub use config::{DciConfig, GraphmlConfig, ReportConfig, TracesConfig};
pub use error::DciError;
pub use types::{CallRecord, OutputFormat, ServiceId};

/// `Result` with [`DciError`] as the error type.
pub type Result<T> = std::result::Result<T, DciError>;
