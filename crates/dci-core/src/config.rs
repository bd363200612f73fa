use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DciError;

/// Largest number of decimals accepted for rendered scores.
const MAX_DECIMALS: usize = 12;

/// Top-level configuration loaded from `.dci.toml`.
///
/// Supports layered resolution: `--config` path > local `.dci.toml` > defaults.
///
/// # Examples
///
/// ```
/// use dci_core::DciConfig;
///
/// let config = DciConfig::default();
/// assert_eq!(config.report.decimals, 3);
/// assert_eq!(config.traces.caller_field, "localEndpoint");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DciConfig {
    /// How caller and callee names are read from spans.
    #[serde(default)]
    pub traces: TracesConfig,
    /// CSV and summary rendering.
    #[serde(default)]
    pub report: ReportConfig,
    /// GraphML layout settings.
    #[serde(default)]
    pub graphml: GraphmlConfig,
}

impl DciConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DciError::FileNotFound`] if `path` does not exist,
    /// [`DciError::Io`] if it cannot be read, [`DciError::Toml`] if the
    /// content is not valid TOML, or [`DciError::Config`] if a value is out
    /// of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dci_core::DciConfig;
    /// use std::path::Path;
    ///
    /// let config = DciConfig::from_file(Path::new(".dci.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, DciError> {
        if !path.exists() {
            return Err(DciError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DciError::Toml`] if parsing fails, or [`DciError::Config`]
    /// if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use dci_core::DciConfig;
    ///
    /// let toml = r#"
    /// [report]
    /// decimals = 4
    /// "#;
    /// let config = DciConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.report.decimals, 4);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DciError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DciError> {
        if self.traces.caller_field.is_empty() || self.traces.callee_field.is_empty() {
            return Err(DciError::Config(
                "traces.caller_field and traces.callee_field must not be empty".into(),
            ));
        }
        if self.report.decimals > MAX_DECIMALS {
            return Err(DciError::Config(format!(
                "report.decimals must be at most {MAX_DECIMALS}, got {}",
                self.report.decimals
            )));
        }
        let layout = [
            self.graphml.center_x,
            self.graphml.center_y,
            self.graphml.radius,
        ];
        if layout.iter().any(|v| !v.is_finite()) || self.graphml.radius < 0.0 {
            return Err(DciError::Config(
                "graphml layout values must be finite and radius non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Span field names used to extract caller and callee services.
///
/// # Examples
///
/// ```
/// use dci_core::TracesConfig;
///
/// let config = TracesConfig::default();
/// assert_eq!(config.callee_field, "remoteEndpoint");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracesConfig {
    /// Endpoint object holding the calling service (default: `localEndpoint`).
    #[serde(default = "default_caller_field")]
    pub caller_field: String,
    /// Endpoint object holding the called service (default: `remoteEndpoint`).
    #[serde(default = "default_callee_field")]
    pub callee_field: String,
}

fn default_caller_field() -> String {
    "localEndpoint".into()
}

fn default_callee_field() -> String {
    "remoteEndpoint".into()
}

impl Default for TracesConfig {
    fn default() -> Self {
        Self {
            caller_field: default_caller_field(),
            callee_field: default_callee_field(),
        }
    }
}

/// Report rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for scores in CSV and summaries (default: 3).
    #[serde(default = "default_decimals")]
    pub decimals: usize,
    /// Maximum services listed per summary section (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_decimals() -> usize {
    3
}

fn default_limit() -> usize {
    20
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            limit: default_limit(),
        }
    }
}

/// Initial circular layout for GraphML node positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphmlConfig {
    #[serde(default = "default_center")]
    pub center_x: f64,
    #[serde(default = "default_center")]
    pub center_y: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
}

fn default_center() -> f64 {
    200.0
}

fn default_radius() -> f64 {
    100.0
}

impl Default for GraphmlConfig {
    fn default() -> Self {
        Self {
            center_x: default_center(),
            center_y: default_center(),
            radius: default_radius(),
        }
    }
}
