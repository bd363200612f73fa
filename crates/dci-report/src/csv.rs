use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use dci_core::DciError;
use dci_graph::{CouplingLevel, CouplingScores};

/// Column header of the score report.
pub const HEADER: &str = "Service,DCI,Status";

/// Write one `service,score,label` row per service, ordered by service id.
///
/// Scores are rounded to `decimals` places; labels come from
/// [`CouplingLevel::classify`].
///
/// # Errors
///
/// Returns [`DciError::Io`] if writing fails.
///
/// # Examples
///
/// ```
/// use dci_core::ServiceId;
/// use dci_graph::CouplingScores;
/// use dci_report::csv::write_scores;
///
/// let mut scores = CouplingScores::new();
/// scores.insert(ServiceId::from("api"), 2.0 / 3.0);
/// scores.insert(ServiceId::from("db"), 0.0);
///
/// let mut out = Vec::new();
/// write_scores(&scores, 3, &mut out).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "Service,DCI,Status\napi,0.667,Moderate Coupling\ndb,0.000,No Coupling\n"
/// );
/// ```
pub fn write_scores<W: Write>(
    scores: &CouplingScores,
    decimals: usize,
    out: &mut W,
) -> Result<(), DciError> {
    writeln!(out, "{HEADER}")?;
    for (service, score) in scores {
        let level = CouplingLevel::classify(*score);
        writeln!(
            out,
            "{},{:.*},{}",
            escape_field(service.as_str()),
            decimals,
            score,
            level
        )?;
    }
    Ok(())
}

/// [`write_scores`] into a new file at `path`.
pub fn write_scores_file(
    scores: &CouplingScores,
    decimals: usize,
    path: &Path,
) -> Result<(), DciError> {
    crate::write_to_path(path, |out| write_scores(scores, decimals, out))
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
