//! Reports and graph exports for coupling results.
//!
//! Every writer here takes a [`dci_graph::CallGraph`] and/or the score map
//! computed once by [`dci_graph::compute_coupling`], and labels services
//! through [`dci_graph::CouplingLevel::classify`]. Formats:
//! - [`csv`]: `Service,DCI,Status` rows
//! - [`graphml`]: GraphML for Gephi and yEd, one node per census member
//! - [`dot`]: Graphviz digraph
//! - [`summary`]: distribution statistics in text, Markdown or JSON

pub mod csv;
pub mod dot;
pub mod graphml;
pub mod summary;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use dci_core::DciError;

/// Create `path` and hand a buffered writer to `write`, flushing at the end.
pub(crate) fn write_to_path<F>(path: &Path, write: F) -> Result<(), DciError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), DciError>,
{
    let mut out = BufWriter::new(File::create(path)?);
    write(&mut out)?;
    out.flush()?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}
