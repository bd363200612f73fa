//! Graphviz DOT export.

use std::io::Write;
use std::path::Path;

use dci_core::DciError;
use dci_graph::{CallGraph, CouplingLevel, CouplingScores};
use petgraph::visit::EdgeRef;

/// Write `graph` as a Graphviz `digraph`.
///
/// Nodes are labelled `id\nscore` and filled by coupling level; edges carry
/// their aggregated call count.
///
/// # Examples
///
/// ```
/// use dci_core::CallRecord;
/// use dci_graph::{compute_coupling, CallGraph};
/// use dci_report::dot::write_dot;
///
/// let mut graph = CallGraph::new();
/// graph.add_call(&CallRecord::new("web", "api", 3).unwrap());
/// let scores = compute_coupling(&graph);
///
/// let mut out = Vec::new();
/// write_dot(&graph, &scores, &mut out).unwrap();
/// let dot = String::from_utf8(out).unwrap();
/// assert!(dot.starts_with("digraph dci {"));
/// assert!(dot.contains(r#""web" -> "api" [label="3"];"#));
/// ```
pub fn write_dot<W: Write>(
    graph: &CallGraph,
    scores: &CouplingScores,
    out: &mut W,
) -> Result<(), DciError> {
    let digraph = graph.to_digraph();

    writeln!(out, "digraph dci {{")?;
    writeln!(out, "    rankdir=LR;")?;
    writeln!(out, "    node [shape=box, style=filled];")?;

    for index in digraph.node_indices() {
        let service = &digraph[index];
        let score = scores.get(service).copied().unwrap_or(0.0);
        writeln!(
            out,
            r#"    "{}" [label="{}\n{:.3}", fillcolor="{}"];"#,
            escape_id(service.as_str()),
            escape_id(service.as_str()),
            score,
            fill_color(CouplingLevel::classify(score))
        )?;
    }

    for edge in digraph.edge_references() {
        writeln!(
            out,
            r#"    "{}" -> "{}" [label="{}"];"#,
            escape_id(digraph[edge.source()].as_str()),
            escape_id(digraph[edge.target()].as_str()),
            edge.weight()
        )?;
    }

    writeln!(out, "}}")?;
    Ok(())
}

/// [`write_dot`] into a new file at `path`.
pub fn write_dot_file(
    graph: &CallGraph,
    scores: &CouplingScores,
    path: &Path,
) -> Result<(), DciError> {
    crate::write_to_path(path, |out| write_dot(graph, scores, out))
}

fn fill_color(level: CouplingLevel) -> &'static str {
    match level {
        CouplingLevel::High => "#ff9999",
        CouplingLevel::Moderate => "#ffcc88",
        CouplingLevel::Low => "#ffff99",
        CouplingLevel::None => "#dddddd",
    }
}

fn escape_id(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
