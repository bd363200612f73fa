//! GraphML export for graph tools such as Gephi or yEd.
//!
//! Attribute keys follow Gephi's conventions so node size, colour and the
//! initial circular layout are picked up on import.

use std::borrow::Cow;
use std::f64::consts::PI;
use std::io::Write;
use std::path::Path;

use dci_core::{DciError, GraphmlConfig};
use dci_graph::{CallGraph, CouplingLevel, CouplingScores};
use tracing::debug;

const NODE_KEYS: [(&str, &str); 12] = [
    ("label", "string"),
    ("status", "string"),
    ("dci_score", "double"),
    ("size", "double"),
    ("color", "string"),
    ("r", "int"),
    ("g", "int"),
    ("b", "int"),
    ("incoming_calls", "int"),
    ("outgoing_calls", "int"),
    ("x", "double"),
    ("y", "double"),
];

const EDGE_KEYS: [(&str, &str); 2] = [("weight", "double"), ("calls", "int")];

/// Write `graph` as a GraphML document.
///
/// Every census member becomes a node, isolated services included; every
/// aggregated non-self pair becomes one directed edge. Services missing from
/// `scores` are exported with score 0.
///
/// # Errors
///
/// Returns [`DciError::Io`] if writing fails.
///
/// # Examples
///
/// ```
/// use dci_core::{CallRecord, GraphmlConfig};
/// use dci_graph::{compute_coupling, CallGraph};
/// use dci_report::graphml::write_graphml;
///
/// let mut graph = CallGraph::new();
/// graph.add_call(&CallRecord::new("web", "api", 12).unwrap());
/// let scores = compute_coupling(&graph);
///
/// let mut out = Vec::new();
/// write_graphml(&graph, &scores, &GraphmlConfig::default(), &mut out).unwrap();
/// let xml = String::from_utf8(out).unwrap();
/// assert!(xml.contains(r#"<node id="api">"#));
/// assert!(xml.contains(r#"<edge id="e0" source="web" target="api">"#));
/// ```
pub fn write_graphml<W: Write>(
    graph: &CallGraph,
    scores: &CouplingScores,
    layout: &GraphmlConfig,
    out: &mut W,
) -> Result<(), DciError> {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">"#)?;
    for (id, ty) in NODE_KEYS {
        writeln!(
            out,
            r#"  <key id="{id}" for="node" attr.name="{id}" attr.type="{ty}"/>"#
        )?;
    }
    for (id, ty) in EDGE_KEYS {
        writeln!(
            out,
            r#"  <key id="{id}" for="edge" attr.name="{id}" attr.type="{ty}"/>"#
        )?;
    }
    writeln!(out, r#"  <graph id="G" edgedefault="directed">"#)?;

    let services = graph.all_services();
    let node_total = services.len();
    for (i, service) in services.into_iter().enumerate() {
        let score = scores.get(service).copied().unwrap_or(0.0);
        let level = CouplingLevel::classify(score);
        let (color, [r, g, b]) = level_color(level);
        let (x, y) = circle_position(i, node_total, layout);
        let id = escape_xml(service.as_str());

        writeln!(out, r#"    <node id="{id}">"#)?;
        write_data(out, "label", &id)?;
        write_data(out, "status", level.label())?;
        write_data(out, "dci_score", &format!("{score:.3}"))?;
        write_data(out, "size", &format!("{:.2}", node_size(score)))?;
        write_data(out, "color", color)?;
        write_data(out, "r", &r.to_string())?;
        write_data(out, "g", &g.to_string())?;
        write_data(out, "b", &b.to_string())?;
        write_data(
            out,
            "incoming_calls",
            &graph.total_incoming_calls(service.as_str()).to_string(),
        )?;
        write_data(
            out,
            "outgoing_calls",
            &graph.total_outgoing_calls(service.as_str()).to_string(),
        )?;
        write_data(out, "x", &format!("{x:.2}"))?;
        write_data(out, "y", &format!("{y:.2}"))?;
        writeln!(out, "    </node>")?;
    }

    let mut edges: Vec<_> = graph.edges().collect();
    edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    for (n, (caller, callee, calls)) in edges.iter().enumerate() {
        writeln!(
            out,
            r#"    <edge id="e{n}" source="{}" target="{}">"#,
            escape_xml(caller.as_str()),
            escape_xml(callee.as_str())
        )?;
        write_data(out, "weight", &format!("{:.2}", edge_weight(*calls)))?;
        write_data(out, "calls", &calls.to_string())?;
        writeln!(out, "    </edge>")?;
    }

    writeln!(out, "  </graph>")?;
    writeln!(out, "</graphml>")?;

    debug!(nodes = node_total, edges = edges.len(), "rendered GraphML");
    Ok(())
}

/// [`write_graphml`] into a new file at `path`.
pub fn write_graphml_file(
    graph: &CallGraph,
    scores: &CouplingScores,
    layout: &GraphmlConfig,
    path: &Path,
) -> Result<(), DciError> {
    crate::write_to_path(path, |out| write_graphml(graph, scores, layout, out))
}

fn write_data<W: Write>(out: &mut W, key: &str, value: &str) -> Result<(), DciError> {
    writeln!(out, r#"      <data key="{key}">{value}</data>"#)?;
    Ok(())
}

/// Node size from 10 (uncoupled) to 50 (fully coupled).
fn node_size(score: f64) -> f64 {
    10.0 + score * 40.0
}

/// Call count scaled to a visible edge thickness in `[0.1, 5.0]`.
fn edge_weight(calls: u64) -> f64 {
    (calls as f64 / 10.0).clamp(0.1, 5.0)
}

fn level_color(level: CouplingLevel) -> (&'static str, [u8; 3]) {
    match level {
        CouplingLevel::High => ("#ff0000", [255, 0, 0]),
        CouplingLevel::Moderate => ("#ff8800", [255, 136, 0]),
        CouplingLevel::Low => ("#ffff00", [255, 255, 0]),
        CouplingLevel::None => ("#888888", [136, 136, 136]),
    }
}

fn circle_position(index: usize, total: usize, layout: &GraphmlConfig) -> (f64, f64) {
    let angle = 2.0 * PI * index as f64 / total.max(1) as f64;
    (
        layout.center_x + layout.radius * angle.cos(),
        layout.center_y + layout.radius * angle.sin(),
    )
}

fn escape_xml(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
