//! Relative Measurement Theory (RMT) coupling scores.
//!
//! A service's coupling is the number of distinct other services it calls,
//! divided by the number it could call (census size minus one). Call counts
//! are ignored: a callee reached once or a thousand times is one coupling.

use std::collections::BTreeMap;
use std::fmt;

use dci_core::ServiceId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::CallGraph;

/// Per-service RMT scores, ordered by service id.
pub type CouplingScores = BTreeMap<ServiceId, f64>;

/// Compute the RMT coupling score of every census member.
///
/// Pure function of the graph: compute it once per graph and hand the map
/// to every consumer. Scores lie in `[0.0, 1.0]`. A census of one service
/// scores `0.0` whatever it recorded; an empty graph yields an empty map.
///
/// # Examples
///
/// ```
/// use dci_core::CallRecord;
/// use dci_graph::{compute_coupling, CallGraph};
///
/// let graph: CallGraph = [("A", "B"), ("A", "C"), ("B", "C")]
///     .into_iter()
///     .map(|(a, b)| CallRecord::new(a, b, 1).unwrap())
///     .collect();
///
/// let scores = compute_coupling(&graph);
/// assert_eq!(scores["A"], 1.0);
/// assert_eq!(scores["B"], 0.5);
/// assert_eq!(scores["C"], 0.0);
/// ```
pub fn compute_coupling(graph: &CallGraph) -> CouplingScores {
    let scores: CouplingScores = coupling_details(graph)
        .into_iter()
        .map(|detail| (detail.service, detail.score))
        .collect();

    debug!(
        services = scores.len(),
        max_possible = max_possible_coupling(graph),
        "computed RMT coupling scores"
    );
    scores
}

/// Upper bound on any service's coupling count: census size minus one.
pub fn max_possible_coupling(graph: &CallGraph) -> usize {
    graph.total_services().saturating_sub(1)
}

/// `actual / max_possible`, or `0.0` when no coupling is possible.
///
/// # Examples
///
/// ```
/// use dci_graph::coupling::rmt_score;
///
/// assert_eq!(rmt_score(1, 4), 0.25);
/// assert_eq!(rmt_score(0, 0), 0.0);
/// ```
pub fn rmt_score(actual: usize, max_possible: usize) -> f64 {
    if max_possible == 0 {
        return 0.0;
    }
    (actual as f64 / max_possible as f64).clamp(0.0, 1.0)
}

/// Coupling breakdown for a single service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCoupling {
    pub service: ServiceId,
    /// Distinct non-self services called.
    pub actual: usize,
    /// Census size minus one.
    pub max_possible: usize,
    /// `actual / max_possible` (0.0 when nothing is possible).
    pub score: f64,
    pub level: CouplingLevel,
}

/// Full per-service breakdown, sorted by service id.
///
/// [`compute_coupling`] is this breakdown reduced to its scores.
pub fn coupling_details(graph: &CallGraph) -> Vec<ServiceCoupling> {
    let max_possible = max_possible_coupling(graph);
    graph
        .all_services()
        .into_iter()
        .map(|service| {
            let actual = graph.outgoing_calls(service.as_str()).len();
            let score = rmt_score(actual, max_possible);
            ServiceCoupling {
                service: service.clone(),
                actual,
                max_possible,
                score,
                level: CouplingLevel::classify(score),
            }
        })
        .collect()
}

const MODERATE_THRESHOLD: f64 = 0.4;
const HIGH_THRESHOLD: f64 = 0.7;

/// Four-tier classification of an RMT score.
///
/// Ordered from weakest to strongest, so levels can be compared.
///
/// # Examples
///
/// ```
/// use dci_graph::CouplingLevel;
///
/// assert_eq!(CouplingLevel::classify(0.0), CouplingLevel::None);
/// assert_eq!(CouplingLevel::classify(0.4), CouplingLevel::Moderate);
/// assert_eq!(CouplingLevel::classify(0.7).to_string(), "High Coupling");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouplingLevel {
    /// Score 0: calls no other service.
    None,
    /// Score in (0, 0.4).
    Low,
    /// Score in [0.4, 0.7).
    Moderate,
    /// Score 0.7 and above.
    High,
}

impl CouplingLevel {
    /// All levels, weakest first.
    pub const ALL: [CouplingLevel; 4] = [
        CouplingLevel::None,
        CouplingLevel::Low,
        CouplingLevel::Moderate,
        CouplingLevel::High,
    ];

    /// Map a score to its tier. Tier boundaries belong to the higher tier.
    ///
    /// This is the only place the thresholds live; reports, exports and
    /// summaries all classify through it.
    pub fn classify(score: f64) -> Self {
        if score >= HIGH_THRESHOLD {
            CouplingLevel::High
        } else if score >= MODERATE_THRESHOLD {
            CouplingLevel::Moderate
        } else if score > 0.0 {
            CouplingLevel::Low
        } else {
            CouplingLevel::None
        }
    }

    /// Human-readable label, e.g. `"Moderate Coupling"`.
    pub fn label(self) -> &'static str {
        match self {
            CouplingLevel::None => "No Coupling",
            CouplingLevel::Low => "Low Coupling",
            CouplingLevel::Moderate => "Moderate Coupling",
            CouplingLevel::High => "High Coupling",
        }
    }
}

impl fmt::Display for CouplingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
