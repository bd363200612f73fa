//! Distribution summary of a coupling run.

use std::collections::BTreeMap;
use std::fmt;

use dci_core::ServiceId;
use dci_graph::{CallGraph, CouplingLevel, CouplingScores};
use serde::Serialize;

const DEFAULT_LIMIT: usize = 20;
const DEFAULT_DECIMALS: usize = 3;

/// Min, max, mean and population standard deviation of the scores.
///
/// All zero when there are no services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl ScoreStats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// A service with its score, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedService {
    pub service: ServiceId,
    pub score: f64,
    pub level: CouplingLevel,
}

/// Aggregate view of a coupling run, rendered after `dci analyze`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplingSummary {
    pub services_analyzed: usize,
    pub active_services: usize,
    pub isolated_services: usize,
    pub edges: usize,
    pub total_calls: u64,
    pub stats: ScoreStats,
    /// Count per level; every level is present, even at zero.
    pub levels: BTreeMap<CouplingLevel, usize>,
    /// Services sorted by descending score, ties by id.
    pub ranking: Vec<RankedService>,
    pub high_coupling: Vec<RankedService>,
    pub isolated: Vec<ServiceId>,
    #[serde(skip)]
    limit: usize,
    #[serde(skip)]
    decimals: usize,
}

impl CouplingSummary {
    /// Summarize `scores` computed over `graph`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dci_core::CallRecord;
    /// use dci_graph::{compute_coupling, CallGraph, CouplingLevel};
    /// use dci_report::summary::CouplingSummary;
    ///
    /// let graph: CallGraph = [("A", "B", 1), ("A", "C", 1), ("B", "C", 1)]
    ///     .into_iter()
    ///     .map(|(a, b, n)| CallRecord::new(a, b, n).unwrap())
    ///     .collect();
    /// let summary = CouplingSummary::from_scores(&graph, &compute_coupling(&graph));
    ///
    /// assert_eq!(summary.services_analyzed, 3);
    /// assert_eq!(summary.levels[&CouplingLevel::High], 1);
    /// assert_eq!(summary.stats.mean, 0.5);
    /// ```
    pub fn from_scores(graph: &CallGraph, scores: &CouplingScores) -> Self {
        let values: Vec<f64> = scores.values().copied().collect();

        let mut levels: BTreeMap<CouplingLevel, usize> =
            CouplingLevel::ALL.iter().map(|level| (*level, 0)).collect();
        let mut ranking: Vec<RankedService> = scores
            .iter()
            .map(|(service, score)| {
                let level = CouplingLevel::classify(*score);
                *levels.entry(level).or_insert(0) += 1;
                RankedService {
                    service: service.clone(),
                    score: *score,
                    level,
                }
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.service.cmp(&b.service))
        });

        let high_coupling = ranking
            .iter()
            .filter(|r| r.level == CouplingLevel::High)
            .cloned()
            .collect();

        Self {
            services_analyzed: scores.len(),
            active_services: graph.active_services_count(),
            isolated_services: graph.isolated_services_count(),
            edges: graph.edge_count(),
            total_calls: graph.edges().fold(0u64, |acc, (_, _, n)| acc.saturating_add(n)),
            stats: ScoreStats::from_values(&values),
            levels,
            ranking,
            high_coupling,
            isolated: graph.isolated_services().into_iter().cloned().collect(),
            limit: DEFAULT_LIMIT,
            decimals: DEFAULT_DECIMALS,
        }
    }

    /// Cap the number of rows shown per list when rendering as text or
    /// Markdown. JSON output always carries the full lists.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Decimal places of scores in text and Markdown. JSON keeps full
    /// precision.
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Rows of a list of `total` entries that the limit leaves out.
    fn hidden(&self, total: usize) -> Option<usize> {
        total.checked_sub(self.limit).filter(|n| *n > 0)
    }

    /// Render the summary as a markdown string.
    ///
    /// # Examples
    ///
    /// ```
    /// use dci_graph::{CallGraph, CouplingScores};
    /// use dci_report::summary::CouplingSummary;
    ///
    /// let summary = CouplingSummary::from_scores(&CallGraph::new(), &CouplingScores::new());
    /// assert!(summary.to_markdown().contains("# Coupling Summary"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Coupling Summary\n\n");
        out.push_str(&format!(
            "**Services:** {} analyzed, {} active, {} isolated\n\n",
            self.services_analyzed, self.active_services, self.isolated_services
        ));
        out.push_str(&format!(
            "**Calls:** {} across {} edges\n\n",
            self.total_calls, self.edges
        ));
        let d = self.decimals;
        out.push_str(&format!(
            "**Scores:** min {:.*}, max {:.*}, mean {:.*}, std {:.*}\n\n",
            d, self.stats.min, d, self.stats.max, d, self.stats.mean, d, self.stats.std_dev
        ));

        out.push_str("| Level | Services |\n");
        out.push_str("|-------|----------|\n");
        for (level, count) in self.levels.iter().rev() {
            out.push_str(&format!("| {level} | {count} |\n"));
        }
        out.push('\n');

        if !self.ranking.is_empty() {
            out.push_str("| Service | DCI | Status |\n");
            out.push_str("|---------|-----|--------|\n");
            for r in self.ranking.iter().take(self.limit) {
                out.push_str(&format!(
                    "| `{}` | {:.*} | {} |\n",
                    r.service, d, r.score, r.level
                ));
            }
            if let Some(more) = self.hidden(self.ranking.len()) {
                out.push_str(&format!("\n_{more} more not shown._\n"));
            }
            out.push('\n');
        }

        if !self.isolated.is_empty() {
            out.push_str(&format!("## Isolated Services ({})\n\n", self.isolated.len()));
            for service in self.isolated.iter().take(self.limit) {
                out.push_str(&format!("- `{service}`\n"));
            }
            if let Some(more) = self.hidden(self.isolated.len()) {
                out.push_str(&format!("\n_{more} more not shown._\n"));
            }
        }
        out
    }
}

impl fmt::Display for CouplingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Coupling Summary")?;
        writeln!(f, "================")?;
        writeln!(
            f,
            "Services analyzed: {} ({} active, {} isolated)",
            self.services_analyzed, self.active_services, self.isolated_services
        )?;
        writeln!(f, "Calls: {} across {} edges\n", self.total_calls, self.edges)?;

        writeln!(f, "Status distribution:")?;
        for (level, count) in self.levels.iter().rev() {
            writeln!(f, "  {:<18} {:>5}", level.label(), count)?;
        }

        let d = self.decimals;
        writeln!(f, "\nScore statistics:")?;
        writeln!(f, "  Min:  {:.*}", d, self.stats.min)?;
        writeln!(f, "  Max:  {:.*}", d, self.stats.max)?;
        writeln!(f, "  Mean: {:.*}", d, self.stats.mean)?;
        writeln!(f, "  Std:  {:.*}", d, self.stats.std_dev)?;

        if !self.high_coupling.is_empty() {
            writeln!(f, "\nHigh coupling services ({}):", self.high_coupling.len())?;
            for r in self.high_coupling.iter().take(self.limit) {
                writeln!(f, "  {:<40} {:.*}", r.service.as_str(), d, r.score)?;
            }
            if let Some(more) = self.hidden(self.high_coupling.len()) {
                writeln!(f, "  ... {more} more")?;
            }
        }

        if !self.isolated.is_empty() {
            writeln!(f, "\nIsolated services ({}):", self.isolated.len())?;
            for service in self.isolated.iter().take(self.limit) {
                writeln!(f, "  {service}")?;
            }
            if let Some(more) = self.hidden(self.isolated.len()) {
                writeln!(f, "  ... {more} more")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dci_core::CallRecord;
    use dci_graph::compute_coupling;

    use super::*;

    fn summarize(records: &[(&str, &str, u64)]) -> CouplingSummary {
        let graph: CallGraph = records
            .iter()
            .map(|(a, b, n)| CallRecord::new(*a, *b, *n).unwrap())
            .collect();
        CouplingSummary::from_scores(&graph, &compute_coupling(&graph))
    }

    #[test]
    fn empty_run() {
        let summary = summarize(&[]);
        assert_eq!(summary.services_analyzed, 0);
        assert_eq!(summary.stats, ScoreStats::default());
        assert_eq!(summary.levels.len(), 4);
        assert!(summary.levels.values().all(|n| *n == 0));
        assert!(summary.to_string().contains("Services analyzed: 0"));
    }

    #[test]
    fn statistics_of_worked_example() {
        let summary = summarize(&[("A", "B", 1), ("A", "C", 1), ("B", "C", 1)]);
        assert_eq!(summary.stats.min, 0.0);
        assert_eq!(summary.stats.max, 1.0);
        assert_eq!(summary.stats.mean, 0.5);
        // population variance of {1, 0.5, 0} is 1/6
        assert!((summary.stats.std_dev - (1.0f64 / 6.0).sqrt()).abs() < 1e-12);
        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.edges, 3);
    }

    #[test]
    fn ranking_and_lists() {
        let summary = summarize(&[("A", "B", 1), ("B", "C", 1), ("A", "D", 1)]);
        let order: Vec<&str> = summary.ranking.iter().map(|r| r.service.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C", "D"]);
        assert!(summary.high_coupling.is_empty());
        assert_eq!(
            summary.isolated,
            vec![ServiceId::from("C"), ServiceId::from("D")]
        );
        assert_eq!(summary.levels[&CouplingLevel::Moderate], 1);
        assert_eq!(summary.levels[&CouplingLevel::Low], 1);
        assert_eq!(summary.levels[&CouplingLevel::None], 2);
    }

    #[test]
    fn text_lists_high_coupling() {
        let text = summarize(&[("A", "B", 1), ("A", "C", 1), ("B", "C", 1)]).to_string();
        assert!(text.contains("High coupling services (1):"));
        assert!(text.contains("Isolated services (1):"));
        assert!(text.contains("  Mean: 0.500"));
    }

    #[test]
    fn limit_truncates_rendering_only() {
        let records: Vec<(String, String)> = (0..5)
            .map(|i| ("hub".to_string(), format!("leaf{i}")))
            .collect();
        let records: Vec<(&str, &str, u64)> = records
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str(), 1))
            .collect();
        let summary = summarize(&records).with_limit(2);

        assert_eq!(summary.isolated.len(), 5);
        let text = summary.to_string();
        assert!(text.contains("  leaf0\n  leaf1\n  ... 3 more"));
        assert!(!text.contains("leaf2"));
        let md = summary.to_markdown();
        assert!(md.contains("_4 more not shown._"));
        assert!(md.contains("- `leaf1`\n\n_3 more not shown._"));
        assert!(!md.contains("- `leaf2`"));
    }

    #[test]
    fn limit_notes_hidden_high_coupling_rows() {
        let summary = summarize(&[
            ("A", "B", 1),
            ("A", "C", 1),
            ("B", "A", 1),
            ("B", "C", 1),
            ("C", "A", 1),
            ("C", "B", 1),
        ])
        .with_limit(1);

        assert_eq!(summary.high_coupling.len(), 3);
        let text = summary.to_string();
        assert!(text.contains("High coupling services (3):"));
        assert!(text.contains("  ... 2 more"));
    }

    #[test]
    fn decimals_apply_to_text_and_markdown() {
        let summary = summarize(&[("A", "B", 1), ("B", "C", 1), ("A", "D", 1)]).with_decimals(1);

        let md = summary.to_markdown();
        assert!(md.contains("| `A` | 0.7 | Moderate Coupling |"));
        assert!(!md.contains("0.667"));
        let text = summary.to_string();
        assert!(text.contains("  Max:  0.7\n"));

        let json = serde_json::to_value(&summary).unwrap();
        assert!((json["ranking"][0]["score"].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn markdown_table() {
        let md = summarize(&[("A", "B", 1), ("A", "C", 1), ("B", "C", 1)]).to_markdown();
        assert!(md.contains("| `A` | 1.000 | High Coupling |"));
        assert!(md.contains("| High Coupling | 1 |"));
        assert!(md.contains("## Isolated Services (1)"));
    }

    #[test]
    fn json_is_camel_case() {
        let summary = summarize(&[("A", "B", 2)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["servicesAnalyzed"], 2);
        assert_eq!(json["stats"]["stdDev"], 0.5);
        assert_eq!(json["levels"]["high"], 1);
        assert_eq!(json["ranking"][0]["service"], "A");
        assert!(json.get("limit").is_none());
    }
}
