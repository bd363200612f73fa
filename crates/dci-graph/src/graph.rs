//! Aggregated service-to-service call graph.
//!
//! The graph keeps three structures in step: the census of every service
//! ever seen, the forward adjacency (caller → callee → count) and its
//! transpose (callee → caller → count). All of them are updated only by
//! [`CallGraph::add_call`].

use std::collections::{BTreeSet, HashMap, HashSet};

use dci_core::{CallRecord, ServiceId};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::trace;

type CallCounts = HashMap<ServiceId, u64>;

/// Directed graph of observed calls between services.
///
/// Self-calls register their service in the census but never create an
/// edge. Repeated records for the same ordered pair sum their counts.
///
/// # Examples
///
/// ```
/// use dci_core::CallRecord;
/// use dci_graph::CallGraph;
///
/// let mut graph = CallGraph::new();
/// graph.add_call(&CallRecord::new("A", "B", 2).unwrap());
/// graph.add_call(&CallRecord::new("A", "B", 3).unwrap());
/// graph.add_call(&CallRecord::new("C", "C", 1).unwrap());
///
/// assert_eq!(graph.total_services(), 3);
/// assert_eq!(graph.outgoing_calls("A").get("B"), Some(5));
/// assert!(graph.outgoing_calls("C").is_empty());
/// assert_eq!(graph.isolated_services_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    census: HashSet<ServiceId>,
    outgoing: HashMap<ServiceId, CallCounts>,
    incoming: HashMap<ServiceId, CallCounts>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one call record into the graph.
    ///
    /// Both endpoints join the census. For a non-self pair the record's
    /// count is added to the pair's aggregated count (saturating), creating
    /// the edge if needed; a zero count still creates the edge.
    pub fn add_call(&mut self, record: &CallRecord) {
        let caller = record.caller();
        let callee = record.callee();

        register(&mut self.census, caller);
        register(&mut self.census, callee);

        if record.is_self_call() {
            trace!(service = %caller, "self-call registered in census only");
            return;
        }

        merge_count(&mut self.outgoing, caller, callee, record.count());
        merge_count(&mut self.incoming, callee, caller, record.count());
    }

    /// Services with at least one outgoing non-self edge.
    pub fn active_services(&self) -> BTreeSet<&ServiceId> {
        self.outgoing.keys().collect()
    }

    /// The full census: every service seen as caller or callee.
    pub fn all_services(&self) -> BTreeSet<&ServiceId> {
        self.census.iter().collect()
    }

    /// Census members that never call another service.
    pub fn isolated_services(&self) -> BTreeSet<&ServiceId> {
        self.census
            .iter()
            .filter(|s| !self.outgoing.contains_key(s.as_str()))
            .collect()
    }

    /// Callees of `service` with aggregated counts; empty if it calls nobody.
    pub fn outgoing_calls(&self, service: &str) -> CallRow<'_> {
        CallRow {
            row: self.outgoing.get(service),
        }
    }

    /// Callers of `service` with aggregated counts; empty if nobody calls it.
    pub fn incoming_calls(&self, service: &str) -> CallRow<'_> {
        CallRow {
            row: self.incoming.get(service),
        }
    }

    /// Sum of aggregated counts on edges leaving `service`.
    pub fn total_outgoing_calls(&self, service: &str) -> u64 {
        self.outgoing_calls(service).total()
    }

    /// Sum of aggregated counts on edges entering `service`.
    pub fn total_incoming_calls(&self, service: &str) -> u64 {
        self.incoming_calls(service).total()
    }

    pub fn total_services(&self) -> usize {
        self.census.len()
    }

    pub fn active_services_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn isolated_services_count(&self) -> usize {
        self.census.len() - self.outgoing.len()
    }

    /// Number of distinct non-self (caller, callee) pairs.
    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.census.is_empty()
    }

    /// Every non-self edge as `(caller, callee, aggregated count)`, in no
    /// particular order.
    pub fn edges(&self) -> impl Iterator<Item = (&ServiceId, &ServiceId, u64)> + '_ {
        self.outgoing.iter().flat_map(|(caller, callees)| {
            callees
                .iter()
                .map(move |(callee, count)| (caller, callee, *count))
        })
    }

    /// Convert to a `petgraph` digraph.
    ///
    /// One node per census member, added in service id order, and one edge
    /// per non-self pair weighted with its aggregated count. Edges are added
    /// in (caller, callee) order so the result is deterministic.
    ///
    /// # Examples
    ///
    /// ```
    /// use dci_core::CallRecord;
    /// use dci_graph::CallGraph;
    ///
    /// let graph: CallGraph = [("A", "B", 4), ("B", "C", 1)]
    ///     .into_iter()
    ///     .map(|(a, b, n)| CallRecord::new(a, b, n).unwrap())
    ///     .collect();
    /// let digraph = graph.to_digraph();
    /// assert_eq!(digraph.node_count(), 3);
    /// assert_eq!(digraph.edge_count(), 2);
    /// ```
    pub fn to_digraph(&self) -> DiGraph<ServiceId, u64> {
        let mut digraph = DiGraph::with_capacity(self.census.len(), self.edge_count());
        let mut index: HashMap<&ServiceId, NodeIndex> = HashMap::new();

        for service in self.all_services() {
            index.insert(service, digraph.add_node(service.clone()));
        }

        let mut edges: Vec<_> = self.edges().collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        for (caller, callee, count) in edges {
            digraph.add_edge(index[caller], index[callee], count);
        }

        digraph
    }
}

impl Extend<CallRecord> for CallGraph {
    fn extend<I: IntoIterator<Item = CallRecord>>(&mut self, records: I) {
        for record in records {
            self.add_call(&record);
        }
    }
}

impl FromIterator<CallRecord> for CallGraph {
    fn from_iter<I: IntoIterator<Item = CallRecord>>(records: I) -> Self {
        let mut graph = Self::new();
        graph.extend(records);
        graph
    }
}

fn register(census: &mut HashSet<ServiceId>, service: &ServiceId) {
    if !census.contains(service) {
        census.insert(service.clone());
    }
}

fn merge_count(
    map: &mut HashMap<ServiceId, CallCounts>,
    from: &ServiceId,
    to: &ServiceId,
    count: u64,
) {
    let slot = map
        .entry(from.clone())
        .or_default()
        .entry(to.clone())
        .or_insert(0);
    *slot = slot.saturating_add(count);
}

/// Read-only view of one adjacency row (outgoing or incoming).
///
/// Absent rows behave as an empty mapping.
#[derive(Debug, Clone, Copy)]
pub struct CallRow<'a> {
    row: Option<&'a CallCounts>,
}

impl<'a> CallRow<'a> {
    /// Number of distinct neighbours, ignoring call multiplicity.
    pub fn len(&self) -> usize {
        self.row.map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregated count towards (or from) `service`, if an edge exists.
    pub fn get(&self, service: &str) -> Option<u64> {
        self.row.and_then(|r| r.get(service).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a ServiceId, u64)> + 'a {
        self.row
            .into_iter()
            .flat_map(|r| r.iter().map(|(service, count)| (service, *count)))
    }

    /// Sum of all aggregated counts in the row (saturating).
    pub fn total(&self) -> u64 {
        self.iter().fold(0u64, |acc, (_, n)| acc.saturating_add(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(caller: &str, callee: &str, count: u64) -> CallRecord {
        CallRecord::new(caller, callee, count).unwrap()
    }

    fn ids<'a>(set: &BTreeSet<&'a ServiceId>) -> Vec<&'a str> {
        set.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn empty_graph_has_no_services() {
        let graph = CallGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.total_services(), 0);
        assert_eq!(graph.active_services_count(), 0);
        assert_eq!(graph.isolated_services_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.outgoing_calls("A").is_empty());
        assert!(graph.incoming_calls("A").is_empty());
    }

    #[test]
    fn add_call_registers_both_endpoints() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("A", "B", 1));

        assert_eq!(ids(&graph.all_services()), vec!["A", "B"]);
        assert_eq!(ids(&graph.active_services()), vec!["A"]);
        assert_eq!(ids(&graph.isolated_services()), vec!["B"]);
    }

    #[test]
    fn repeated_pairs_sum_counts() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("A", "B", 2));
        graph.add_call(&rec("A", "B", 5));
        graph.add_call(&rec("A", "B", 0));

        let row = graph.outgoing_calls("A");
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("B"), Some(7));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn zero_count_record_still_creates_edge() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("A", "B", 0));
        assert_eq!(graph.outgoing_calls("A").get("B"), Some(0));
        assert_eq!(graph.total_outgoing_calls("A"), 0);
        assert_eq!(graph.active_services_count(), 1);
    }

    #[test]
    fn self_call_only_joins_census() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("A", "A", 9));

        assert_eq!(graph.total_services(), 1);
        assert!(graph.outgoing_calls("A").is_empty());
        assert!(graph.incoming_calls("A").is_empty());
        assert_eq!(graph.active_services_count(), 0);
        assert_eq!(ids(&graph.isolated_services()), vec!["A"]);
    }

    #[test]
    fn self_call_on_existing_service_changes_nothing() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("A", "B", 1));
        graph.add_call(&rec("B", "B", 4));

        assert_eq!(graph.total_services(), 2);
        assert!(graph.outgoing_calls("B").is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn incoming_calls_mirror_outgoing_rows() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("A", "C", 3));
        graph.add_call(&rec("B", "C", 4));
        graph.add_call(&rec("A", "B", 1));

        let incoming = graph.incoming_calls("C");
        assert_eq!(incoming.len(), 2);
        assert_eq!(incoming.get("A"), Some(3));
        assert_eq!(incoming.get("B"), Some(4));
        assert_eq!(graph.total_incoming_calls("C"), 7);
        assert_eq!(graph.total_outgoing_calls("A"), 4);
        assert!(graph.incoming_calls("A").is_empty());
    }

    #[test]
    fn counts_saturate_instead_of_overflowing() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("A", "B", u64::MAX));
        graph.add_call(&rec("A", "B", 10));
        graph.add_call(&rec("A", "C", 1));
        assert_eq!(graph.outgoing_calls("A").get("B"), Some(u64::MAX));
        assert_eq!(graph.total_outgoing_calls("A"), u64::MAX);
    }

    #[test]
    fn ids_are_case_sensitive() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("api", "API", 1));
        assert_eq!(graph.total_services(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn collect_and_extend_fold_through_add_call() {
        let mut graph: CallGraph = vec![rec("A", "B", 1), rec("B", "C", 1)]
            .into_iter()
            .collect();
        graph.extend(vec![rec("A", "B", 1), rec("C", "C", 1)]);

        assert_eq!(graph.total_services(), 3);
        assert_eq!(graph.outgoing_calls("A").get("B"), Some(2));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn digraph_contains_isolated_nodes_and_weighted_edges() {
        let mut graph = CallGraph::new();
        graph.add_call(&rec("B", "A", 3));
        graph.add_call(&rec("C", "C", 1));

        let digraph = graph.to_digraph();
        assert_eq!(digraph.node_count(), 3);
        assert_eq!(digraph.edge_count(), 1);

        let names: Vec<&str> = digraph
            .node_indices()
            .map(|i| digraph[i].as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let edge = digraph.edge_indices().next().unwrap();
        let (from, to) = digraph.edge_endpoints(edge).unwrap();
        assert_eq!(digraph[from].as_str(), "B");
        assert_eq!(digraph[to].as_str(), "A");
        assert_eq!(digraph[edge], 3);
    }
}
