//! Pass network metrics
//!
//! Builds a weighted directed graph from a pass sequence and computes a
//! selectable set of named metrics over it.

use crate::{MatchLogError, Result};
use petgraph::algo::{connected_components, floyd_warshall, kosaraju_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Weighted directed pass graph; edge weight is the number of passes
#[derive(Debug, Clone, Default)]
pub struct PassGraph {
    graph: DiGraph<String, u32>,
    index: HashMap<String, NodeIndex>,
}

/// Shortest-path summary of a strongly connected graph
#[derive(Debug, Clone, Copy, PartialEq)]
struct Distances {
    diameter: u32,
    radius: u32,
    average: f64,
}

impl PassGraph {
    /// Consecutive players form an edge; a player passing to themself is ignored
    pub fn from_sequence<S: AsRef<str>>(sequence: &[S]) -> Self {
        let mut graph = PassGraph::default();
        for pair in sequence.windows(2) {
            let source = pair[0].as_ref().trim();
            let target = pair[1].as_ref().trim();
            if source == target {
                continue;
            }
            let from = graph.node(source);
            let to = graph.node(target);
            match graph.graph.find_edge(from, to) {
                Some(edge) => graph.graph[edge] += 1,
                None => {
                    graph.graph.add_edge(from, to, 1);
                }
            }
        }
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn weight(&self, source: &str, target: &str) -> Option<u32> {
        let from = *self.index.get(source)?;
        let to = *self.index.get(target)?;
        self.graph.find_edge(from, to).map(|edge| self.graph[edge])
    }

    fn degree(&self, node: NodeIndex, direction: Direction) -> usize {
        self.graph.edges_directed(node, direction).count()
    }

    fn per_node<F: Fn(NodeIndex) -> f64>(&self, value: F) -> BTreeMap<String, f64> {
        self.graph
            .node_indices()
            .map(|node| (self.graph[node].clone(), value(node)))
            .collect()
    }

    fn is_strongly_connected(&self) -> bool {
        self.node_count() > 0 && kosaraju_scc(&self.graph).len() == 1
    }

    /// Hop distances over all ordered pairs; `None` unless strongly connected
    fn distances(&self) -> Option<Distances> {
        if !self.is_strongly_connected() {
            return None;
        }
        let lengths = floyd_warshall(&self.graph, |_| 1u32).ok()?;

        let n = self.node_count();
        let mut eccentricities = Vec::with_capacity(n);
        let mut total = 0u64;
        for source in self.graph.node_indices() {
            let mut eccentricity = 0;
            for target in self.graph.node_indices().filter(|&t| t != source) {
                let hops = *lengths.get(&(source, target))?;
                eccentricity = eccentricity.max(hops);
                total += u64::from(hops);
            }
            eccentricities.push(eccentricity);
        }

        let pairs = n * (n - 1);
        Some(Distances {
            diameter: eccentricities.iter().copied().max().unwrap_or(0),
            radius: eccentricities.iter().copied().min().unwrap_or(0),
            average: if pairs == 0 { 0.0 } else { total as f64 / pairs as f64 },
        })
    }

    fn neighbour_sets(&self, direction: Direction) -> Vec<HashSet<usize>> {
        self.graph
            .node_indices()
            .map(|node| {
                self.graph
                    .neighbors_directed(node, direction)
                    .filter(|&other| other != node)
                    .map(|other| other.index())
                    .collect()
            })
            .collect()
    }

    /// Directed clustering coefficient of every node.
    ///
    /// Counts triangles through predecessors and successors alike, normalised
    /// by total degree with reciprocated pairs discounted.
    fn clustering(&self) -> Vec<f64> {
        let preds = self.neighbour_sets(Direction::Incoming);
        let succs = self.neighbour_sets(Direction::Outgoing);

        (0..self.node_count())
            .map(|i| {
                let mut triangles = 0;
                for &j in preds[i].iter().chain(succs[i].iter()) {
                    triangles += preds[i].intersection(&preds[j]).count()
                        + preds[i].intersection(&succs[j]).count()
                        + succs[i].intersection(&preds[j]).count()
                        + succs[i].intersection(&succs[j]).count();
                }
                if triangles == 0 {
                    return 0.0;
                }
                let total = preds[i].len() + succs[i].len();
                let reciprocal = preds[i].intersection(&succs[i]).count();
                triangles as f64 / (2 * (total * (total - 1) - 2 * reciprocal)) as f64
            })
            .collect()
    }

    /// Share of a node's ordered successor pairs `(w, u)` where `w` also passes to `u`
    fn transitivity(&self) -> f64 {
        let succs = self.neighbour_sets(Direction::Outgoing);
        let mut closed = 0;
        let mut possible = 0;
        for out in &succs {
            closed += out
                .iter()
                .map(|&w| out.intersection(&succs[w]).count())
                .sum::<usize>();
            possible += out.len() * out.len().saturating_sub(1);
        }
        if closed == 0 {
            0.0
        } else {
            closed as f64 / possible as f64
        }
    }
}

/// Value produced by a metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Nodes(BTreeMap<String, f64>),
    Edges(BTreeMap<String, u32>),
    Count(usize),
    Scalar(f64),
    /// Undefined for this graph, written as `null`
    Unavailable,
}

/// Named pass-network metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    NodeDegree,
    NodeInDegree,
    NodeOutDegree,
    EdgeWeight,
    NetworkDensity,
    NetworkDiameter,
    NetworkRadius,
    AverageShortestPath,
    NetworkTransitivity,
    AverageClustering,
    StronglyConnectedComponents,
    WeaklyConnectedComponents,
    NetworkNodesCount,
    NetworkEdgesCount,
    NetworkAverageDegree,
}

impl Metric {
    pub const ALL: [Metric; 15] = [
        Metric::NodeDegree,
        Metric::NodeInDegree,
        Metric::NodeOutDegree,
        Metric::EdgeWeight,
        Metric::NetworkDensity,
        Metric::NetworkDiameter,
        Metric::NetworkRadius,
        Metric::AverageShortestPath,
        Metric::NetworkTransitivity,
        Metric::AverageClustering,
        Metric::StronglyConnectedComponents,
        Metric::WeaklyConnectedComponents,
        Metric::NetworkNodesCount,
        Metric::NetworkEdgesCount,
        Metric::NetworkAverageDegree,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::NodeDegree => "node_degree",
            Metric::NodeInDegree => "node_in_degree",
            Metric::NodeOutDegree => "node_out_degree",
            Metric::EdgeWeight => "edge_weight",
            Metric::NetworkDensity => "network_density",
            Metric::NetworkDiameter => "network_diameter",
            Metric::NetworkRadius => "network_radius",
            Metric::AverageShortestPath => "network_average_shortest_path",
            Metric::NetworkTransitivity => "network_transitivity",
            Metric::AverageClustering => "network_average_clustering",
            Metric::StronglyConnectedComponents => "network_number_strongly_connected_components",
            Metric::WeaklyConnectedComponents => "network_number_weakly_connected_components",
            Metric::NetworkNodesCount => "network_nodes_count",
            Metric::NetworkEdgesCount => "network_edges_count",
            Metric::NetworkAverageDegree => "network_average_degree",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name.trim())
    }

    pub fn compute(&self, graph: &PassGraph) -> MetricValue {
        use petgraph::Direction::{Incoming, Outgoing};

        match self {
            Metric::NodeDegree => MetricValue::Nodes(graph.per_node(|n| {
                (graph.degree(n, Incoming) + graph.degree(n, Outgoing)) as f64
            })),
            Metric::NodeInDegree => {
                MetricValue::Nodes(graph.per_node(|n| graph.degree(n, Incoming) as f64))
            }
            Metric::NodeOutDegree => {
                MetricValue::Nodes(graph.per_node(|n| graph.degree(n, Outgoing) as f64))
            }
            Metric::EdgeWeight => MetricValue::Edges(
                graph
                    .graph
                    .edge_indices()
                    .filter_map(|edge| {
                        let (from, to) = graph.graph.edge_endpoints(edge)?;
                        Some((
                            format!("{}→{}", graph.graph[from], graph.graph[to]),
                            graph.graph[edge],
                        ))
                    })
                    .collect(),
            ),
            Metric::NetworkDensity => {
                let n = graph.node_count() as f64;
                if n < 2.0 {
                    MetricValue::Scalar(0.0)
                } else {
                    MetricValue::Scalar(graph.edge_count() as f64 / (n * (n - 1.0)))
                }
            }
            Metric::NetworkDiameter => graph
                .distances()
                .map_or(MetricValue::Unavailable, |d| MetricValue::Count(d.diameter as usize)),
            Metric::NetworkRadius => graph
                .distances()
                .map_or(MetricValue::Unavailable, |d| MetricValue::Count(d.radius as usize)),
            Metric::AverageShortestPath => graph
                .distances()
                .map_or(MetricValue::Unavailable, |d| MetricValue::Scalar(d.average)),
            Metric::NetworkTransitivity => MetricValue::Scalar(graph.transitivity()),
            Metric::AverageClustering => {
                let values = graph.clustering();
                if values.is_empty() {
                    MetricValue::Scalar(0.0)
                } else {
                    MetricValue::Scalar(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            Metric::StronglyConnectedComponents => {
                MetricValue::Count(kosaraju_scc(&graph.graph).len())
            }
            Metric::WeaklyConnectedComponents => {
                MetricValue::Count(connected_components(&graph.graph))
            }
            Metric::NetworkNodesCount => MetricValue::Count(graph.node_count()),
            Metric::NetworkEdgesCount => MetricValue::Count(graph.edge_count()),
            Metric::NetworkAverageDegree => {
                let n = graph.node_count();
                if n == 0 {
                    MetricValue::Scalar(0.0)
                } else {
                    // Every edge adds one to an in-degree and one to an out-degree
                    MetricValue::Scalar(2.0 * graph.edge_count() as f64 / n as f64)
                }
            }
        }
    }
}

/// Resolve requested metric names; `None` selects every metric.
///
/// Unknown names are dropped with a warning; an empty selection is an error.
pub fn select_metrics(requested: Option<&[String]>) -> Result<Vec<Metric>> {
    let Some(names) = requested else {
        return Ok(Metric::ALL.to_vec());
    };

    let mut selected = Vec::new();
    for name in names {
        match Metric::from_name(name) {
            Some(metric) if !selected.contains(&metric) => selected.push(metric),
            Some(_) => {}
            None => log::warn!("Unknown metric {}, skipping", name),
        }
    }

    if selected.is_empty() {
        return Err(MatchLogError::UnknownMetric {
            requested: names.to_vec(),
            available: Metric::ALL.map(|m| m.name()).join(", "),
        });
    }
    Ok(selected)
}

/// Metrics report written as JSON
#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub team_name: String,
    pub input_path: String,
    pub metrics: BTreeMap<String, MetricValue>,
}

/// Compute the selected metrics for a pass sequence
pub fn calculate_network_metrics(
    sequence: &[String],
    metrics: &[Metric],
    team_name: &str,
    input_path: &str,
) -> Result<NetworkReport> {
    if sequence.is_empty() {
        return Err(MatchLogError::InsufficientData(
            "no passes found, cannot build a pass network".to_string(),
        ));
    }

    let graph = PassGraph::from_sequence(sequence);
    let mut results = BTreeMap::new();
    for metric in metrics {
        results.insert(metric.name().to_string(), metric.compute(&graph));
        log::debug!("Computed {}", metric.name());
    }

    Ok(NetworkReport {
        team_name: team_name.to_string(),
        input_path: input_path.to_string(),
        metrics: results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> Vec<String> {
        ["1 - X", "2 - Y", "1 - X", "2 - Y", "2 - Y", "3 - Z", "4 - W"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_graph_weights_and_self_passes() {
        let graph = PassGraph::from_sequence(&sequence());
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.weight("1 - X", "2 - Y"), Some(2));
        assert_eq!(graph.weight("2 - Y", "1 - X"), Some(1));
        assert_eq!(graph.weight("2 - Y", "2 - Y"), None);
    }

    #[test]
    fn test_degree_metrics() {
        let graph = PassGraph::from_sequence(&sequence());
        let MetricValue::Nodes(degree) = Metric::NodeDegree.compute(&graph) else {
            panic!("expected per-node values");
        };
        assert_eq!(degree["2 - Y"], 3.0);
        assert_eq!(degree["4 - W"], 1.0);

        assert_eq!(Metric::NetworkAverageDegree.compute(&graph), MetricValue::Scalar(2.0));
        assert_eq!(
            Metric::NetworkDensity.compute(&graph),
            MetricValue::Scalar(4.0 / 12.0)
        );
    }

    #[test]
    fn test_component_counts() {
        let graph = PassGraph::from_sequence(&sequence());
        // {X, Y} cycle, then Z and W on their own
        assert_eq!(
            Metric::StronglyConnectedComponents.compute(&graph),
            MetricValue::Count(3)
        );
        assert_eq!(
            Metric::WeaklyConnectedComponents.compute(&graph),
            MetricValue::Count(1)
        );
    }

    #[test]
    fn test_select_metrics() {
        assert_eq!(select_metrics(None).unwrap().len(), Metric::ALL.len());

        let requested = vec!["edge_weight".to_string(), "bogus".to_string()];
        assert_eq!(select_metrics(Some(requested.as_slice())).unwrap(), vec![Metric::EdgeWeight]);

        let nothing = vec!["bogus".to_string()];
        assert!(matches!(
            select_metrics(Some(nothing.as_slice())),
            Err(MatchLogError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let err = calculate_network_metrics(&[], &Metric::ALL, "Home", "-").unwrap_err();
        assert!(matches!(err, MatchLogError::InsufficientData(_)));
    }

    #[test]
    fn test_report_serializes() {
        let report = calculate_network_metrics(
            &sequence(),
            &[Metric::EdgeWeight, Metric::NetworkNodesCount],
            "Home",
            "teams/",
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metrics"]["network_nodes_count"], 4);
        assert_eq!(json["metrics"]["edge_weight"]["1 - X→2 - Y"], 2);
    }

    fn closed_triad() -> PassGraph {
        // A→B, B→C, C→A and the shortcut A→C
        PassGraph::from_sequence(&["A", "B", "C", "A", "C"])
    }

    #[test]
    fn test_distance_metrics() {
        let graph = closed_triad();
        assert_eq!(Metric::NetworkDiameter.compute(&graph), MetricValue::Count(2));
        assert_eq!(Metric::NetworkRadius.compute(&graph), MetricValue::Count(1));
        assert_eq!(
            Metric::AverageShortestPath.compute(&graph),
            MetricValue::Scalar(8.0 / 6.0)
        );
    }

    #[test]
    fn test_distance_metrics_need_strong_connectivity() {
        let graph = PassGraph::from_sequence(&sequence());
        assert_eq!(Metric::NetworkDiameter.compute(&graph), MetricValue::Unavailable);
        assert_eq!(Metric::AverageShortestPath.compute(&graph), MetricValue::Unavailable);

        let report =
            calculate_network_metrics(&sequence(), &[Metric::NetworkRadius], "Home", "-").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["metrics"]["network_radius"].is_null());
    }

    #[test]
    fn test_clustering_and_transitivity() {
        let cycle = PassGraph::from_sequence(&["A", "B", "C", "A"]);
        assert_eq!(Metric::AverageClustering.compute(&cycle), MetricValue::Scalar(0.5));
        assert_eq!(Metric::NetworkTransitivity.compute(&cycle), MetricValue::Scalar(0.0));

        assert_eq!(
            Metric::NetworkTransitivity.compute(&closed_triad()),
            MetricValue::Scalar(0.5)
        );

        let chain = PassGraph::from_sequence(&["A", "B", "C"]);
        assert_eq!(Metric::AverageClustering.compute(&chain), MetricValue::Scalar(0.0));
    }
}
