use super::TreeLayout;
use crate::instance::{InstanceId, TreeItem};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// The raw previous -> instance graph of a feed, before any root is chosen.
pub struct FeedDag {
    pub graph: DiGraph<InstanceId, ()>,
    pub id_to_index: HashMap<InstanceId, NodeIndex>,
}

impl FeedDag {
    pub fn build<T: TreeItem>(items: &[T]) -> Self {
        let mut graph: DiGraph<InstanceId, ()> = DiGraph::new();
        let mut id_to_index: HashMap<InstanceId, NodeIndex> = HashMap::new();

        // Add nodes first; a repeated id keeps its first node
        for item in items {
            id_to_index
                .entry(item.id())
                .or_insert_with(|| graph.add_node(item.id()));
        }

        // Add edges: previous -> instance
        for item in items {
            let Some(previous) = item.previous_id() else {
                continue;
            };
            if let (Some(&u), Some(&v)) = (id_to_index.get(&previous), id_to_index.get(&item.id()))
            {
                graph.update_edge(u, v, ());
            }
        }

        Self { graph, id_to_index }
    }

    /// The layout as a graph keyed by layout index, node weights are instance
    /// ids and edge weights the link weights.
    pub fn from_layout<T: TreeItem>(layout: &TreeLayout<'_, T>) -> DiGraph<InstanceId, u32> {
        let mut graph = DiGraph::with_capacity(layout.nodes.len(), layout.links.len());
        for node in &layout.nodes {
            graph.add_node(node.item.id());
        }
        for link in &layout.links {
            graph.add_edge(
                NodeIndex::new(link.source),
                NodeIndex::new(link.target),
                link.weight,
            );
        }
        graph
    }

    /// Ids sitting on a previous-id cycle, including self references.
    pub fn cyclic_ids(&self) -> HashSet<InstanceId> {
        let mut cyclic = HashSet::new();
        for component in tarjan_scc(&self.graph) {
            let on_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&ix| self.graph.contains_edge(ix, ix));
            if on_cycle {
                cyclic.extend(component.into_iter().map(|ix| self.graph[ix]));
            }
        }
        cyclic
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnreachableReport {
    /// Parent chain ends at a missing instance or somewhere other than the root.
    pub orphans: Vec<InstanceId>,
    /// Part of a previous-id cycle.
    pub cyclic: Vec<InstanceId>,
}

impl UnreachableReport {
    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty() && self.cyclic.is_empty()
    }
}

/// Splits the ids a build left out into orphans and cycle members. Order of
/// `unreachable` is kept within each bucket.
pub fn classify_unreachable<T: TreeItem>(
    items: &[T],
    unreachable: &[InstanceId],
) -> UnreachableReport {
    if unreachable.is_empty() {
        return UnreachableReport::default();
    }
    let cyclic_ids = FeedDag::build(items).cyclic_ids();
    let mut report = UnreachableReport::default();
    for &id in unreachable {
        if cyclic_ids.contains(&id) {
            report.cyclic.push(id);
        } else {
            report.orphans.push(id);
        }
    }
    report
}
