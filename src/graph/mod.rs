use crate::instance::InstanceId;
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod feed_dag;

pub use builder::{TreeBuilder, build_tree, build_tree_with_diagnostics};

/// A drawable vertex. `index` is the position in [`TreeLayout::nodes`], not
/// the instance id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode<'a, T> {
    pub index: usize,
    pub item: &'a T,
    /// Parent instance id, or 0 for the root. Used by the renderer for coloring.
    pub group: InstanceId,
    pub is_root: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutLink {
    pub source: usize,
    pub target: usize,
    /// Always 1.
    #[serde(rename = "value")]
    pub weight: u32,
}

impl LayoutLink {
    pub fn new(source: usize, target: usize) -> Self {
        Self {
            source,
            target,
            weight: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLayout<'a, T> {
    pub nodes: Vec<LayoutNode<'a, T>>,
    pub links: Vec<LayoutLink>,
    /// Approximate row count for sizing the drawing: one for the root plus
    /// one per node that has children. Not an exact depth; see [`TreeLayout::depth`].
    pub total_rows: usize,
}

impl<'a, T> TreeLayout<'a, T> {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            total_rows: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&LayoutNode<'a, T>> {
        self.nodes.first().filter(|node| node.is_root)
    }

    /// Layout indices of the direct children of `index`, in emission order.
    pub fn children_of(&self, index: usize) -> Vec<usize> {
        self.links
            .iter()
            .filter(|link| link.source == index)
            .map(|link| link.target)
            .collect()
    }

    /// Depth of every node, root at 0.
    pub fn node_depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.nodes.len()];
        // Pre-order emission: a parent's index is always below its child's.
        for link in &self.links {
            if link.source < depths.len() && link.target < depths.len() {
                depths[link.target] = depths[link.source] + 1;
            }
        }
        depths
    }

    /// Exact number of levels in the tree, 0 when empty.
    pub fn depth(&self) -> usize {
        self.node_depths()
            .into_iter()
            .max()
            .map(|deepest| deepest + 1)
            .unwrap_or(0)
    }
}

/// A layout plus what the builder had to leave out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeBuild<'a, T> {
    pub layout: TreeLayout<'a, T>,
    pub root_found: bool,
    /// Ids of items whose ancestry never reaches the root, in traversal order.
    pub unreachable: Vec<InstanceId>,
}

impl<'a, T> TreeBuild<'a, T> {
    pub fn dropped_count(&self) -> usize {
        self.unreachable.len()
    }

    pub fn into_layout(self) -> TreeLayout<'a, T> {
        self.layout
    }
}
