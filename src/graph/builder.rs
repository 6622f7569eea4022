use super::{LayoutLink, LayoutNode, TreeBuild, TreeLayout};
use crate::instance::{InstanceId, TreeItem};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Turns a flat list of instances into a root-anchored layout.
///
/// Items are walked in reverse input order, which puts the oldest instance
/// first when the list arrives newest-first. Each node's whole subtree is
/// emitted before its next sibling.
pub struct TreeBuilder<'a, T> {
    items: &'a [T],
    root_hint: Option<InstanceId>,
}

impl<'a, T: TreeItem> TreeBuilder<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self {
            items,
            root_hint: None,
        }
    }

    /// The `previous_id` the root carries. `None` (the default) picks the
    /// first instance without a predecessor.
    pub fn with_root_hint(mut self, root_hint: Option<InstanceId>) -> Self {
        self.root_hint = root_hint;
        self
    }

    pub fn build(&self) -> TreeBuild<'a, T> {
        let working: Vec<&'a T> = self.items.iter().rev().collect();
        let mut pass = Pass::new(&working);
        let mut layout = TreeLayout::empty();

        let root_found = match pass.take_root(self.root_hint) {
            Some(root_pos) => {
                self.expand_from_root(&mut pass, &mut layout, root_pos);
                true
            }
            None => false,
        };

        let unreachable = pass.unconsumed_ids();
        debug!(
            items = working.len(),
            nodes = layout.nodes.len(),
            total_rows = layout.total_rows,
            "built feed tree"
        );
        if !root_found && !working.is_empty() {
            warn!(root_hint = ?self.root_hint, "no instance matches the root hint");
        } else if !unreachable.is_empty() {
            warn!(dropped = unreachable.len(), "instances unreachable from the root");
        }

        TreeBuild {
            layout,
            root_found,
            unreachable,
        }
    }

    fn expand_from_root(
        &self,
        pass: &mut Pass<'_, 'a, T>,
        layout: &mut TreeLayout<'a, T>,
        root_pos: usize,
    ) {
        let root = pass.working[root_pos];
        layout.nodes.push(LayoutNode {
            index: 0,
            item: root,
            group: 0,
            is_root: true,
        });
        layout.total_rows += 1;

        // (working position, parent layout index, parent id)
        let mut stack: Vec<(usize, usize, InstanceId)> = Vec::new();
        let batch = pass.take_children(root.id());
        if !batch.is_empty() {
            layout.total_rows += 1;
            stack.extend(batch.into_iter().rev().map(|pos| (pos, 0, root.id())));
        }

        while let Some((pos, parent_index, parent_id)) = stack.pop() {
            let item = pass.working[pos];
            let index = layout.nodes.len();
            layout.nodes.push(LayoutNode {
                index,
                item,
                group: parent_id,
                is_root: false,
            });
            layout.links.push(LayoutLink::new(parent_index, index));

            let batch = pass.take_children(item.id());
            if !batch.is_empty() {
                layout.total_rows += 1;
                stack.extend(batch.into_iter().rev().map(|child| (child, index, item.id())));
            }
        }
    }
}

/// Working state of one build: the reversed items, a parent-id index over
/// them and which positions have already been placed.
struct Pass<'w, 'a, T> {
    working: &'w [&'a T],
    children: HashMap<InstanceId, Vec<usize>>,
    consumed: Vec<bool>,
}

impl<'w, 'a, T: TreeItem> Pass<'w, 'a, T> {
    fn new(working: &'w [&'a T]) -> Self {
        let mut children: HashMap<InstanceId, Vec<usize>> = HashMap::new();
        for (pos, item) in working.iter().enumerate() {
            if let Some(parent) = item.previous_id() {
                children.entry(parent).or_default().push(pos);
            }
        }
        Self {
            working,
            children,
            consumed: vec![false; working.len()],
        }
    }

    fn take_root(&mut self, root_hint: Option<InstanceId>) -> Option<usize> {
        let pos = self
            .working
            .iter()
            .position(|item| item.previous_id() == root_hint)?;
        self.consumed[pos] = true;
        Some(pos)
    }

    /// Claims every unplaced child of `parent_id` at once, in working order.
    fn take_children(&mut self, parent_id: InstanceId) -> Vec<usize> {
        let Some(candidates) = self.children.get(&parent_id) else {
            return Vec::new();
        };
        let mut batch = Vec::new();
        for &pos in candidates {
            if !self.consumed[pos] {
                self.consumed[pos] = true;
                batch.push(pos);
            }
        }
        batch
    }

    fn unconsumed_ids(&self) -> Vec<InstanceId> {
        self.working
            .iter()
            .zip(&self.consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(item, _)| item.id())
            .collect()
    }
}

pub fn build_tree<T: TreeItem>(items: &[T], root_hint: Option<InstanceId>) -> TreeLayout<'_, T> {
    build_tree_with_diagnostics(items, root_hint).into_layout()
}

pub fn build_tree_with_diagnostics<T: TreeItem>(
    items: &[T],
    root_hint: Option<InstanceId>,
) -> TreeBuild<'_, T> {
    TreeBuilder::new(items).with_root_hint(root_hint).build()
}
