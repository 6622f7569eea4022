use feed_tree::{
    InstanceId, LayoutLink, PluginInstance, TreeItem, TreeLayout, build_tree,
    build_tree_with_diagnostics,
};
use std::collections::HashSet;

fn root(id: InstanceId) -> PluginInstance {
    PluginInstance::root(id, "pl-dircopy")
}

fn child(id: InstanceId, previous: InstanceId) -> PluginInstance {
    PluginInstance::child_of(id, previous, "pl-simpledsapp")
}

/// A newest-first chain 1 <- 2 <- ... <- n, like the API returns it.
fn chain(n: InstanceId) -> Vec<PluginInstance> {
    (1..=n)
        .rev()
        .map(|id| if id == 1 { root(1) } else { child(id, id - 1) })
        .collect()
}

fn assert_tree_invariants<T: TreeItem>(layout: &TreeLayout<'_, T>) {
    // P2: dense indices
    for (i, node) in layout.nodes.iter().enumerate() {
        assert_eq!(node.index, i);
    }
    // P3: links point into nodes, weight 1
    for link in &layout.links {
        assert!(link.source < layout.nodes.len());
        assert!(link.target < layout.nodes.len());
        assert_eq!(link.weight, 1);
    }
    // P4: one inbound link per non-root, none for the root
    let mut inbound = vec![0usize; layout.nodes.len()];
    for link in &layout.links {
        inbound[link.target] += 1;
    }
    for (node, count) in layout.nodes.iter().zip(&inbound) {
        let expected = if node.is_root { 0 } else { 1 };
        assert_eq!(*count, expected, "node {} inbound links", node.index);
    }
    // P5: each id at most once
    let mut seen = HashSet::new();
    for node in &layout.nodes {
        assert!(seen.insert(node.item.id()), "id {} repeated", node.item.id());
    }
    assert!(layout.nodes.iter().filter(|n| n.is_root).count() <= 1);
}

#[test]
fn single_root_yields_one_row() {
    let items = vec![root(1)];
    let layout = build_tree(&items, None);
    assert_eq!(layout.nodes.len(), 1);
    assert_eq!(layout.nodes[0].index, 0);
    assert!(layout.nodes[0].is_root);
    assert_eq!(layout.nodes[0].group, 0);
    assert!(layout.links.is_empty());
    assert_eq!(layout.total_rows, 1);
}

#[test]
fn root_with_one_child_links_index_zero_to_one() {
    let items = vec![root(1), child(2, 1)];
    let layout = build_tree(&items, None);
    assert_eq!(layout.nodes.len(), 2);
    assert_eq!(layout.links, vec![LayoutLink::new(0, 1)]);

    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(
        json["links"],
        serde_json::json!([{ "source": 0, "target": 1, "value": 1 }])
    );
    assert_eq!(json["totalRows"], 2);
    assert_eq!(json["nodes"][0]["isRoot"], true);
    assert_eq!(json["nodes"][1]["group"], 1);
    assert_eq!(json["nodes"][1]["item"]["plugin_name"], "pl-simpledsapp");
}

#[test]
fn root_with_two_children() {
    let items = vec![root(1), child(2, 1), child(3, 1)];
    let layout = build_tree(&items, None);
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.children_of(0), vec![1, 2]);
    assert!(layout.links.iter().all(|link| link.source == 0));
    // Reversed input: 3 is met before 2.
    assert_eq!(layout.nodes[1].item.id, 3);
    assert_eq!(layout.nodes[2].item.id, 2);
    assert_tree_invariants(&layout);
}

#[test]
fn no_matching_root_gives_empty_layout() {
    let items = vec![child(2, 99)];
    let build = build_tree_with_diagnostics(&items, None);
    assert!(build.layout.nodes.is_empty());
    assert!(build.layout.links.is_empty());
    assert_eq!(build.layout.total_rows, 0);
    assert!(!build.root_found);
    assert_eq!(build.unreachable, vec![2]);
}

#[test]
fn empty_input_gives_empty_layout() {
    let items: Vec<PluginInstance> = Vec::new();
    let build = build_tree_with_diagnostics(&items, None);
    assert!(build.layout.is_empty());
    assert!(build.layout.root().is_none());
    assert_eq!(build.layout.total_rows, 0);
    assert_eq!(build.dropped_count(), 0);
}

#[test]
fn orphan_is_left_out() {
    let items = vec![root(1), child(2, 1), child(3, 77)];
    let build = build_tree_with_diagnostics(&items, None);
    assert_eq!(build.layout.nodes.len(), 2);
    assert!(build.layout.nodes.iter().all(|node| node.item.id != 3));
    assert_eq!(build.unreachable, vec![3]);
    assert_tree_invariants(&build.layout);
}

#[test]
fn chain_of_fifty_links_consecutive_indices() {
    let items = chain(50);
    let layout = build_tree(&items, None);
    assert_eq!(layout.nodes.len(), 50);
    assert_eq!(layout.links.len(), 49);
    for (i, link) in layout.links.iter().enumerate() {
        assert_eq!((link.source, link.target), (i, i + 1));
    }
    assert_eq!(layout.depth(), 50);
    assert_eq!(layout.total_rows, 50);
    assert_tree_invariants(&layout);
}

#[test]
fn very_deep_chain_does_not_overflow() {
    let items = chain(200_000);
    let layout = build_tree(&items, None);
    assert_eq!(layout.nodes.len(), 200_000);
    assert_eq!(layout.links.len(), 199_999);
    assert_eq!(layout.nodes.last().map(|node| node.item.id), Some(200_000));
}

#[test]
fn root_is_unique_and_first() {
    let items = vec![child(4, 2), child(3, 1), child(2, 1), root(1)];
    let layout = build_tree(&items, None);
    let roots: Vec<_> = layout.nodes.iter().filter(|node| node.is_root).collect();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].index, 0);
    assert_eq!(roots[0].item.id, 1);
    assert_eq!(layout.root().map(|node| node.item.id), Some(1));
}

/// Deterministic pseudo-random feeds: every instance points at some earlier
/// id, with a few dangling references thrown in.
fn generated_feed(seed: u64, size: i32) -> Vec<PluginInstance> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as i32
    };
    let mut items = vec![root(1)];
    for id in 2..=size {
        let previous = if next() % 10 == 0 {
            size + 100 + id
        } else {
            1 + next().rem_euclid(id - 1)
        };
        items.push(child(id, previous));
    }
    // mix the order up a little
    let len = items.len();
    for i in 0..len {
        let j = next().rem_euclid(len as i32) as usize;
        items.swap(i, j);
    }
    items
}

#[test]
fn generated_feeds_keep_tree_invariants() {
    for seed in 1..=25u64 {
        let items = generated_feed(seed, 60);
        let build = build_tree_with_diagnostics(&items, None);
        assert!(build.root_found);
        assert_tree_invariants(&build.layout);
        assert_eq!(
            build.layout.nodes.len() + build.unreachable.len(),
            items.len(),
            "every instance is either placed or reported"
        );
        let rows_lower_bound = build.layout.depth();
        assert!(build.layout.total_rows >= rows_lower_bound);
    }
}

#[test]
fn building_twice_gives_the_same_layout() {
    let items = generated_feed(7, 80);
    let first = build_tree_with_diagnostics(&items, None);
    let second = build_tree_with_diagnostics(&items, None);
    assert_eq!(first, second);
}
