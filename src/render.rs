//! Plain-text views of a feed for terminals.

use crate::graph::TreeLayout;
use crate::instance::PluginInstance;

const COLUMNS: [&str; 6] = ["id", "previous_id", "plugin", "type", "title", "status"];

fn instance_row(instance: &PluginInstance) -> [String; 6] {
    [
        instance.id.to_string(),
        instance
            .previous_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        if instance.plugin_version.is_empty() {
            instance.plugin_name.clone()
        } else {
            format!("{} v{}", instance.plugin_name, instance.plugin_version)
        },
        instance.plugin_type.to_string(),
        instance.title.clone(),
        instance.status.to_string(),
    ]
}

pub fn render_instance_table(instances: &[PluginInstance]) -> String {
    let rows: Vec<[String; 6]> = instances.iter().map(instance_row).collect();

    // Compute column widths
    let mut widths: Vec<usize> = COLUMNS.iter().map(|name| name.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, COLUMNS.iter().copied(), &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn push_row<'s>(out: &mut String, cells: impl Iterator<Item = &'s str>, widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.zip(widths) {
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(width.saturating_sub(cell.chars().count())));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Indented outline of the layout in node order, e.g.
///
/// ```text
/// [1] pl-dircopy (finishedSuccessfully)
///   [2] pl-fshack (started)
/// ```
pub fn render_tree(layout: &TreeLayout<'_, PluginInstance>) -> String {
    let depths = layout.node_depths();
    let mut out = String::new();
    for (node, depth) in layout.nodes.iter().zip(depths) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!(
            "[{}] {} ({})\n",
            node.item.id,
            node.item.label(),
            node.item.status
        ));
    }
    out
}
