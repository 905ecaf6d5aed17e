//! Decision tree rendering: a PNG of the upper levels plus a text dump.

use std::fmt::Write as _;
use std::path::Path;

use image::Rgb;

use super::ArtifactError;
use super::canvas::{BLACK, Canvas, MUTED, WHITE, mix};
use crate::ml::tree::{DecisionTree, TreeNode};

/// Deepest node depth drawn; deeper subtrees are marked as truncated.
pub const PLOT_MAX_DEPTH: usize = 3;
pub const TREE_WIDTH: u32 = 1600;
pub const TREE_HEIGHT: u32 = 800;

pub const STAY_COLOR: Rgb<u8> = Rgb([229, 129, 57]);
pub const CHURN_COLOR: Rgb<u8> = Rgb([57, 157, 229]);

const BOX_HEIGHT: u32 = 60;
const TOP_MARGIN: f32 = 40.0;

/// Placement of a drawn node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placed {
    node: usize,
    depth: usize,
    center_x: f32,
    top_y: f32,
}

/// Fill color for a node: majority class hue, whiter as the node gets less pure.
pub fn node_color(node: &TreeNode) -> Rgb<u8> {
    let p = node.positive_rate();
    let (major, minor, base) = if p >= 0.5 {
        (p, 1.0 - p, CHURN_COLOR)
    } else {
        (1.0 - p, p, STAY_COLOR)
    };
    let strength = if minor >= 1.0 {
        0.0
    } else {
        (major - minor) / (1.0 - minor)
    };
    mix(WHITE, base, strength)
}

fn layout(tree: &DecisionTree, max_depth: usize) -> Vec<Placed> {
    let level_gap = (TREE_HEIGHT as f32 - TOP_MARGIN * 2.0 - BOX_HEIGHT as f32)
        / max_depth.max(1) as f32;
    let mut placed = Vec::new();
    // (node, depth, slot within the depth's 2^depth columns)
    let mut stack = vec![(0usize, 0usize, 0usize)];
    while let Some((node_idx, depth, slot)) = stack.pop() {
        let Some(node) = tree.nodes.get(node_idx) else {
            continue;
        };
        let columns = (1usize << depth) as f32;
        placed.push(Placed {
            node: node_idx,
            depth,
            center_x: (slot as f32 + 0.5) / columns * TREE_WIDTH as f32,
            top_y: TOP_MARGIN + depth as f32 * level_gap,
        });
        if depth < max_depth
            && let Some(split) = &node.split
        {
            stack.push((split.right, depth + 1, slot * 2 + 1));
            stack.push((split.left, depth + 1, slot * 2));
        }
    }
    placed
}

/// Render the top levels of a tree as boxes joined by edges.
pub fn render_tree(tree: &DecisionTree) -> Result<Canvas, ArtifactError> {
    tree.validate().map_err(ArtifactError::Invalid)?;
    let mut canvas = Canvas::new(TREE_WIDTH, TREE_HEIGHT, WHITE);
    let placed = layout(tree, PLOT_MAX_DEPTH);
    let box_width = |depth: usize| -> u32 {
        let column = TREE_WIDTH as f32 / (1usize << depth) as f32;
        (column - 12.0).clamp(16.0, 180.0) as u32
    };

    for parent in &placed {
        let Some(split) = &tree.nodes[parent.node].split else {
            continue;
        };
        let from = (parent.center_x, parent.top_y + BOX_HEIGHT as f32);
        let children: Vec<&Placed> = placed
            .iter()
            .filter(|p| p.node == split.left || p.node == split.right)
            .collect();
        if children.is_empty() {
            // Truncated below the plotted depth.
            canvas.dashed_line(from, (from.0, from.1 + 14.0), MUTED, 3.0);
            continue;
        }
        for child in children {
            canvas.line(from, (child.center_x, child.top_y), BLACK);
        }
    }

    for p in &placed {
        let node = &tree.nodes[p.node];
        let width = box_width(p.depth);
        let x = (p.center_x - width as f32 / 2.0) as i64;
        let y = p.top_y as i64;
        canvas.fill_rect(x, y, width, BOX_HEIGHT, node_color(node));
        canvas.stroke_rect(x, y, width, BOX_HEIGHT, BLACK);
    }
    Ok(canvas)
}

pub fn write_tree_plot(path: &Path, tree: &DecisionTree) -> Result<(), ArtifactError> {
    let canvas = render_tree(tree)?;
    canvas.save_png(path)?;
    tracing::debug!(path = %path.display(), nodes = tree.nodes.len(), "Wrote tree plot");
    Ok(())
}

/// Indented text rendering of the tree down to `max_depth`.
pub fn describe_tree(tree: &DecisionTree, feature_names: &[String], max_depth: usize) -> String {
    let mut out = String::new();
    describe_node(tree, feature_names, 0, 0, max_depth, &mut out);
    out
}

fn describe_node(
    tree: &DecisionTree,
    names: &[String],
    idx: usize,
    depth: usize,
    max_depth: usize,
    out: &mut String,
) {
    let Some(node) = tree.nodes.get(idx) else {
        return;
    };
    let indent = "|   ".repeat(depth);
    match &node.split {
        Some(split) if depth < max_depth => {
            let name = names
                .get(split.feature_index)
                .cloned()
                .unwrap_or_else(|| format!("feature_{}", split.feature_index));
            let _ = writeln!(out, "{indent}|--- {name} <= {:.4}", split.threshold);
            describe_node(tree, names, split.left, depth + 1, max_depth, out);
            let _ = writeln!(out, "{indent}|--- {name} >  {:.4}", split.threshold);
            describe_node(tree, names, split.right, depth + 1, max_depth, out);
        }
        Some(_) => {
            let _ = writeln!(
                out,
                "{indent}|--- truncated (samples={}, churn_rate={:.3})",
                node.samples,
                node.positive_rate()
            );
        }
        None => {
            let class = u8::from(node.positive_rate() >= 0.5);
            let _ = writeln!(
                out,
                "{indent}|--- class: {class} (samples={}, churn_rate={:.3})",
                node.samples,
                node.positive_rate()
            );
        }
    }
}

pub fn write_tree_text(
    path: &Path,
    tree: &DecisionTree,
    feature_names: &[String],
) -> Result<(), ArtifactError> {
    let text = describe_tree(tree, feature_names, PLOT_MAX_DEPTH);
    super::write_text(path, &text)
}
