//! Position assignment for the tree.
//!
//! Three steps, always in this order: a deterministic tidy layout over the
//! whole hierarchy, an override merge that re-applies any coordinate already
//! known for a node id, and a snapshot of the result into each node's
//! previous-position slot. Only the first step looks at the structure; the
//! merge is a best-effort id lookup.

use std::collections::HashMap;

use crate::graph::tree::Tree;

/// Canvas bounds for the base layout.
///
/// The tree is laid out across `width` and down `height - top_margin`, the
/// root on the top edge. Defaults match the original 960×600 canvas with a
/// 150px reserve for captions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub top_margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            top_margin: 150.0,
        }
    }
}

impl LayoutConfig {
    fn usable_height(&self) -> f64 {
        (self.height - self.top_margin).max(1.0)
    }
}

/// A node position keyed by id, carried across rebuilds.
pub type PositionMap = HashMap<String, (f64, f64)>;

/// Assign `(x, y)` to every node: base layout, then overrides, then snapshot.
///
/// Override precedence per id: the coordinate stored on the originating
/// record (a loaded document), then any prior in-memory position — the prior
/// position wins because it is newer.
pub fn reconcile(tree: &mut Tree, config: &LayoutConfig, prior: &PositionMap) {
    base_layout(tree, config);
    for node in tree.nodes_mut() {
        if let (Some(x), Some(y)) = (node.stored_x, node.stored_y) {
            node.x = x;
            node.y = y;
        }
        if let Some(&(x, y)) = prior.get(&node.id) {
            node.x = x;
            node.y = y;
        }
    }
    snapshot(tree);
}

/// Reset every node to its base-layout position, discarding overrides.
pub fn tidy(tree: &mut Tree, config: &LayoutConfig) {
    base_layout(tree, config);
    snapshot(tree);
}

/// Capture the current positions keyed by id, for carrying across a rebuild.
pub fn positions(tree: &Tree) -> PositionMap {
    tree.nodes()
        .iter()
        .map(|n| (n.id.clone(), (n.x, n.y)))
        .collect()
}

/// Deterministic tidy layout.
///
/// Leaves get evenly spaced x slots across the canvas width in tree order;
/// every internal node is centered between its first and last child. Depth
/// maps linearly onto the usable height. Siblings can never overlap because
/// distinct leaves always occupy distinct slots.
fn base_layout(tree: &mut Tree, config: &LayoutConfig) {
    if tree.is_empty() {
        return;
    }
    let leaf_count = tree.nodes().iter().filter(|n| n.children.is_empty()).count();
    let slot = config.width / leaf_count as f64;
    let row = config.usable_height() / tree.max_depth().max(1) as f64;

    let mut next_leaf = 0usize;
    let root = tree.root();
    assign(tree, root, 0, slot, row, &mut next_leaf);
}

fn assign(
    tree: &mut Tree,
    idx: usize,
    depth: usize,
    slot: f64,
    row: f64,
    next_leaf: &mut usize,
) {
    let children = tree.node(idx).children.clone();
    if children.is_empty() {
        tree.node_mut(idx).x = (*next_leaf as f64 + 0.5) * slot;
        *next_leaf += 1;
    } else {
        for &child in &children {
            assign(tree, child, depth + 1, slot, row, next_leaf);
        }
        let first = tree.node(children[0]).x;
        let last = tree.node(children[children.len() - 1]).x;
        tree.node_mut(idx).x = (first + last) / 2.0;
    }
    tree.node_mut(idx).y = depth as f64 * row;
}

fn snapshot(tree: &mut Tree) {
    for node in tree.nodes_mut() {
        node.x0 = node.x;
        node.y0 = node.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::demo_document;
    use crate::graph::tree::build;

    fn demo_tree() -> Tree {
        build(&demo_document().nodes).unwrap()
    }

    #[test]
    fn base_layout_places_rows_by_depth() {
        let mut tree = demo_tree();
        tidy(&mut tree, &LayoutConfig::default());
        let y_of = |id: &str| tree.get(id).unwrap().y;
        assert_eq!(y_of("food"), 0.0);
        assert_eq!(y_of("meat"), y_of("carbs"));
        assert!(y_of("meat") < y_of("salmon"));
        assert!(y_of("salmon") < y_of("ribeye"));
        assert_eq!(y_of("ribeye"), 450.0, "deepest row fills height - margin");
    }

    #[test]
    fn base_layout_keeps_siblings_apart_and_in_order() {
        let mut tree = demo_tree();
        tidy(&mut tree, &LayoutConfig::default());
        let x_of = |id: &str| tree.get(id).unwrap().x;
        assert!(x_of("salmon") < x_of("steak"));
        assert!(x_of("steak") < x_of("chicken"));
        assert!(x_of("round") < x_of("ribeye"));
        assert!(x_of("ribeye") < x_of("tbone"));
        // parent centered over its children
        let steak = x_of("steak");
        assert!((steak - (x_of("round") + x_of("tbone")) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn base_layout_stays_inside_the_canvas() {
        let config = LayoutConfig::default();
        let mut tree = demo_tree();
        tidy(&mut tree, &config);
        for node in tree.nodes() {
            assert!(node.x > 0.0 && node.x < config.width, "{} x", node.id);
            assert!(
                node.y >= 0.0 && node.y <= config.height - config.top_margin,
                "{} y",
                node.id
            );
        }
    }

    #[test]
    fn single_node_tree_lands_mid_canvas_top() {
        let doc = crate::graph::model::NodeRecord::new("only", "", "Only", "");
        let mut tree = build(&[doc]).unwrap();
        tidy(&mut tree, &LayoutConfig::default());
        let only = tree.get("only").unwrap();
        assert_eq!(only.x, 480.0);
        assert_eq!(only.y, 0.0);
    }

    #[test]
    fn stored_record_coordinates_override_base_layout() {
        let mut doc = demo_document();
        let chicken = doc.nodes.iter_mut().find(|n| n.id == "chicken").unwrap();
        chicken.x = Some(11.0);
        chicken.y = Some(22.0);
        let mut tree = build(&doc.nodes).unwrap();
        reconcile(&mut tree, &LayoutConfig::default(), &PositionMap::new());
        let node = tree.get("chicken").unwrap();
        assert_eq!((node.x, node.y), (11.0, 22.0));
        // untouched nodes keep the base layout
        assert_eq!(tree.get("food").unwrap().y, 0.0);
    }

    #[test]
    fn prior_positions_win_over_stored_coordinates() {
        let mut doc = demo_document();
        let chicken = doc.nodes.iter_mut().find(|n| n.id == "chicken").unwrap();
        chicken.x = Some(11.0);
        chicken.y = Some(22.0);
        let mut tree = build(&doc.nodes).unwrap();
        let mut prior = PositionMap::new();
        prior.insert("chicken".to_string(), (300.0, 400.0));
        reconcile(&mut tree, &LayoutConfig::default(), &prior);
        let node = tree.get("chicken").unwrap();
        assert_eq!((node.x, node.y), (300.0, 400.0));
    }

    #[test]
    fn reconcile_snapshots_previous_positions() {
        let mut tree = demo_tree();
        reconcile(&mut tree, &LayoutConfig::default(), &PositionMap::new());
        for node in tree.nodes() {
            assert_eq!(node.x0, node.x);
            assert_eq!(node.y0, node.y);
        }
    }

    #[test]
    fn tidy_discards_overrides() {
        let mut tree = demo_tree();
        let config = LayoutConfig::default();
        let mut prior = PositionMap::new();
        prior.insert("salmon".to_string(), (1.0, 2.0));
        reconcile(&mut tree, &config, &prior);
        assert_eq!(tree.get("salmon").unwrap().x, 1.0);

        tidy(&mut tree, &config);
        let salmon = tree.get("salmon").unwrap();
        assert_ne!(salmon.x, 1.0);
        assert_eq!(salmon.x0, salmon.x);
    }
}
