//! Flat node list → single-rooted tree.
//!
//! Pure transform: nothing here touches layout or selection. The tree is an
//! index arena so parent back-references stay cheap and non-owning; node
//! order (and therefore children order) follows the input list exactly.

use std::collections::HashMap;

use crate::graph::error::StructureError;
use crate::graph::model::NodeRecord;

/// One node of the built hierarchy.
///
/// `x`/`y` are the current layout position, `x0`/`y0` the previous one (for
/// the renderer to animate from; the layout reconciler owns both pairs).
/// `stored_x`/`stored_y` carry the coordinates the originating record loaded
/// with, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    pub fact: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub stored_x: Option<f64>,
    pub stored_y: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub x0: f64,
    pub y0: f64,
}

/// A single-rooted hierarchy over an arena of [`TreeNode`]s.
///
/// Indices are stable for the lifetime of one build; any structural change
/// goes back through [`build`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: usize,
}

impl Tree {
    pub fn root(&self) -> usize {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &TreeNode {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut TreeNode {
        &mut self.nodes[idx]
    }

    /// All nodes in input-list order.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [TreeNode] {
        &mut self.nodes
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The id of a node's parent, or `""` for the root.
    ///
    /// This is always derived from the live structure, never from the input
    /// record's `parent_id` field.
    pub fn parent_id(&self, idx: usize) -> &str {
        match self.nodes[idx].parent {
            Some(parent) => &self.nodes[parent].id,
            None => "",
        }
    }

    /// Hierarchy depth: 0 for the root.
    pub fn depth(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut current = idx;
        while let Some(parent) = self.nodes[current].parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    pub fn max_depth(&self) -> usize {
        (0..self.nodes.len()).map(|i| self.depth(i)).max().unwrap_or(0)
    }
}

/// Build a [`Tree`] from flat records.
///
/// Exactly one record must have an empty `parent_id`; every other record's
/// `parent_id` must name another record. Duplicate or empty ids, zero or two
/// roots, dangling parents and cycles are all [`StructureError`]s.
pub fn build(records: &[NodeRecord]) -> Result<Tree, StructureError> {
    let mut index_by_id: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if record.id.is_empty() {
            return Err(StructureError::EmptyId);
        }
        if index_by_id.insert(record.id.as_str(), idx).is_some() {
            return Err(StructureError::DuplicateId {
                id: record.id.clone(),
            });
        }
    }

    let mut root: Option<usize> = None;
    let mut nodes: Vec<TreeNode> = records
        .iter()
        .map(|record| TreeNode {
            id: record.id.clone(),
            name: record.name.clone(),
            fact: record.fact.clone(),
            parent: None,
            children: Vec::new(),
            stored_x: record.x,
            stored_y: record.y,
            x: 0.0,
            y: 0.0,
            x0: 0.0,
            y0: 0.0,
        })
        .collect();

    for (idx, record) in records.iter().enumerate() {
        if record.is_root() {
            if let Some(existing) = root {
                return Err(StructureError::MultipleRoots {
                    first: records[existing].id.clone(),
                    second: record.id.clone(),
                });
            }
            root = Some(idx);
            continue;
        }
        let Some(&parent) = index_by_id.get(record.parent_id.as_str()) else {
            return Err(StructureError::UnknownParent {
                child: record.id.clone(),
                parent: record.parent_id.clone(),
            });
        };
        nodes[idx].parent = Some(parent);
        nodes[parent].children.push(idx);
    }

    let Some(root) = root else {
        return Err(StructureError::NoRoot);
    };

    // Every node must be reachable from the root; an unreached node sits on
    // a parent cycle.
    let mut reached = vec![false; nodes.len()];
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        if reached[idx] {
            continue;
        }
        reached[idx] = true;
        stack.extend(nodes[idx].children.iter().copied());
    }
    if let Some(unreached) = reached.iter().position(|r| !r) {
        return Err(StructureError::Unreachable {
            id: nodes[unreached].id.clone(),
        });
    }

    Ok(Tree { nodes, root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::demo_document;

    fn record(id: &str, parent: &str) -> NodeRecord {
        NodeRecord::new(id, parent, id.to_uppercase(), "")
    }

    #[test]
    fn builds_every_valid_record_into_the_tree() {
        let doc = demo_document();
        let tree = build(&doc.nodes).unwrap();
        assert_eq!(tree.len(), doc.nodes.len());
        assert_eq!(tree.node(tree.root()).id, "food");
        assert_eq!(tree.parent_id(tree.index_of("chicken").unwrap()), "meat");
        assert_eq!(tree.depth(tree.index_of("tbone").unwrap()), 3);
    }

    #[test]
    fn children_follow_input_order() {
        let tree = build(&demo_document().nodes).unwrap();
        let meat = tree.index_of("meat").unwrap();
        let children: Vec<&str> = tree.node(meat)
            .children
            .iter()
            .map(|&c| tree.node(c).id.as_str())
            .collect();
        assert_eq!(children, vec!["salmon", "steak", "chicken"]);
    }

    #[test]
    fn zero_roots_is_a_structure_error() {
        let records = vec![record("a", "b"), record("b", "a")];
        // Both of these declare parents, so the failure is either NoRoot or
        // the cycle check, depending on which triggers first; here neither
        // node is a root.
        assert!(matches!(
            build(&records),
            Err(StructureError::NoRoot | StructureError::Unreachable { .. })
        ));
    }

    #[test]
    fn two_roots_is_a_structure_error() {
        let records = vec![record("a", ""), record("b", "")];
        assert_eq!(
            build(&records),
            Err(StructureError::MultipleRoots {
                first: "a".to_string(),
                second: "b".to_string(),
            })
        );
    }

    #[test]
    fn dangling_parent_is_a_structure_error() {
        let records = vec![record("a", ""), record("b", "ghost")];
        assert_eq!(
            build(&records),
            Err(StructureError::UnknownParent {
                child: "b".to_string(),
                parent: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn cycle_is_a_structure_error() {
        let records = vec![record("root", ""), record("a", "b"), record("b", "a")];
        assert!(matches!(
            build(&records),
            Err(StructureError::Unreachable { .. })
        ));
    }

    #[test]
    fn duplicate_id_is_a_structure_error() {
        let records = vec![record("a", ""), record("a", "a")];
        assert_eq!(
            build(&records),
            Err(StructureError::DuplicateId { id: "a".to_string() })
        );
    }

    #[test]
    fn stored_coordinates_are_carried_onto_tree_nodes() {
        let mut records = vec![record("a", ""), record("b", "a")];
        records[1].x = Some(42.0);
        records[1].y = Some(7.5);
        let tree = build(&records).unwrap();
        let b = tree.index_of("b").unwrap();
        assert_eq!(tree.node(b).stored_x, Some(42.0));
        assert_eq!(tree.node(b).stored_y, Some(7.5));
    }
}
