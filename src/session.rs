//! The owned editing session: flat records, extra lines, the derived tree,
//! and the current selection.
//!
//! Every mutation runs synchronously inside one caller event; there is no
//! other entry point to the state. Structural edits (add/remove node, load)
//! rebuild the tree from the flat list and re-run the layout reconciler with
//! the previous positions carried over by id, so a rebuild never visually
//! scatters nodes the user has placed.

use std::collections::HashSet;

use crate::graph::error::{GraphError, Result, ValidationError};
use crate::graph::layout::{self, LayoutConfig, PositionMap};
use crate::graph::model::{ExtraEdge, GraphDocument, NodeRecord};
use crate::graph::tree::{self, Tree};

#[derive(Debug)]
pub struct GraphSession {
    records: Vec<NodeRecord>,
    links: Vec<ExtraEdge>,
    tree: Tree,
    selection: Vec<String>,
    layout: LayoutConfig,
}

impl GraphSession {
    /// Build a session from a document. Fails on a malformed hierarchy and
    /// constructs nothing in that case.
    pub fn open(doc: GraphDocument, layout_config: LayoutConfig) -> Result<Self> {
        let mut tree = tree::build(&doc.nodes)?;
        layout::reconcile(&mut tree, &layout_config, &PositionMap::new());
        log::debug!("session opened: {} nodes, {} links", doc.nodes.len(), doc.links.len());
        Ok(Self {
            records: doc.nodes,
            links: doc.links,
            tree,
            selection: Vec::new(),
            layout: layout_config,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn links(&self) -> &[ExtraEdge] {
        &self.links
    }

    /// Extra lines whose endpoints both exist. Dangling references are kept
    /// in state but never reach the renderer.
    pub fn renderable_links(&self) -> Vec<&ExtraEdge> {
        self.links
            .iter()
            .filter(|l| self.tree.contains(&l.source_id) && self.tree.contains(&l.target_id))
            .collect()
    }

    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.layout = config;
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Ordered selection: first entry is the line source for [`add_edges`].
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Plain click: the clicked node becomes the only selection. Returns the
    /// node's fact when it has one, so the caller can display it.
    pub fn select_only(&mut self, id: &str) -> Result<Option<String>> {
        let Some(idx) = self.tree.index_of(id) else {
            return Err(ValidationError::UnknownNode { id: id.to_string() }.into());
        };
        self.selection.clear();
        self.selection.push(id.to_string());
        let fact = &self.tree.node(idx).fact;
        Ok(if fact.is_empty() { None } else { Some(fact.clone()) })
    }

    /// Modifier click: toggle one node's membership, leaving the rest alone.
    pub fn toggle_select(&mut self, id: &str) -> Result<bool> {
        if !self.tree.contains(id) {
            return Err(ValidationError::UnknownNode { id: id.to_string() }.into());
        }
        if let Some(pos) = self.selection.iter().position(|s| s == id) {
            self.selection.remove(pos);
            Ok(false)
        } else {
            self.selection.push(id.to_string());
            Ok(true)
        }
    }

    /// Background click.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ------------------------------------------------------------------
    // Edit operations
    // ------------------------------------------------------------------

    /// Add captioned lines from the first selected node to every other
    /// selected node. Self-pairs and lines that already exist (in either
    /// orientation) are skipped, the rest are appended; the operation is not
    /// atomic across pairs. Returns how many lines were added and clears the
    /// selection.
    pub fn add_edges(&mut self, caption: &str) -> Result<usize> {
        if self.selection.len() < 2 {
            return Err(ValidationError::InsufficientSelection.into());
        }
        let source = self.selection[0].clone();
        let mut added = 0;
        for target in &self.selection[1..] {
            if *target == source {
                continue;
            }
            if self.links.iter().any(|l| l.connects(&source, target)) {
                continue;
            }
            self.links.push(ExtraEdge::new(&source, target, caption));
            added += 1;
        }
        log::debug!("add_edges: {} added from '{}'", added, source);
        self.selection.clear();
        Ok(added)
    }

    /// Remove the line joining `a` and `b`, whichever way it was stored.
    pub fn remove_edge(&mut self, a: &str, b: &str) -> Result<()> {
        let Some(pos) = self.links.iter().position(|l| l.connects(a, b)) else {
            return Err(ValidationError::UnknownEdge {
                src: a.to_string(),
                target: b.to_string(),
            }
            .into());
        };
        self.links.remove(pos);
        Ok(())
    }

    /// Add a node under `parent_id`. The id is derived from the name
    /// (lowercased, whitespace stripped); an id collision is the caller's
    /// problem to rename, not ours to auto-disambiguate. Clears the
    /// selection and returns the new id.
    pub fn add_node(&mut self, name: &str, parent_id: &str, fact: &str) -> Result<String> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "name" }.into());
        }
        if parent_id.is_empty() {
            return Err(ValidationError::MissingField { field: "parent id" }.into());
        }
        if !self.tree.contains(parent_id) {
            return Err(ValidationError::UnknownParent {
                id: parent_id.to_string(),
            }
            .into());
        }
        let id = derive_id(name);
        if self.tree.contains(&id) {
            return Err(ValidationError::DuplicateId { id }.into());
        }

        self.records
            .push(NodeRecord::new(id.clone(), parent_id, name, fact));
        self.rebuild()?;
        self.selection.clear();
        Ok(id)
    }

    /// Remove a leaf node and prune any extra lines touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<()> {
        let Some(idx) = self.tree.index_of(id) else {
            return Err(ValidationError::UnknownNode { id: id.to_string() }.into());
        };
        if idx == self.tree.root() {
            return Err(ValidationError::CannotRemoveRoot.into());
        }
        if !self.tree.node(idx).children.is_empty() {
            return Err(ValidationError::HasChildren { id: id.to_string() }.into());
        }

        self.records.retain(|r| r.id != id);
        self.links
            .retain(|l| l.source_id != id && l.target_id != id);
        self.selection.retain(|s| s != id);
        self.rebuild()?;
        Ok(())
    }

    /// Live position update for one node (a drag step). Does not touch the
    /// selection; survives subsequent rebuilds via the position carry-over.
    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> Result<()> {
        let Some(idx) = self.tree.index_of(id) else {
            return Err(ValidationError::UnknownNode { id: id.to_string() }.into());
        };
        let node = self.tree.node_mut(idx);
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Reset the layout to the deterministic base, dropping every manual
    /// position.
    pub fn tidy(&mut self) {
        layout::tidy(&mut self.tree, &self.layout);
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Export the live state as a document. `parentId` always reflects the
    /// tree structure, never a stored field, and every node carries its
    /// current position.
    pub fn export(&self) -> GraphDocument {
        let nodes = self
            .tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let mut record = NodeRecord::new(
                    node.id.clone(),
                    self.tree.parent_id(idx),
                    node.name.clone(),
                    node.fact.clone(),
                );
                record.x = Some(node.x);
                record.y = Some(node.y);
                record
            })
            .collect();
        GraphDocument {
            nodes,
            links: self.links.clone(),
        }
    }

    /// Replace all state with a freshly loaded document. A malformed
    /// hierarchy leaves the current state untouched.
    pub fn load(&mut self, doc: GraphDocument) -> Result<()> {
        let mut tree = tree::build(&doc.nodes)?;
        layout::reconcile(&mut tree, &self.layout, &PositionMap::new());
        log::debug!("loaded document: {} nodes, {} links", doc.nodes.len(), doc.links.len());
        self.records = doc.nodes;
        self.links = doc.links;
        self.tree = tree;
        self.selection.clear();
        Ok(())
    }

    /// Rebuild the tree from the flat records, carrying current positions
    /// forward by id so only brand-new nodes land on base-layout spots.
    fn rebuild(&mut self) -> Result<(), GraphError> {
        let prior = layout::positions(&self.tree);
        let mut tree = tree::build(&self.records)?;
        layout::reconcile(&mut tree, &self.layout, &prior);
        self.tree = tree;

        let ids: HashSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
        self.selection.retain(|s| ids.contains(s.as_str()));
        log::debug!("rebuilt tree: {} nodes", self.records.len());
        Ok(())
    }
}

/// New-node id derivation: lowercase, all whitespace removed.
fn derive_id(name: &str) -> String {
    name.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}
