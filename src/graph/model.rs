use serde::{Deserialize, Serialize};

/// One node in its flat, persisted form.
///
/// `id` is the stable user-facing key. An empty `parent_id` marks the root.
/// `x`/`y` are only present once a document has been saved (or a node moved);
/// freshly created nodes have neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub parent_id: String,
    pub name: String,
    #[serde(default)]
    pub fact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl NodeRecord {
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
        fact: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            name: name.into(),
            fact: fact.into(),
            x: None,
            y: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }
}

/// A free-form captioned line between two nodes, outside the hierarchy.
///
/// Direction carries no meaning: a line A→B and a line B→A are the same line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraEdge {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub joining_fact: String,
}

impl ExtraEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        joining_fact: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            joining_fact: joining_fact.into(),
        }
    }

    /// True when this line joins `a` and `b`, in either orientation.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source_id == a && self.target_id == b)
            || (self.source_id == b && self.target_id == a)
    }
}

/// The complete persisted form of a graph: flat nodes plus extra lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub links: Vec<ExtraEdge>,
}

/// The built-in starter graph, used by `init` and `view --demo`.
pub fn demo_document() -> GraphDocument {
    let chicken_fact = "Chickens can fly, but only for short distances. \
         The chicken is the closest living relative of the T-rex.";
    GraphDocument {
        nodes: vec![
            NodeRecord::new("food", "", "Food", ""),
            NodeRecord::new("meat", "food", "Meat", ""),
            NodeRecord::new("carbs", "food", "Carbs", ""),
            NodeRecord::new("veggies", "food", "Veggies", ""),
            NodeRecord::new("salmon", "meat", "Salmon", ""),
            NodeRecord::new("steak", "meat", "Steak", ""),
            NodeRecord::new("chicken", "meat", "Chicken", chicken_fact),
            NodeRecord::new("round", "steak", "Round", ""),
            NodeRecord::new("ribeye", "steak", "Ribeye", ""),
            NodeRecord::new("tbone", "steak", "T-Bone", ""),
        ],
        links: Vec::new(),
    }
}
