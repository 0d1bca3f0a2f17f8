//! Raw node records of a persisted computation graph.
//!
//! Operand strings use the runtime's reference syntax: a leading `^`
//! marks a control dependency and a trailing `:N` or `:output:N` picks
//! an output slot. [`clean_name`] reduces either form to the node name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGraphNode {
    pub name: String,
    pub op: String,
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl RawGraphNode {
    pub fn new(name: &str, op: &str, inputs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            op: op.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A named subroutine of the graph (a traced `tf.function`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFunction {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<RawGraphNode>,
}

/// Main graph plus its function library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGraph {
    #[serde(default)]
    pub nodes: Vec<RawGraphNode>,
    #[serde(default)]
    pub functions: Vec<GraphFunction>,
}

impl SavedGraph {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Functions whose name contains `marker`, sorted by name.
    pub fn functions_matching(&self, marker: &str) -> Vec<&GraphFunction> {
        let mut matching: Vec<&GraphFunction> = self
            .functions
            .iter()
            .filter(|f| f.name.contains(marker))
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        matching
    }
}

/// Strip a control-dependency marker and any output-slot qualifier.
pub fn clean_name(operand: &str) -> &str {
    let name = operand.strip_prefix('^').unwrap_or(operand);
    match name.find(':') {
        Some(colon) => &name[..colon],
        None => name,
    }
}

/// Nodes keyed by cleaned name. Later duplicates win.
pub fn node_table(nodes: &[RawGraphNode]) -> HashMap<&str, &RawGraphNode> {
    nodes.iter().map(|n| (clean_name(&n.name), n)).collect()
}
