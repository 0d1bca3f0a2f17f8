//! Graph assembler: node DAG → Keras functional model definition.
//!
//! Walks upstream from each requested output, emitting a node only after
//! all of its inputs have been emitted. Each node is emitted once no
//! matter how many paths reach it. A node met again while it is still on
//! the walk stack closes a cycle and aborts assembly.

use std::collections::HashMap;

use serde::Serialize;

use super::{LayerGraph, NodeId};
use crate::dtype::{DataType, Shape};
use crate::error::GraphError;
use crate::layer::LayerConfig;

pub const MODEL_CLASS_NAME: &str = "Functional";
pub const KERAS_VERSION: &str = "2.6.0";
pub const BACKEND: &str = "tensorflow";

// ─── Document types ───────────────────────────────────────────────

/// `[layer_name, node_index, tensor_index]` in `input_layers` /
/// `output_layers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerRef(pub String, pub u32, pub u32);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub name: String,
    pub layers: Vec<LayerConfig>,
    pub input_layers: Vec<LayerRef>,
    pub output_layers: Vec<LayerRef>,
}

/// The JSON document the runtime's model loader reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDefinition {
    pub class_name: String,
    pub config: ModelConfig,
    pub keras_version: String,
    pub backend: String,
}

/// Declared shape and dtype of one model input, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSignature {
    pub name: String,
    pub shape: Shape,
    pub dtype: DataType,
}

/// Result of assembling a graph.
#[derive(Debug, Clone)]
pub struct AssembledGraph {
    /// Node ids in emission order.
    pub order: Vec<NodeId>,
    pub definition: ModelDefinition,
    pub inputs: Vec<InputSignature>,
    /// Custom layer source text, in emission order, duplicates kept.
    pub custom_definitions: Vec<String>,
}

impl AssembledGraph {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.definition)
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.definition
            .config
            .layers
            .iter()
            .map(|l| l.name.as_str())
            .collect()
    }
}

// ─── Traversal ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Post-order walk from `root`, appending newly finished nodes to `order`.
fn visit(
    graph: &LayerGraph,
    root: NodeId,
    marks: &mut HashMap<NodeId, Mark>,
    order: &mut Vec<NodeId>,
) -> Result<(), GraphError> {
    if marks.contains_key(&root) {
        return Ok(());
    }
    marks.insert(root, Mark::Visiting);
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];

    while let Some(&(id, next)) = stack.last() {
        let node = graph.node(id)?;
        match node.inputs().get(next).copied() {
            Some(upstream) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                match marks.get(&upstream) {
                    Some(Mark::Done) => {}
                    Some(Mark::Visiting) => {
                        let name = graph.node(upstream)?.name().to_string();
                        return Err(GraphError::Cycle(name));
                    }
                    None => {
                        graph.node(upstream)?;
                        marks.insert(upstream, Mark::Visiting);
                        stack.push((upstream, 0));
                    }
                }
            }
            None => {
                stack.pop();
                marks.insert(id, Mark::Done);
                order.push(id);
            }
        }
    }
    Ok(())
}

/// Linearize everything upstream of `outputs` into a model definition.
pub fn assemble(graph: &LayerGraph, outputs: &[NodeId]) -> Result<AssembledGraph, GraphError> {
    if outputs.is_empty() {
        return Err(GraphError::NoOutputs);
    }

    let mut marks = HashMap::new();
    let mut order = Vec::with_capacity(graph.len());
    for &output in outputs {
        graph.node(output)?;
        visit(graph, output, &mut marks, &mut order)?;
    }

    let mut layers = Vec::with_capacity(order.len());
    let mut input_layers = Vec::new();
    let mut inputs = Vec::new();
    let mut custom_definitions = Vec::new();

    for &id in &order {
        let node = graph.node(id)?;
        if let Some(shape) = node.shape() {
            input_layers.push(LayerRef(node.name().to_string(), 0, 0));
            inputs.push(InputSignature {
                name: node.name().to_string(),
                shape: shape.clone(),
                dtype: node.dtype(),
            });
        }
        if let Some(definition) = node.custom_definition() {
            custom_definitions.push(definition.to_string());
        }
        layers.push(graph.keras_layer_config(id)?);
    }

    let mut output_layers: Vec<LayerRef> = Vec::with_capacity(outputs.len());
    for &output in outputs {
        let name = graph.node(output)?.name();
        if !output_layers.iter().any(|r| r.0 == name) {
            output_layers.push(LayerRef(name.to_string(), 0, 0));
        }
    }

    Ok(AssembledGraph {
        order,
        definition: ModelDefinition {
            class_name: MODEL_CLASS_NAME.to_string(),
            config: ModelConfig {
                name: "model".to_string(),
                layers,
                input_layers,
                output_layers,
            },
            keras_version: KERAS_VERSION.to_string(),
            backend: BACKEND.to_string(),
        },
        inputs,
        custom_definitions,
    })
}
