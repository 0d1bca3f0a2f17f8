//! Layer graph arena.
//!
//! Layers are stored in insertion order and addressed by [`NodeId`].
//! Upstream references are node ids, so a node may feed any number of
//! consumers. References can be rewired with [`LayerGraph::set_inputs`]
//! until the graph is assembled, which is why assembly checks for cycles.

pub mod assemble;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GraphError;
use crate::layer::{LayerConfig, LayerNode, LayerSpec, LayerType};
use crate::naming::NameRegistry;

pub use assemble::{AssembledGraph, InputSignature, LayerRef, ModelConfig, ModelDefinition};

/// Index of a layer inside its [`LayerGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owns every layer of a model under construction.
#[derive(Debug)]
pub struct LayerGraph {
    nodes: Vec<LayerNode>,
    names: HashMap<String, NodeId>,
    registry: Arc<NameRegistry>,
}

impl Default for LayerGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerGraph {
    /// Graph that names its layers from the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(NameRegistry::global())
    }

    pub fn with_registry(registry: Arc<NameRegistry>) -> Self {
        Self {
            nodes: Vec::new(),
            names: HashMap::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<NameRegistry> {
        &self.registry
    }

    /// Add a layer fed by `inputs` (in call order).
    pub fn add(
        &mut self,
        spec: impl Into<LayerSpec>,
        inputs: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let spec = spec.into();
        let layer = spec.kind.as_layer_type();

        let name = match spec.name {
            Some(name) => {
                if self.names.contains_key(&name) {
                    return Err(GraphError::DuplicateName(name));
                }
                name
            }
            None => self.fresh_name(layer.base_name()),
        };

        layer
            .validate()
            .map_err(|message| GraphError::InvalidParameter {
                layer: name.clone(),
                message,
            })?;
        self.check_inputs(&name, layer, inputs)?;

        let id = NodeId(self.nodes.len());
        self.nodes.push(LayerNode {
            name: name.clone(),
            dtype: spec.dtype.unwrap_or_default(),
            trainable: spec.trainable,
            kind: spec.kind,
            inputs: inputs.to_vec(),
        });
        self.names.insert(name, id);
        Ok(id)
    }

    /// Add an input layer.
    pub fn input(&mut self, spec: impl Into<LayerSpec>) -> Result<NodeId, GraphError> {
        self.add(spec, &[])
    }

    /// Chain `layers` one after another starting from a new input layer.
    /// Returns the last node.
    pub fn sequential(
        &mut self,
        input: impl Into<LayerSpec>,
        layers: Vec<LayerSpec>,
    ) -> Result<NodeId, GraphError> {
        let mut last = self.input(input)?;
        for layer in layers {
            last = self.add(layer, &[last])?;
        }
        Ok(last)
    }

    /// Replace the upstream references of `id`.
    pub fn set_inputs(&mut self, id: NodeId, inputs: &[NodeId]) -> Result<(), GraphError> {
        let node = self.node(id)?;
        let name = node.name().to_string();
        self.check_inputs(&name, node.kind().as_layer_type(), inputs)?;
        self.nodes[id.0].inputs = inputs.to_vec();
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Result<&LayerNode, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &LayerNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Keras config record of one layer, edges resolved to upstream names.
    pub fn keras_layer_config(&self, id: NodeId) -> Result<LayerConfig, GraphError> {
        let node = self.node(id)?;
        let upstream = node
            .inputs()
            .iter()
            .map(|&input| self.node(input).map(LayerNode::name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(node.keras_layer_config(&upstream))
    }

    /// Linearize the graph behind `outputs`. See [`assemble::assemble`].
    pub fn assemble(&self, outputs: &[NodeId]) -> Result<AssembledGraph, GraphError> {
        assemble::assemble(self, outputs)
    }

    fn fresh_name(&self, base: &str) -> String {
        loop {
            let name = self.registry.unique_name(base);
            if !self.names.contains_key(&name) {
                return name;
            }
        }
    }

    fn check_inputs(
        &self,
        name: &str,
        layer: &dyn LayerType,
        inputs: &[NodeId],
    ) -> Result<(), GraphError> {
        let arity = layer.arity();
        if !arity.accepts(inputs.len()) {
            return Err(GraphError::Arity {
                layer: name.to_string(),
                expected: arity.describe(),
                found: inputs.len(),
            });
        }
        for &input in inputs {
            if input.0 >= self.nodes.len() {
                return Err(GraphError::UnknownNode(input));
            }
        }
        Ok(())
    }
}
