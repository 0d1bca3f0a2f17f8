//! Layer nodes and their Keras config records.
//!
//! Each layer kind is a plain struct with typed fields and chainable
//! setters. [`LayerKind`] is the sum of all kinds; a [`LayerNode`] pairs a
//! kind with its identity (name, dtype, trainable) and its upstream node
//! ids once it has been added to a [`crate::graph::LayerGraph`].

pub mod constraint;
pub mod conv;
pub mod basic;
pub mod custom;
pub mod initializer;
pub mod merge;
pub mod norm;
pub mod recurrent;
pub mod regularizer;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::dtype::{DataType, Shape};
use crate::graph::NodeId;

pub use self::conv::{Conv1D, Conv2D, GlobalPooling1D, PoolOp, Pooling1D, Pooling2D};
pub use self::basic::{Activation, Dense, Dropout, Embedding, Flatten, Input, Reshape};
pub use self::custom::{Custom, RandomFourierFeatures};
pub use self::merge::{Concatenate, Merge, MergeOp};
pub use self::norm::{BatchNormalization, LayerNormalization};
pub use self::recurrent::{Recurrent, RecurrentCell};
pub use constraint::Constraint;
pub use initializer::Initializer;
pub use regularizer::Regularizer;

// ─── Sub-object serialization ─────────────────────────────────────

/// Anything that serializes to a `{class_name, config}` record:
/// initializers, regularizers, constraints, optimizers.
pub trait KerasObject {
    fn keras_config(&self) -> Value;
}

/// Ordered parameter map for a layer config.
#[derive(Debug, Clone, Default)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Insert a sub-object (initializer, regularizer, constraint) by
    /// delegating to its own config; `None` becomes `null`.
    pub fn object<T: KerasObject>(mut self, key: &str, object: Option<&T>) -> Self {
        debug_assert!(
            key.ends_with("initializer")
                || key.ends_with("regularizer")
                || key.ends_with("constraint"),
            "sub-object key '{}' has no sub-object suffix",
            key
        );
        let value = object.map_or(Value::Null, T::keras_config);
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn extend(mut self, other: Map<String, Value>) -> Self {
        self.0.extend(other);
        self
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

// ─── Layer kinds ──────────────────────────────────────────────────

/// How many upstream nodes a kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    One,
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::None => n == 0,
            Arity::One => n == 1,
            Arity::AtLeast(min) => n >= min,
            Arity::Any => true,
        }
    }

    pub fn describe(self) -> String {
        match self {
            Arity::None => "no".to_string(),
            Arity::One => "exactly 1".to_string(),
            Arity::AtLeast(min) => format!("at least {}", min),
            Arity::Any => "any number of".to_string(),
        }
    }
}

/// Behaviour shared by every layer kind.
pub trait LayerType {
    /// Keras class name, e.g. `"Dense"`.
    fn class_name(&self) -> &str;

    /// Registry base for generated names, e.g. `"dense"`.
    fn base_name(&self) -> &str;

    /// Kind-specific config entries. `name`, `dtype` and `trainable` are
    /// added by the node.
    fn params(&self) -> Params;

    fn arity(&self) -> Arity {
        Arity::One
    }

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Source text the runtime needs to know this class.
    fn custom_definition(&self) -> Option<&str> {
        None
    }
}

macro_rules! layer_kinds {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Every supported layer kind.
        #[derive(Debug, Clone)]
        pub enum LayerKind {
            $($variant($ty)),*
        }

        impl LayerKind {
            pub fn as_layer_type(&self) -> &dyn LayerType {
                match self {
                    $(LayerKind::$variant(layer) => layer),*
                }
            }
        }

        $(
            impl From<$ty> for LayerKind {
                fn from(layer: $ty) -> Self {
                    LayerKind::$variant(layer)
                }
            }

            impl From<$ty> for LayerSpec {
                fn from(layer: $ty) -> Self {
                    LayerSpec::new(LayerKind::$variant(layer))
                }
            }

            impl IntoLayer for $ty {}
        )*
    };
}

layer_kinds! {
    Input(Input),
    Dense(Dense),
    Activation(Activation),
    Dropout(Dropout),
    Flatten(Flatten),
    Reshape(Reshape),
    Embedding(Embedding),
    Conv1D(Conv1D),
    Conv2D(Conv2D),
    Pooling1D(Pooling1D),
    Pooling2D(Pooling2D),
    GlobalPooling1D(GlobalPooling1D),
    Concatenate(Concatenate),
    Merge(Merge),
    Recurrent(Recurrent),
    BatchNormalization(BatchNormalization),
    LayerNormalization(LayerNormalization),
    RandomFourierFeatures(RandomFourierFeatures),
    Custom(Custom),
}

// ─── Layer spec ───────────────────────────────────────────────────

/// A layer kind plus the identity options every layer accepts.
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub kind: LayerKind,
    pub name: Option<String>,
    pub dtype: Option<DataType>,
    pub trainable: bool,
}

impl LayerSpec {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            name: None,
            dtype: None,
            trainable: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn trainable(mut self, trainable: bool) -> Self {
        self.trainable = trainable;
        self
    }
}

impl From<LayerKind> for LayerSpec {
    fn from(kind: LayerKind) -> Self {
        LayerSpec::new(kind)
    }
}

/// Shortcuts that turn a bare layer kind into a [`LayerSpec`].
pub trait IntoLayer: Into<LayerSpec> {
    fn with_name(self, name: impl Into<String>) -> LayerSpec {
        self.into().named(name)
    }

    fn with_dtype(self, dtype: DataType) -> LayerSpec {
        self.into().dtype(dtype)
    }

    fn frozen(self) -> LayerSpec {
        self.into().trainable(false)
    }
}

impl IntoLayer for LayerSpec {}

// ─── Config record ────────────────────────────────────────────────

/// One edge in `inbound_nodes`: `[upstream_name, 0, 0, {}]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundNode(pub String, pub u32, pub u32, pub Map<String, Value>);

impl InboundNode {
    pub fn new(upstream: &str) -> Self {
        InboundNode(upstream.to_string(), 0, 0, Map::new())
    }
}

/// The per-layer record of a Keras functional model definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerConfig {
    pub class_name: String,
    pub name: String,
    pub config: Map<String, Value>,
    pub inbound_nodes: Vec<Vec<InboundNode>>,
}

// ─── Layer node ───────────────────────────────────────────────────

/// A layer inside a graph.
#[derive(Debug, Clone)]
pub struct LayerNode {
    pub(crate) name: String,
    pub(crate) kind: LayerKind,
    pub(crate) dtype: DataType,
    pub(crate) trainable: bool,
    pub(crate) inputs: Vec<NodeId>,
}

impl LayerNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn trainable(&self) -> bool {
        self.trainable
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, LayerKind::Input(_))
    }

    /// Declared shape, only known for input layers.
    pub fn shape(&self) -> Option<&Shape> {
        match &self.kind {
            LayerKind::Input(input) => Some(&input.shape),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &str {
        self.kind.as_layer_type().class_name()
    }

    pub fn custom_definition(&self) -> Option<&str> {
        self.kind.as_layer_type().custom_definition()
    }

    /// Config record with `upstream` (names of this node's inputs, in call
    /// order) as the single inbound node list.
    pub fn keras_layer_config(&self, upstream: &[&str]) -> LayerConfig {
        let layer = self.kind.as_layer_type();
        let mut params = layer
            .params()
            .set("name", self.name.as_str())
            .set("dtype", self.dtype.as_str());
        if !self.is_input() {
            params = params.set("trainable", self.trainable);
        }

        let inbound = upstream.iter().map(|name| InboundNode::new(name)).collect();

        LayerConfig {
            class_name: layer.class_name().to_string(),
            name: self.name.clone(),
            config: params.into_map(),
            inbound_nodes: vec![inbound],
        }
    }
}

#[cfg(test)]
mod tests;
