//! Keras-style layer graphs: declare layers, wire them into a graph,
//! compile the graph into a trainable saved model through an external
//! runtime, and decompile a saved model's graph back into constructor
//! statements.

pub mod compile;
pub mod config;
pub mod decompile;
pub mod dtype;
pub mod error;
pub mod graph;
pub mod layer;
pub mod naming;
pub mod optimizer;

// Re-exports: the types most callers need at `kgraph::X`
pub use compile::{CompileConfig, CompiledModel, Loss, ModelCompiler, PythonBridge, RuntimeBridge};
pub use config::Settings;
pub use decompile::{DecompileOptions, Decompiler, SavedGraph};
pub use dtype::{DataType, Dim, Shape};
pub use error::{BridgeError, CompileError, ConfigError, DecompileError, GraphError};
pub use graph::{AssembledGraph, LayerGraph, NodeId};
pub use layer::{KerasObject, LayerNode, LayerSpec};
pub use naming::NameRegistry;
pub use optimizer::Optimizer;
