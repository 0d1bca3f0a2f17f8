use std::path::PathBuf;

use thiserror::Error;

use crate::graph::NodeId;

/// Problems building or assembling a layer graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid parameter for layer '{layer}': {message}")]
    InvalidParameter { layer: String, message: String },

    #[error("layer '{layer}' expects {expected} input(s), got {found}")]
    Arity {
        layer: String,
        expected: String,
        found: usize,
    },

    #[error("unknown node id {0:?}")]
    UnknownNode(NodeId),

    #[error("layer name '{0}' is already used in this graph")]
    DuplicateName(String),

    #[error("cycle detected: layer '{0}' depends on itself")]
    Cycle(String),

    #[error("no output layers given")]
    NoOutputs,
}

/// Failures talking to the external runtime process.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to start runtime '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("runtime i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("runtime exited with {status}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    Exit {
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("runtime produced unparsable output: {message}\n--- stdout ---\n{stdout}")]
    Malformed { message: String, stdout: String },
}

/// Failures turning an assembled graph into a persisted model.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("cannot serialize model definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("runtime finished but '{0}' holds no saved model")]
    MissingArtifact(PathBuf),

    #[error("batch size must be at least 1")]
    BatchSize,
}

/// Failures loading a persisted graph for decompilation.
#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("cannot load saved model from '{path}': {message}")]
    Load { path: PathBuf, message: String },

    #[error("graph dump is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Problems reading `kgraph.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Invalid {
        path: PathBuf,
        line: usize,
        message: String,
    },
}
