//! Loading a persisted graph for decompilation.
//!
//! A saved model directory is read either from a pre-made JSON dump
//! (`graph_def.json`) or by asking the runtime to dump its graph.

use std::path::Path;

use log::info;
use serde_json::json;

use crate::compile::bridge::{PythonBridge, RuntimeBridge, DEFAULT_INTERPRETER};
use crate::compile::{DUMP_GRAPH_SCRIPT, SAVED_MODEL_FILE};
use crate::error::{BridgeError, DecompileError};

use super::raw::SavedGraph;

pub const GRAPH_DUMP_FILE: &str = "graph_def.json";

pub trait GraphLoader {
    fn load(&self, dir: &Path) -> Result<SavedGraph, DecompileError>;
}

/// Reads `<dir>/graph_def.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGraphLoader;

impl GraphLoader for JsonGraphLoader {
    fn load(&self, dir: &Path) -> Result<SavedGraph, DecompileError> {
        let path = dir.join(GRAPH_DUMP_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| DecompileError::Load {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(SavedGraph::from_json(&text)?)
    }
}

/// Runs the graph dump script against `<dir>/saved_model.pb`.
#[derive(Debug, Clone)]
pub struct RuntimeGraphLoader<B> {
    bridge: B,
}

impl<B: RuntimeBridge> RuntimeGraphLoader<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }
}

impl<B: RuntimeBridge> GraphLoader for RuntimeGraphLoader<B> {
    fn load(&self, dir: &Path) -> Result<SavedGraph, DecompileError> {
        let model = dir.join(SAVED_MODEL_FILE);
        if !model.is_file() {
            return Err(DecompileError::Load {
                path: dir.to_path_buf(),
                message: format!("no {} found", SAVED_MODEL_FILE),
            });
        }
        let payload = json!({ "model_dir": dir.to_string_lossy() }).to_string();
        let output = self.bridge.run(DUMP_GRAPH_SCRIPT, &payload)?;

        // The dump is the last line; anything before it is runtime chatter.
        let last = output
            .stdout
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("");
        SavedGraph::from_json(last).map_err(|e| {
            DecompileError::Bridge(BridgeError::Malformed {
                message: e.to_string(),
                stdout: output.stdout.clone(),
            })
        })
    }
}

/// Load the graph persisted in `dir`, preferring a JSON dump next to it.
pub fn load_saved_graph(dir: &Path) -> Result<SavedGraph, DecompileError> {
    load_saved_graph_with(dir, &PythonBridge::from_env(DEFAULT_INTERPRETER))
}

pub fn load_saved_graph_with<B: RuntimeBridge>(
    dir: &Path,
    bridge: &B,
) -> Result<SavedGraph, DecompileError> {
    if dir.join(GRAPH_DUMP_FILE).is_file() {
        info!("reading graph dump from {}", dir.display());
        JsonGraphLoader.load(dir)
    } else {
        info!("dumping graph of {} through the runtime", dir.display());
        RuntimeGraphLoader::new(bridge).load(dir)
    }
}
