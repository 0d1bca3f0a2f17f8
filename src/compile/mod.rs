//! Model compiler: assembled graph + loss + optimizer → persisted,
//! trainable model directory.
//!
//! The compiler renders a training script from an embedded template,
//! sends it with a JSON payload to a [`RuntimeBridge`], and checks that
//! the runtime left a saved model behind. A failed compile may leave a
//! partially written directory; callers must not trust its contents.

pub mod bridge;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::CompileError;
use crate::graph::{AssembledGraph, LayerGraph, NodeId};
use crate::layer::KerasObject;
use crate::optimizer::Optimizer;

pub use bridge::{BridgeOutput, PythonBridge, RuntimeBridge};

/// Substitution point for custom layer source in the script template.
pub const CUSTOM_DEFINITIONS_MARKER: &str = "# kgraph-custom-definitions";
pub const IGNORE_START: &str = "# kgraph-ignore";
pub const IGNORE_END: &str = "# kgraph-ignore-end";

/// Entry points every compiled model exposes.
pub const SIGNATURES: [&str; 3] = ["learn", "evaluate", "predict"];

pub const SAVED_MODEL_FILE: &str = "saved_model.pb";
pub const VERSION_MARKER: &str = "kgraph-version";
pub const MODEL_JSON_FILE: &str = "model.json";

const TRAIN_TEMPLATE: &str = include_str!("templates/train_model.py");
pub(crate) const DUMP_GRAPH_SCRIPT: &str = include_str!("templates/dump_graph.py");

// ─── Loss ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Loss {
    BinaryCrossentropy,
    SparseCategoricalCrossentropy,
    #[default]
    Mse,
}

impl Loss {
    pub fn as_str(self) -> &'static str {
        match self {
            Loss::BinaryCrossentropy => "binary_crossentropy",
            Loss::SparseCategoricalCrossentropy => "sparse_categorical_crossentropy",
            Loss::Mse => "mse",
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Loss {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary_crossentropy" => Ok(Loss::BinaryCrossentropy),
            "sparse_categorical_crossentropy" => Ok(Loss::SparseCategoricalCrossentropy),
            "mse" | "mean_squared_error" => Ok(Loss::Mse),
            other => Err(format!("unknown loss '{}'", other)),
        }
    }
}

impl Serialize for Loss {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ─── Config ───────────────────────────────────────────────────────

/// Everything a compile needs besides the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileConfig {
    pub loss: Loss,
    pub optimizer: Optimizer,
    /// Leading dimension of the zero tensors used to trace the entry
    /// points. Must be at least 1.
    pub batch_size: u64,
    pub save_dir: PathBuf,
    /// Where to write `model.json` and the runtime's model summary.
    pub model_info_save_dir: Option<PathBuf>,
    /// Also persist a CPU-only copy under `<save_dir>/cpu`.
    pub cpu_inference: bool,
}

impl CompileConfig {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            loss: Loss::default(),
            optimizer: Optimizer::default(),
            batch_size: 1,
            save_dir: save_dir.into(),
            model_info_save_dir: None,
            cpu_inference: false,
        }
    }

    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    pub fn optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn model_info_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_info_save_dir = Some(dir.into());
        self
    }

    pub fn cpu_inference(mut self, cpu_inference: bool) -> Self {
        self.cpu_inference = cpu_inference;
        self
    }
}

/// Payload the training script reads from stdin.
#[derive(Debug, Serialize)]
struct Payload<'a> {
    /// The model definition as a JSON string, not an object.
    model_config: String,
    optimizer: Value,
    loss: Loss,
    save_dir: &'a Path,
    model_definition_save_dir: Option<&'a Path>,
    batch_size: u64,
    cpu_inference: bool,
}

// ─── Script rendering ─────────────────────────────────────────────

/// Remove every `# kgraph-ignore` … `# kgraph-ignore-end` block. An
/// unterminated block runs to the end of the text.
pub fn strip_ignored(definition: &str) -> String {
    let mut out = String::with_capacity(definition.len());
    let mut rest = definition;
    while let Some(start) = find_ignore_start(rest) {
        out.push_str(&rest[..start]);
        let after = &rest[start + IGNORE_START.len()..];
        match after.find(IGNORE_END) {
            Some(end) => rest = &after[end + IGNORE_END.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Position of an ignore-block opener that is not itself an `-end` marker.
fn find_ignore_start(text: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find(IGNORE_START) {
        let at = offset + pos;
        if !text[at..].starts_with(IGNORE_END) {
            return Some(at);
        }
        offset = at + IGNORE_END.len();
    }
    None
}

/// Custom definitions with ignore blocks removed, first occurrence of
/// each kept, in the given order.
pub fn collect_definitions<S: AsRef<str>>(definitions: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for definition in definitions {
        let cleaned = strip_ignored(definition.as_ref());
        if cleaned.trim().is_empty() {
            continue;
        }
        if seen.insert(cleaned.clone()) {
            out.push(cleaned);
        }
    }
    out
}

/// The training script with `definitions` pasted at the marker.
pub fn render_script<S: AsRef<str>>(definitions: &[S]) -> String {
    let definitions = collect_definitions(definitions);
    TRAIN_TEMPLATE.replace(CUSTOM_DEFINITIONS_MARKER, &definitions.join("\n"))
}

// ─── Compiler ─────────────────────────────────────────────────────

/// A model persisted by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModel {
    pub dir: PathBuf,
    pub signatures: Vec<String>,
    /// Runtime stdout.
    pub log: String,
    /// blake3 of script and payload, also recorded in the version marker.
    pub fingerprint: String,
}

impl CompiledModel {
    pub fn saved_model_path(&self) -> PathBuf {
        self.dir.join(SAVED_MODEL_FILE)
    }
}

pub struct ModelCompiler<B> {
    bridge: B,
}

impl<B: RuntimeBridge> ModelCompiler<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Assemble the graph behind `outputs` and compile it.
    pub fn compile(
        &self,
        graph: &LayerGraph,
        outputs: &[NodeId],
        config: &CompileConfig,
    ) -> Result<CompiledModel, CompileError> {
        let assembled = graph.assemble(outputs)?;
        self.compile_assembled(&assembled, config)
    }

    pub fn compile_assembled(
        &self,
        assembled: &AssembledGraph,
        config: &CompileConfig,
    ) -> Result<CompiledModel, CompileError> {
        let definition = serde_json::to_value(&assembled.definition)?;
        debug!("assembled {} layers", assembled.order.len());
        self.compile_definition(&definition, &assembled.custom_definitions, config)
    }

    /// Compile an already serialized model definition.
    pub fn compile_definition<S: AsRef<str>>(
        &self,
        definition: &Value,
        custom_definitions: &[S],
        config: &CompileConfig,
    ) -> Result<CompiledModel, CompileError> {
        if config.batch_size == 0 {
            return Err(CompileError::BatchSize);
        }

        if let Some(dir) = &config.model_info_save_dir {
            create_dir(dir)?;
            let path = dir.join(MODEL_JSON_FILE);
            write_file(&path, &serde_json::to_string_pretty(definition)?)?;
            debug!("wrote model definition to {}", path.display());
        }
        create_dir(&config.save_dir)?;

        let script = render_script(custom_definitions);
        let payload = serde_json::to_string(&Payload {
            model_config: serde_json::to_string(definition)?,
            optimizer: config.optimizer.keras_config(),
            loss: config.loss,
            save_dir: &config.save_dir,
            model_definition_save_dir: config.model_info_save_dir.as_deref(),
            batch_size: config.batch_size,
            cpu_inference: config.cpu_inference,
        })?;

        info!(
            "compiling model ({} loss, {}) into {}",
            config.loss,
            config.optimizer,
            config.save_dir.display()
        );
        let output = self.bridge.run(&script, &payload)?;

        require_artifact(&config.save_dir)?;
        if config.cpu_inference {
            require_artifact(&config.save_dir.join("cpu"))?;
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(script.as_bytes());
        hasher.update(payload.as_bytes());
        let fingerprint = hasher.finalize().to_hex().to_string();

        write_file(
            &config.save_dir.join(VERSION_MARKER),
            &format!("{}\n{}\n", env!("CARGO_PKG_VERSION"), fingerprint),
        )?;
        info!("model saved to {}", config.save_dir.display());

        Ok(CompiledModel {
            dir: config.save_dir.clone(),
            signatures: SIGNATURES.iter().map(|s| s.to_string()).collect(),
            log: output.stdout,
            fingerprint,
        })
    }
}

fn require_artifact(dir: &Path) -> Result<(), CompileError> {
    if dir.join(SAVED_MODEL_FILE).is_file() {
        Ok(())
    } else {
        Err(CompileError::MissingArtifact(dir.to_path_buf()))
    }
}

fn create_dir(dir: &Path) -> Result<(), CompileError> {
    std::fs::create_dir_all(dir).map_err(|source| CompileError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), CompileError> {
    std::fs::write(path, contents).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests;
