use std::cell::RefCell;

use super::*;
use crate::error::{BridgeError, GraphError};
use crate::layer::{Custom, Dense, Input, IntoLayer};
use crate::naming::NameRegistry;

/// Records every call and plays the runtime's part on disk.
#[derive(Default)]
struct FakeBridge {
    calls: RefCell<Vec<(String, String)>>,
    fail_with: Option<String>,
    write_artifact: bool,
}

impl FakeBridge {
    fn working() -> Self {
        Self {
            write_artifact: true,
            ..Self::default()
        }
    }

    fn payload(&self) -> Value {
        let calls = self.calls.borrow();
        serde_json::from_str(&calls[0].1).unwrap()
    }

    fn script(&self) -> String {
        self.calls.borrow()[0].0.clone()
    }
}

impl RuntimeBridge for FakeBridge {
    fn run(&self, script: &str, payload: &str) -> Result<BridgeOutput, BridgeError> {
        self.calls
            .borrow_mut()
            .push((script.to_string(), payload.to_string()));
        if let Some(stderr) = &self.fail_with {
            return Err(BridgeError::Exit {
                status: "exit status: 1".to_string(),
                stdout: "Initialising model\n".to_string(),
                stderr: stderr.clone(),
            });
        }
        if self.write_artifact {
            let request: Value = serde_json::from_str(payload).unwrap();
            let dir = PathBuf::from(request["save_dir"].as_str().unwrap());
            std::fs::write(dir.join(SAVED_MODEL_FILE), b"pb").unwrap();
            if request["cpu_inference"] == true {
                std::fs::create_dir_all(dir.join("cpu")).unwrap();
                std::fs::write(dir.join("cpu").join(SAVED_MODEL_FILE), b"pb").unwrap();
            }
        }
        Ok(BridgeOutput {
            stdout: "Completed model\n".to_string(),
            stderr: String::new(),
        })
    }
}

fn small_graph() -> (LayerGraph, NodeId) {
    let mut graph = LayerGraph::with_registry(NameRegistry::shared());
    let x = graph.input(Input::batched(&[4]).with_name("features")).unwrap();
    let h = graph.add(Dense::new(8).activation("relu"), &[x]).unwrap();
    let out = graph.add(Dense::new(1).with_name("out"), &[h]).unwrap();
    (graph, out)
}

#[test]
fn test_strip_ignored_blocks() {
    let text = "keep1\n# kgraph-ignore\ndrop\n# kgraph-ignore-end\nkeep2";
    assert_eq!(strip_ignored(text), "keep1\n\nkeep2");
    assert_eq!(strip_ignored("a # kgraph-ignore b"), "a ");
    assert_eq!(strip_ignored("no markers"), "no markers");
    assert_eq!(strip_ignored("x # kgraph-ignore-end y"), "x # kgraph-ignore-end y");
}

#[test]
fn test_definitions_deduplicated_in_order() {
    let defs = [
        "class B: pass",
        "class A: pass",
        "class B: pass",
        "# kgraph-ignore\nimport helper\n# kgraph-ignore-end\nclass A: pass",
    ];
    assert_eq!(
        collect_definitions(&defs),
        vec!["class B: pass", "class A: pass", "\nclass A: pass"]
    );
}

#[test]
fn test_render_script_fills_marker() {
    let script = render_script(&["class Scaler(tf.keras.layers.Layer): pass"]);
    assert!(!script.contains(CUSTOM_DEFINITIONS_MARKER));
    assert!(script.contains("class Scaler(tf.keras.layers.Layer): pass"));
    let marker_free = render_script::<&str>(&[]);
    assert!(marker_free.contains("custom_objects = {}"));
    for signature in SIGNATURES {
        assert!(marker_free.contains(&format!("\"{}\": tm.{}", signature, signature)));
    }
}

#[test]
fn test_compile_success() {
    let dir = tempfile::tempdir().unwrap();
    let save_dir = dir.path().join("model");
    let info_dir = dir.path().join("info");
    let (graph, out) = small_graph();
    let config = CompileConfig::new(&save_dir)
        .loss(Loss::BinaryCrossentropy)
        .optimizer(Optimizer::sgd().learning_rate(0.05))
        .batch_size(16)
        .model_info_save_dir(&info_dir);

    let compiler = ModelCompiler::new(FakeBridge::working());
    let compiled = compiler.compile(&graph, &[out], &config).unwrap();

    assert_eq!(compiled.dir, save_dir);
    assert_eq!(compiled.signatures, vec!["learn", "evaluate", "predict"]);
    assert_eq!(compiled.log, "Completed model\n");
    assert!(compiled.saved_model_path().is_file());

    let marker = std::fs::read_to_string(save_dir.join(VERSION_MARKER)).unwrap();
    assert!(marker.starts_with(env!("CARGO_PKG_VERSION")));
    assert!(marker.contains(&compiled.fingerprint));

    let model_json = std::fs::read_to_string(info_dir.join(MODEL_JSON_FILE)).unwrap();
    let definition: Value = serde_json::from_str(&model_json).unwrap();
    assert_eq!(definition["class_name"], "Functional");

    let payload = compiler.bridge().payload();
    assert_eq!(payload["loss"], "binary_crossentropy");
    assert_eq!(payload["batch_size"], 16);
    assert_eq!(payload["cpu_inference"], false);
    assert_eq!(payload["optimizer"]["class_name"], "SGD");
    assert_eq!(payload["optimizer"]["config"]["learning_rate"], 0.05);
    let model_config: Value =
        serde_json::from_str(payload["model_config"].as_str().unwrap()).unwrap();
    assert_eq!(model_config, definition);
}

#[test]
fn test_defaults_in_payload() {
    let dir = tempfile::tempdir().unwrap();
    let (graph, out) = small_graph();
    let compiler = ModelCompiler::new(FakeBridge::working());
    compiler
        .compile(&graph, &[out], &CompileConfig::new(dir.path()))
        .unwrap();

    let payload = compiler.bridge().payload();
    assert_eq!(payload["loss"], "mse");
    assert_eq!(payload["batch_size"], 1);
    assert_eq!(payload["optimizer"]["class_name"], "Adam");
    assert_eq!(payload["model_definition_save_dir"], Value::Null);
}

#[test]
fn test_runtime_failure_surfaces_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let (graph, out) = small_graph();
    let bridge = FakeBridge {
        fail_with: Some("ValueError: bad shape".to_string()),
        ..FakeBridge::default()
    };
    let err = ModelCompiler::new(bridge)
        .compile(&graph, &[out], &CompileConfig::new(dir.path()))
        .unwrap_err();
    match err {
        CompileError::Bridge(BridgeError::Exit { stderr, .. }) => {
            assert_eq!(stderr, "ValueError: bad shape")
        }
        other => panic!("expected bridge exit error, got {:?}", other),
    }
    assert!(!dir.path().join(VERSION_MARKER).exists());
}

#[test]
fn test_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (graph, out) = small_graph();
    let err = ModelCompiler::new(FakeBridge::default())
        .compile(&graph, &[out], &CompileConfig::new(dir.path()))
        .unwrap_err();
    assert!(matches!(err, CompileError::MissingArtifact(p) if p == dir.path()));
}

#[test]
fn test_cpu_inference_copy_required() {
    let dir = tempfile::tempdir().unwrap();
    let (graph, out) = small_graph();
    let config = CompileConfig::new(dir.path()).cpu_inference(true);
    ModelCompiler::new(FakeBridge::working())
        .compile(&graph, &[out], &config)
        .unwrap();
    assert!(dir.path().join("cpu").join(SAVED_MODEL_FILE).is_file());
}

#[test]
fn test_zero_batch_size_rejected_before_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let (graph, out) = small_graph();
    let compiler = ModelCompiler::new(FakeBridge::working());
    let err = compiler
        .compile(&graph, &[out], &CompileConfig::new(dir.path()).batch_size(0))
        .unwrap_err();
    assert!(matches!(err, CompileError::BatchSize));
    assert!(compiler.bridge().calls.borrow().is_empty());
}

#[test]
fn test_cyclic_graph_never_reaches_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let (mut graph, out) = small_graph();
    graph.set_inputs(out, &[out]).unwrap();
    let compiler = ModelCompiler::new(FakeBridge::working());
    let err = compiler
        .compile(&graph, &[out], &CompileConfig::new(dir.path()))
        .unwrap_err();
    assert!(matches!(err, CompileError::Graph(GraphError::Cycle(_))));
    assert!(compiler.bridge().calls.borrow().is_empty());
}

#[test]
fn test_custom_definitions_reach_script_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut graph = LayerGraph::with_registry(NameRegistry::shared());
    let source = "class Scale(tf.keras.layers.Layer):\n    pass\ncustom_objects[\"Scale\"] = Scale";
    let x = graph.input(Input::batched(&[2])).unwrap();
    let a = graph.add(Custom::new("Scale").definition(source), &[x]).unwrap();
    let b = graph.add(Custom::new("Scale").definition(source), &[a]).unwrap();

    let compiler = ModelCompiler::new(FakeBridge::working());
    compiler
        .compile(&graph, &[b], &CompileConfig::new(dir.path()))
        .unwrap();
    let script = compiler.bridge().script();
    assert_eq!(script.matches("class Scale(").count(), 1);
}

#[test]
fn test_loss_parsing() {
    assert_eq!("mse".parse::<Loss>(), Ok(Loss::Mse));
    assert_eq!(
        "sparse_categorical_crossentropy".parse::<Loss>(),
        Ok(Loss::SparseCategoricalCrossentropy)
    );
    assert!("hinge".parse::<Loss>().is_err());
}
