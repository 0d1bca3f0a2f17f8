use super::*;
use crate::compile::bridge::{BridgeOutput, RuntimeBridge};
use crate::error::{BridgeError, DecompileError};
use std::path::Path;

fn learn(nodes: Vec<RawGraphNode>) -> SavedGraph {
    SavedGraph {
        nodes: Vec::new(),
        functions: vec![GraphFunction {
            name: "__inference_learn_512".to_string(),
            nodes,
        }],
    }
}

fn node(name: &str, op: &str, inputs: &[&str]) -> RawGraphNode {
    RawGraphNode::new(name, op, inputs)
}

fn decompile(graph: &SavedGraph) -> String {
    Decompiler::default().decompile(graph)
}

#[test]
fn test_shared_operand_defined_once() {
    let graph = learn(vec![
        node("x", "Placeholder", &[]),
        node("a", "Relu", &["x"]),
        node("b", "Neg", &["x:0"]),
    ]);
    assert_eq!(
        decompile(&graph),
        "let x = op::Placeholder(scope.sub_scope(\"x\"));\n\
         let a = op::Relu(scope.sub_scope(\"a\"), x);\n\
         let b = op::Neg(scope.sub_scope(\"b\"), x);"
    );
}

#[test]
fn test_missing_operand_becomes_placeholder() {
    let graph = learn(vec![node("y", "Identity", &["ghost"])]);
    let vars = Decompiler::default().decompile_variables(&graph);
    assert_eq!(vars.len(), 1);
    assert_eq!(
        vars[0].statement,
        "let y = op::Identity(scope.sub_scope(\"y\"), unresolved(\"ghost\"));"
    );
    assert_eq!(vars[0].unresolved, vec!["ghost"]);
}

#[test]
fn test_training_step_reconstruction() {
    let graph = learn(vec![
        node(
            "dense/MatMul/ReadVariableOp",
            "ReadVariableOp",
            &["dense_matmul_readvariableop_resource"],
        ),
        node(
            "dense/MatMul",
            "MatMul",
            &["inputs", "dense/MatMul/ReadVariableOp:value:0"],
        ),
        node("inputs", "Placeholder", &[]),
        node("StatefulPartitionedCall", "StatefulPartitionedCall", &["inputs"]),
        node(
            "Identity",
            "Identity",
            &["dense/MatMul:product:0", "^StatefulPartitionedCall"],
        ),
    ]);
    insta::assert_snapshot!(decompile(&graph), @r###"
    let dense_matmul_readvariableop_resource = op::VarHandleOp(scope.sub_scope("dense_matmul_readvariableop_resource"));
    let dense_matmul_readvariableop = op::ReadVariableOp(scope.sub_scope("dense/MatMul/ReadVariableOp"), dense_matmul_readvariableop_resource);
    let inputs = op::Placeholder(scope.sub_scope("inputs"));
    let dense_matmul = op::MatMul(scope.sub_scope("dense/MatMul"), inputs, dense_matmul_readvariableop);
    let identity = op::Identity(scope.sub_scope("Identity"), dense_matmul, unresolved("StatefulPartitionedCall"));
    "###);
}

#[test]
fn test_internal_calls_skipped() {
    let graph = learn(vec![
        node("StatefulPartitionedCall_3", "StatefulPartitionedCall", &[]),
        node("PartitionedCall", "PartitionedCall", &[]),
        node("kept", "NoOp", &[]),
    ]);
    assert_eq!(decompile(&graph), "let kept = op::NoOp(scope.sub_scope(\"kept\"));");
}

#[test]
fn test_backfill_uses_resource_defined_later() {
    let graph = learn(vec![
        node("w_read", "ReadVariableOp", &["w"]),
        node("w_assign", "AssignVariableOp", &["w_resource", "v"]),
    ]);
    let vars = Decompiler::default().decompile_variables(&graph);
    let read = vars.iter().find(|v| v.node == "w_read").unwrap();
    assert_eq!(
        read.statement,
        "let w_read = op::ReadVariableOp(scope.sub_scope(\"w_read\"), w_resource);"
    );
    assert!(read.unresolved.is_empty());

    let assign = vars.iter().find(|v| v.node == "w_assign").unwrap();
    assert!(assign.statement.contains("unresolved(\"v\")"));
    assert_eq!(assign.unresolved, vec!["v"]);
}

#[test]
fn test_main_graph_statements_discarded() {
    let mut graph = learn(vec![node("step", "AssignAddVariableOp", &["counter"])]);
    graph.nodes = vec![node("counter", "VarHandleOp", &[])];

    // The function still refers to the main graph's identifier.
    assert_eq!(
        decompile(&graph),
        "let step = op::AssignAddVariableOp(scope.sub_scope(\"step\"), counter);"
    );

    let keep_main = Decompiler::new(DecompileOptions {
        include_main_graph: true,
        ..DecompileOptions::default()
    });
    let text = keep_main.decompile(&graph);
    assert!(text.starts_with("let counter = op::VarHandleOp(scope.sub_scope(\"counter\"));\n"));
}

#[test]
fn test_functions_in_name_order_and_filtered() {
    let graph = SavedGraph {
        nodes: Vec::new(),
        functions: vec![
            GraphFunction {
                name: "__inference_learn_2".to_string(),
                nodes: vec![node("second", "NoOp", &[])],
            },
            GraphFunction {
                name: "__inference_predict_3".to_string(),
                nodes: vec![node("skipped", "NoOp", &[])],
            },
            GraphFunction {
                name: "__inference_learn_1".to_string(),
                nodes: vec![node("first", "NoOp", &[])],
            },
        ],
    };
    let idents: Vec<String> = Decompiler::default()
        .decompile_variables(&graph)
        .into_iter()
        .map(|v| v.ident)
        .collect();
    assert_eq!(idents, vec!["first", "second"]);

    let predict = Decompiler::new(DecompileOptions {
        function_marker: "__inference_predict".to_string(),
        ..DecompileOptions::default()
    });
    assert!(predict.decompile(&graph).contains("skipped"));
}

#[test]
fn test_cycle_degrades_to_placeholder() {
    let graph = learn(vec![node("p", "Add", &["q"]), node("q", "Add", &["p"])]);
    assert_eq!(
        decompile(&graph),
        "let q = op::Add(scope.sub_scope(\"q\"), unresolved(\"p\"));\n\
         let p = op::Add(scope.sub_scope(\"p\"), q);"
    );

    let self_loop = learn(vec![node("s", "Add", &["s"])]);
    assert_eq!(
        decompile(&self_loop),
        "let s = op::Add(scope.sub_scope(\"s\"), unresolved(\"s\"));"
    );
}

#[test]
fn test_identifiers_unique_and_valid() {
    let graph = learn(vec![
        node("a/b", "Const", &[]),
        node("a_b", "Const", &[]),
        node("loop", "Const", &[]),
        node("0x", "Const", &[]),
    ]);
    let idents: Vec<String> = Decompiler::default()
        .decompile_variables(&graph)
        .into_iter()
        .map(|v| v.ident)
        .collect();
    assert_eq!(idents, vec!["a_b", "a_b_1", "loop_", "_0x"]);
}

#[test]
fn test_long_chain_does_not_overflow() {
    let mut nodes = vec![node("n0", "Const", &[])];
    for i in 1..50_000 {
        let prev = format!("n{}", i - 1);
        nodes.push(node(&format!("n{}", i), "Identity", &[prev.as_str()]));
    }
    // Define from the tail so every operand is a forward definition.
    nodes.reverse();
    let vars = Decompiler::default().decompile_variables(&learn(nodes));
    assert_eq!(vars.len(), 50_000);
    assert_eq!(vars[0].ident, "n0");
}

// ─── Loading ──────────────────────────────────────────────────────

struct DumpBridge(Result<String, ()>);

impl RuntimeBridge for DumpBridge {
    fn run(&self, script: &str, payload: &str) -> Result<BridgeOutput, BridgeError> {
        assert!(script.contains("saved_model_pb2"));
        assert!(payload.contains("model_dir"));
        match &self.0 {
            Ok(stdout) => Ok(BridgeOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            Err(()) => Err(BridgeError::Exit {
                status: "exit status: 1".to_string(),
                stdout: String::new(),
                stderr: "OSError".to_string(),
            }),
        }
    }
}

fn saved_model_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("saved_model.pb"), b"pb").unwrap();
    dir
}

#[test]
fn test_json_loader() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(load::GRAPH_DUMP_FILE),
        r#"{"nodes": [{"name": "c", "op": "Const"}]}"#,
    )
    .unwrap();
    let graph = JsonGraphLoader.load(dir.path()).unwrap();
    assert_eq!(graph.nodes, vec![node("c", "Const", &[])]);
    assert!(graph.functions.is_empty());
}

#[test]
fn test_json_loader_missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = JsonGraphLoader.load(dir.path()).unwrap_err();
    assert!(matches!(err, DecompileError::Load { .. }));
}

#[test]
fn test_runtime_loader_reads_last_line() {
    let dir = saved_model_dir();
    let bridge = DumpBridge(Ok(
        "loading...\n{\"nodes\": [], \"functions\": [{\"name\": \"f\"}]}\n".to_string(),
    ));
    let graph = RuntimeGraphLoader::new(bridge).load(dir.path()).unwrap();
    assert_eq!(graph.functions[0].name, "f");
}

#[test]
fn test_runtime_loader_failures() {
    let empty = tempfile::tempdir().unwrap();
    let err = RuntimeGraphLoader::new(DumpBridge(Ok(String::new())))
        .load(empty.path())
        .unwrap_err();
    assert!(matches!(err, DecompileError::Load { .. }));

    let dir = saved_model_dir();
    let err = RuntimeGraphLoader::new(DumpBridge(Ok("not json".to_string())))
        .load(dir.path())
        .unwrap_err();
    assert!(matches!(
        err,
        DecompileError::Bridge(BridgeError::Malformed { .. })
    ));

    let err = RuntimeGraphLoader::new(DumpBridge(Err(())))
        .load(dir.path())
        .unwrap_err();
    assert!(matches!(err, DecompileError::Bridge(BridgeError::Exit { .. })));
}

#[test]
fn test_dump_file_preferred_over_runtime() {
    let dir = saved_model_dir();
    std::fs::write(dir.path().join(load::GRAPH_DUMP_FILE), r#"{"nodes": []}"#).unwrap();
    // The bridge would fail; it must not be consulted.
    let graph = load_saved_graph_with(Path::new(dir.path()), &DumpBridge(Err(()))).unwrap();
    assert!(graph.nodes.is_empty());
}
