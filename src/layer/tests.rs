use super::*;
use serde_json::json;

fn node(kind: impl Into<LayerKind>, name: &str) -> LayerNode {
    LayerNode {
        name: name.to_string(),
        kind: kind.into(),
        dtype: DataType::Float32,
        trainable: true,
        inputs: Vec::new(),
    }
}

fn record(config: &LayerConfig) -> Value {
    serde_json::to_value(config).unwrap()
}

#[test]
fn test_dense_record_with_two_upstreams() {
    let dense = node(Dense::new(3), "dense_7");
    let config = dense.keras_layer_config(&["n1", "n2"]);
    let value = record(&config);

    assert_eq!(value["class_name"], "Dense");
    assert_eq!(value["name"], "dense_7");
    assert_eq!(
        value["inbound_nodes"],
        json!([[["n1", 0, 0, {}], ["n2", 0, 0, {}]]])
    );
    assert_eq!(value["config"]["units"], 3);
    assert_eq!(value["config"]["name"], "dense_7");
    assert_eq!(value["config"]["dtype"], "float32");
    assert_eq!(value["config"]["trainable"], true);
}

#[test]
fn test_input_record_has_empty_inbound_list() {
    let input = node(Input::batched(&[28, 28, 1]), "input_1");
    let value = record(&input.keras_layer_config(&[]));

    assert_eq!(value["class_name"], "InputLayer");
    assert_eq!(value["inbound_nodes"], json!([[]]));
    assert_eq!(value["config"]["batch_input_shape"], json!([null, 28, 28, 1]));
    assert_eq!(value["config"]["sparse"], false);
    assert!(value["config"].get("trainable").is_none());
}

#[test]
fn test_sub_objects_use_their_own_config() {
    let dense = Dense::new(4)
        .kernel_initializer(Initializer::glorot_uniform())
        .kernel_regularizer(Regularizer::L2(0.5))
        .bias_constraint(Constraint::NonNeg);
    let value = record(&node(dense, "d").keras_layer_config(&["x"]));
    let config = &value["config"];

    assert_eq!(
        config["kernel_initializer"],
        json!({"class_name": "GlorotUniform", "config": {"seed": null}})
    );
    assert_eq!(config["kernel_regularizer"]["class_name"], "L2");
    assert_eq!(config["kernel_regularizer"]["config"]["l2"], 0.5);
    assert_eq!(config["bias_constraint"]["class_name"], "NonNeg");
    assert_eq!(config["bias_regularizer"], Value::Null);
    assert_eq!(config["activity_regularizer"], Value::Null);
}

#[test]
fn test_random_fourier_features_keep_string_initializer() {
    let rff = RandomFourierFeatures::new(64).laplacian().scale(2.0);
    let value = record(&node(rff, "rff").keras_layer_config(&["x"]));

    assert_eq!(value["config"]["kernel_initializer"], "laplacian");
    assert_eq!(value["config"]["output_dim"], 64);
    assert_eq!(value["config"]["scale"], 2.0);
}

#[test]
fn test_frozen_layer_is_not_trainable() {
    let spec = Dense::new(1).frozen();
    assert!(!spec.trainable);

    let mut frozen = node(Dense::new(1), "frozen");
    frozen.trainable = false;
    let value = record(&frozen.keras_layer_config(&["x"]));
    assert_eq!(value["config"]["trainable"], false);
}

#[test]
fn test_spec_shortcuts_chain() {
    let spec = Dense::new(1)
        .with_name("head")
        .with_dtype(DataType::Float64)
        .frozen();
    assert_eq!(spec.name.as_deref(), Some("head"));
    assert_eq!(spec.dtype, Some(DataType::Float64));
    assert!(!spec.trainable);
}

#[test]
fn test_custom_params_pass_through() {
    let custom = Custom::new("Scaler").param("factor", 3).param("mode", "fast");
    let value = record(&node(custom, "scaler_1").keras_layer_config(&["a", "b", "c"]));

    assert_eq!(value["class_name"], "Scaler");
    assert_eq!(value["config"]["factor"], 3);
    assert_eq!(value["config"]["mode"], "fast");
    assert_eq!(value["inbound_nodes"][0].as_array().unwrap().len(), 3);
}

#[test]
fn test_arity() {
    assert!(Arity::None.accepts(0));
    assert!(!Arity::None.accepts(1));
    assert!(Arity::One.accepts(1));
    assert!(!Arity::One.accepts(2));
    assert!(Arity::AtLeast(2).accepts(5));
    assert!(!Arity::AtLeast(2).accepts(1));
    assert!(Arity::Any.accepts(0));
    assert_eq!(Arity::AtLeast(2).describe(), "at least 2");
}

#[test]
fn test_spec_shortcuts() {
    let spec = Dense::new(2).with_name("head").dtype(DataType::Float16);
    assert_eq!(spec.name.as_deref(), Some("head"));
    assert_eq!(spec.dtype, Some(DataType::Float16));
    assert!(spec.trainable);
    assert!(matches!(spec.kind, LayerKind::Dense(_)));
}
