//! Core layers: input, dense, activation, dropout, reshaping, embedding.

use super::{Arity, Constraint, Initializer, LayerType, Params, Regularizer};
use crate::dtype::Shape;

// ─── Input ────────────────────────────────────────────────────────

/// Graph entry point. Its shape includes the batch dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub shape: Shape,
    pub sparse: bool,
    pub ragged: bool,
}

impl Input {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            sparse: false,
            ragged: false,
        }
    }

    /// Input of shape `[batch, dims...]`.
    pub fn batched(dims: &[u64]) -> Self {
        Self::new(Shape::batched(dims))
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    pub fn ragged(mut self, ragged: bool) -> Self {
        self.ragged = ragged;
        self
    }
}

impl LayerType for Input {
    fn class_name(&self) -> &str {
        "InputLayer"
    }

    fn base_name(&self) -> &str {
        "input"
    }

    fn params(&self) -> Params {
        let shape = serde_json::to_value(&self.shape).unwrap_or_default();
        Params::new()
            .set("batch_input_shape", shape)
            .set("sparse", self.sparse)
            .set("ragged", self.ragged)
    }

    fn arity(&self) -> Arity {
        Arity::None
    }

    fn validate(&self) -> Result<(), String> {
        if !self.shape.is_valid() {
            return Err(format!(
                "input shape {} must have a batch dimension followed by positive sizes",
                self.shape
            ));
        }
        Ok(())
    }
}

// ─── Dense ────────────────────────────────────────────────────────

/// Fully connected layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    pub units: u64,
    pub activation: String,
    pub use_bias: bool,
    pub kernel_initializer: Initializer,
    pub bias_initializer: Initializer,
    pub kernel_regularizer: Option<Regularizer>,
    pub bias_regularizer: Option<Regularizer>,
    pub activity_regularizer: Option<Regularizer>,
    pub kernel_constraint: Option<Constraint>,
    pub bias_constraint: Option<Constraint>,
}

impl Dense {
    pub fn new(units: u64) -> Self {
        Self {
            units,
            activation: "linear".to_string(),
            use_bias: true,
            kernel_initializer: Initializer::glorot_uniform(),
            bias_initializer: Initializer::Zeros,
            kernel_regularizer: None,
            bias_regularizer: None,
            activity_regularizer: None,
            kernel_constraint: None,
            bias_constraint: None,
        }
    }

    pub fn activation(mut self, activation: impl Into<String>) -> Self {
        self.activation = activation.into();
        self
    }

    pub fn use_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    pub fn kernel_initializer(mut self, initializer: Initializer) -> Self {
        self.kernel_initializer = initializer;
        self
    }

    pub fn bias_initializer(mut self, initializer: Initializer) -> Self {
        self.bias_initializer = initializer;
        self
    }

    pub fn kernel_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.kernel_regularizer = Some(regularizer);
        self
    }

    pub fn bias_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.bias_regularizer = Some(regularizer);
        self
    }

    pub fn activity_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.activity_regularizer = Some(regularizer);
        self
    }

    pub fn kernel_constraint(mut self, constraint: Constraint) -> Self {
        self.kernel_constraint = Some(constraint);
        self
    }

    pub fn bias_constraint(mut self, constraint: Constraint) -> Self {
        self.bias_constraint = Some(constraint);
        self
    }
}

impl LayerType for Dense {
    fn class_name(&self) -> &str {
        "Dense"
    }

    fn base_name(&self) -> &str {
        "dense"
    }

    fn params(&self) -> Params {
        Params::new()
            .set("units", self.units)
            .set("activation", self.activation.as_str())
            .set("use_bias", self.use_bias)
            .object("kernel_initializer", Some(&self.kernel_initializer))
            .object("bias_initializer", Some(&self.bias_initializer))
            .object("kernel_regularizer", self.kernel_regularizer.as_ref())
            .object("bias_regularizer", self.bias_regularizer.as_ref())
            .object("activity_regularizer", self.activity_regularizer.as_ref())
            .object("kernel_constraint", self.kernel_constraint.as_ref())
            .object("bias_constraint", self.bias_constraint.as_ref())
    }

    fn validate(&self) -> Result<(), String> {
        if self.units == 0 {
            return Err("units must be positive".to_string());
        }
        Ok(())
    }
}

// ─── Activation ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub activation: String,
}

impl Activation {
    pub fn new(activation: impl Into<String>) -> Self {
        Self {
            activation: activation.into(),
        }
    }
}

impl LayerType for Activation {
    fn class_name(&self) -> &str {
        "Activation"
    }

    fn base_name(&self) -> &str {
        "activation"
    }

    fn params(&self) -> Params {
        Params::new().set("activation", self.activation.as_str())
    }

    fn validate(&self) -> Result<(), String> {
        if self.activation.is_empty() {
            return Err("activation name is empty".to_string());
        }
        Ok(())
    }
}

// ─── Dropout ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Dropout {
    pub rate: f64,
    pub seed: Option<u64>,
}

impl Dropout {
    pub fn new(rate: f64) -> Self {
        Self { rate, seed: None }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl LayerType for Dropout {
    fn class_name(&self) -> &str {
        "Dropout"
    }

    fn base_name(&self) -> &str {
        "dropout"
    }

    fn params(&self) -> Params {
        Params::new()
            .set("rate", self.rate)
            .set("noise_shape", serde_json::Value::Null)
            .set("seed", self.seed)
    }

    fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.rate) {
            return Err(format!("dropout rate {} outside [0, 1)", self.rate));
        }
        Ok(())
    }
}

// ─── Flatten / Reshape ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flatten;

impl Flatten {
    pub fn new() -> Self {
        Flatten
    }
}

impl LayerType for Flatten {
    fn class_name(&self) -> &str {
        "Flatten"
    }

    fn base_name(&self) -> &str {
        "flatten"
    }

    fn params(&self) -> Params {
        Params::new().set("data_format", "channels_last")
    }
}

/// Reshape to `target_shape` (batch dimension excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct Reshape {
    pub target_shape: Vec<u64>,
}

impl Reshape {
    pub fn new(target_shape: Vec<u64>) -> Self {
        Self { target_shape }
    }
}

impl LayerType for Reshape {
    fn class_name(&self) -> &str {
        "Reshape"
    }

    fn base_name(&self) -> &str {
        "reshape"
    }

    fn params(&self) -> Params {
        Params::new().set("target_shape", self.target_shape.clone())
    }

    fn validate(&self) -> Result<(), String> {
        if self.target_shape.is_empty() || self.target_shape.contains(&0) {
            return Err("target shape needs at least one positive dimension".to_string());
        }
        Ok(())
    }
}

// ─── Embedding ────────────────────────────────────────────────────

/// Lookup table from integer ids to dense vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub input_dim: u64,
    pub output_dim: u64,
    pub embeddings_initializer: Initializer,
    pub embeddings_regularizer: Option<Regularizer>,
    pub activity_regularizer: Option<Regularizer>,
    pub embeddings_constraint: Option<Constraint>,
    pub mask_zero: bool,
    pub input_length: Option<u64>,
}

impl Embedding {
    pub fn new(input_dim: u64, output_dim: u64) -> Self {
        Self {
            input_dim,
            output_dim,
            embeddings_initializer: Initializer::random_uniform(),
            embeddings_regularizer: None,
            activity_regularizer: None,
            embeddings_constraint: None,
            mask_zero: false,
            input_length: None,
        }
    }

    pub fn mask_zero(mut self, mask_zero: bool) -> Self {
        self.mask_zero = mask_zero;
        self
    }

    pub fn input_length(mut self, input_length: u64) -> Self {
        self.input_length = Some(input_length);
        self
    }

    pub fn embeddings_initializer(mut self, initializer: Initializer) -> Self {
        self.embeddings_initializer = initializer;
        self
    }
}

impl LayerType for Embedding {
    fn class_name(&self) -> &str {
        "Embedding"
    }

    fn base_name(&self) -> &str {
        "embedding"
    }

    fn params(&self) -> Params {
        Params::new()
            .set("input_dim", self.input_dim)
            .set("output_dim", self.output_dim)
            .object("embeddings_initializer", Some(&self.embeddings_initializer))
            .object("embeddings_regularizer", self.embeddings_regularizer.as_ref())
            .object("activity_regularizer", self.activity_regularizer.as_ref())
            .object("embeddings_constraint", self.embeddings_constraint.as_ref())
            .set("mask_zero", self.mask_zero)
            .set("input_length", self.input_length)
    }

    fn validate(&self) -> Result<(), String> {
        if self.input_dim == 0 || self.output_dim == 0 {
            return Err("input_dim and output_dim must be positive".to_string());
        }
        Ok(())
    }
}
