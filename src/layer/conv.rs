//! Convolution and pooling layers.

use super::{Constraint, Initializer, LayerType, Params, Regularizer};

fn check_padding(padding: &str) -> Result<(), String> {
    match padding {
        "valid" | "same" | "causal" => Ok(()),
        other => Err(format!("unknown padding '{}'", other)),
    }
}

fn check_positive(what: &str, values: &[u64]) -> Result<(), String> {
    if values.iter().any(|&v| v == 0) {
        return Err(format!("{} must be positive, got {:?}", what, values));
    }
    Ok(())
}

// ─── Convolution ──────────────────────────────────────────────────

/// Weight options shared by the convolution layers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvWeights {
    pub use_bias: bool,
    pub kernel_initializer: Initializer,
    pub bias_initializer: Initializer,
    pub kernel_regularizer: Option<Regularizer>,
    pub bias_regularizer: Option<Regularizer>,
    pub activity_regularizer: Option<Regularizer>,
    pub kernel_constraint: Option<Constraint>,
    pub bias_constraint: Option<Constraint>,
}

impl Default for ConvWeights {
    fn default() -> Self {
        Self {
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
}

impl ConvWeights {
    fn write(&self, params: Params) -> Params {
        params
            .set("use_bias", self.use_bias)
            .object("kernel_initializer", Some(&self.kernel_initializer))
            .object("bias_initializer", Some(&self.bias_initializer))
            .object("kernel_regularizer", self.kernel_regularizer.as_ref())
            .object("bias_regularizer", self.bias_regularizer.as_ref())
            .object("activity_regularizer", self.activity_regularizer.as_ref())
            .object("kernel_constraint", self.kernel_constraint.as_ref())
            .object("bias_constraint", self.bias_constraint.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conv1D {
    pub filters: u64,
    pub kernel_size: u64,
    pub strides: u64,
    pub padding: String,
    pub dilation_rate: u64,
    pub groups: u64,
    pub activation: String,
    pub weights: ConvWeights,
}

impl Conv1D {
    pub fn new(filters: u64, kernel_size: u64) -> Self {
        Self {
            filters,
            kernel_size,
            strides: 1,
            padding: "valid".to_string(),
            dilation_rate: 1,
            groups: 1,
            activation: "linear".to_string(),
            weights: ConvWeights::default(),
        }
    }

    pub fn strides(mut self, strides: u64) -> Self {
        self.strides = strides;
        self
    }

    pub fn padding(mut self, padding: impl Into<String>) -> Self {
        self.padding = padding.into();
        self
    }

    pub fn activation(mut self, activation: impl Into<String>) -> Self {
        self.activation = activation.into();
        self
    }

    pub fn kernel_initializer(mut self, initializer: Initializer) -> Self {
        self.weights.kernel_initializer = initializer;
        self
    }
}

impl LayerType for Conv1D {
    fn class_name(&self) -> &str {
        "Conv1D"
    }

    fn base_name(&self) -> &str {
        "conv1d"
    }

    fn params(&self) -> Params {
        let params = Params::new()
            .set("filters", self.filters)
            .set("kernel_size", vec![self.kernel_size])
            .set("strides", vec![self.strides])
            .set("padding", self.padding.as_str())
            .set("data_format", "channels_last")
            .set("dilation_rate", vec![self.dilation_rate])
            .set("groups", self.groups)
            .set("activation", self.activation.as_str());
        self.weights.write(params)
    }

    fn validate(&self) -> Result<(), String> {
        check_positive(
            "filters, kernel_size, strides, dilation_rate and groups",
            &[
                self.filters,
                self.kernel_size,
                self.strides,
                self.dilation_rate,
                self.groups,
            ],
        )?;
        check_padding(&self.padding)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conv2D {
    pub filters: u64,
    pub kernel_size: [u64; 2],
    pub strides: [u64; 2],
    pub padding: String,
    pub dilation_rate: [u64; 2],
    pub groups: u64,
    pub activation: String,
    pub weights: ConvWeights,
}

impl Conv2D {
    pub fn new(filters: u64, kernel_size: [u64; 2]) -> Self {
        Self {
            filters,
            kernel_size,
            strides: [1, 1],
            padding: "valid".to_string(),
            dilation_rate: [1, 1],
            groups: 1,
            activation: "linear".to_string(),
            weights: ConvWeights::default(),
        }
    }

    pub fn strides(mut self, strides: [u64; 2]) -> Self {
        self.strides = strides;
        self
    }

    pub fn padding(mut self, padding: impl Into<String>) -> Self {
        self.padding = padding.into();
        self
    }

    pub fn activation(mut self, activation: impl Into<String>) -> Self {
        self.activation = activation.into();
        self
    }

    pub fn kernel_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.weights.kernel_regularizer = Some(regularizer);
        self
    }
}

impl LayerType for Conv2D {
    fn class_name(&self) -> &str {
        "Conv2D"
    }

    fn base_name(&self) -> &str {
        "conv2d"
    }

    fn params(&self) -> Params {
        let params = Params::new()
            .set("filters", self.filters)
            .set("kernel_size", self.kernel_size.to_vec())
            .set("strides", self.strides.to_vec())
            .set("padding", self.padding.as_str())
            .set("data_format", "channels_last")
            .set("dilation_rate", self.dilation_rate.to_vec())
            .set("groups", self.groups)
            .set("activation", self.activation.as_str());
        self.weights.write(params)
    }

    fn validate(&self) -> Result<(), String> {
        check_positive("filters and groups", &[self.filters, self.groups])?;
        check_positive("kernel_size", &self.kernel_size)?;
        check_positive("strides", &self.strides)?;
        check_positive("dilation_rate", &self.dilation_rate)?;
        check_padding(&self.padding)
    }
}

// ─── Pooling ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOp {
    Max,
    Average,
}

impl PoolOp {
    fn pick(self, max: &'static str, average: &'static str) -> &'static str {
        match self {
            PoolOp::Max => max,
            PoolOp::Average => average,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pooling1D {
    pub op: PoolOp,
    pub pool_size: u64,
    pub strides: Option<u64>,
    pub padding: String,
}

impl Pooling1D {
    pub fn new(op: PoolOp, pool_size: u64) -> Self {
        Self {
            op,
            pool_size,
            strides: None,
            padding: "valid".to_string(),
        }
    }

    pub fn max(pool_size: u64) -> Self {
        Self::new(PoolOp::Max, pool_size)
    }

    pub fn average(pool_size: u64) -> Self {
        Self::new(PoolOp::Average, pool_size)
    }

    pub fn strides(mut self, strides: u64) -> Self {
        self.strides = Some(strides);
        self
    }

    pub fn padding(mut self, padding: impl Into<String>) -> Self {
        self.padding = padding.into();
        self
    }
}

impl LayerType for Pooling1D {
    fn class_name(&self) -> &str {
        self.op.pick("MaxPooling1D", "AveragePooling1D")
    }

    fn base_name(&self) -> &str {
        self.op.pick("max_pooling1d", "average_pooling1d")
    }

    fn params(&self) -> Params {
        Params::new()
            .set("pool_size", vec![self.pool_size])
            .set("strides", vec![self.strides.unwrap_or(self.pool_size)])
            .set("padding", self.padding.as_str())
            .set("data_format", "channels_last")
    }

    fn validate(&self) -> Result<(), String> {
        check_positive("pool_size", &[self.pool_size])?;
        if let Some(strides) = self.strides {
            check_positive("strides", &[strides])?;
        }
        check_padding(&self.padding)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pooling2D {
    pub op: PoolOp,
    pub pool_size: [u64; 2],
    pub strides: Option<[u64; 2]>,
    pub padding: String,
}

impl Pooling2D {
    pub fn new(op: PoolOp, pool_size: [u64; 2]) -> Self {
        Self {
            op,
            pool_size,
            strides: None,
            padding: "valid".to_string(),
        }
    }

    pub fn max(pool_size: [u64; 2]) -> Self {
        Self::new(PoolOp::Max, pool_size)
    }

    pub fn average(pool_size: [u64; 2]) -> Self {
        Self::new(PoolOp::Average, pool_size)
    }

    pub fn strides(mut self, strides: [u64; 2]) -> Self {
        self.strides = Some(strides);
        self
    }

    pub fn padding(mut self, padding: impl Into<String>) -> Self {
        self.padding = padding.into();
        self
    }
}

impl LayerType for Pooling2D {
    fn class_name(&self) -> &str {
        self.op.pick("MaxPooling2D", "AveragePooling2D")
    }

    fn base_name(&self) -> &str {
        self.op.pick("max_pooling2d", "average_pooling2d")
    }

    fn params(&self) -> Params {
        Params::new()
            .set("pool_size", self.pool_size.to_vec())
            .set("strides", self.strides.unwrap_or(self.pool_size).to_vec())
            .set("padding", self.padding.as_str())
            .set("data_format", "channels_last")
    }

    fn validate(&self) -> Result<(), String> {
        check_positive("pool_size", &self.pool_size)?;
        if let Some(strides) = self.strides {
            check_positive("strides", &strides)?;
        }
        check_padding(&self.padding)
    }
}

/// Global max/average pooling over the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPooling1D {
    pub op: PoolOp,
    pub keepdims: bool,
}

impl GlobalPooling1D {
    pub fn new(op: PoolOp) -> Self {
        Self {
            op,
            keepdims: false,
        }
    }

    pub fn keepdims(mut self, keepdims: bool) -> Self {
        self.keepdims = keepdims;
        self
    }
}

impl LayerType for GlobalPooling1D {
    fn class_name(&self) -> &str {
        self.op.pick("GlobalMaxPooling1D", "GlobalAveragePooling1D")
    }

    fn base_name(&self) -> &str {
        self.op.pick("global_max_pooling1d", "global_average_pooling1d")
    }

    fn params(&self) -> Params {
        Params::new()
            .set("data_format", "channels_last")
            .set("keepdims", self.keepdims)
    }
}
