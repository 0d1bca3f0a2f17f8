use super::{Constraint, Initializer, LayerType, Params, Regularizer};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormalization {
    pub axis: i64,
    pub momentum: f64,
    pub epsilon: f64,
    pub center: bool,
    pub scale: bool,
    pub beta_initializer: Initializer,
    pub gamma_initializer: Initializer,
    pub moving_mean_initializer: Initializer,
    pub moving_variance_initializer: Initializer,
    pub beta_regularizer: Option<Regularizer>,
    pub gamma_regularizer: Option<Regularizer>,
    pub beta_constraint: Option<Constraint>,
    pub gamma_constraint: Option<Constraint>,
}

impl BatchNormalization {
    pub fn new() -> Self {
        Self {
            axis: -1,
            momentum: 0.99,
            epsilon: 0.001,
            center: true,
            scale: true,
            beta_initializer: Initializer::Zeros,
            gamma_initializer: Initializer::Ones,
            moving_mean_initializer: Initializer::Zeros,
            moving_variance_initializer: Initializer::Ones,
            beta_regularizer: None,
            gamma_regularizer: None,
            beta_constraint: None,
            gamma_constraint: None,
        }
    }

    pub fn momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl Default for BatchNormalization {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerType for BatchNormalization {
    fn class_name(&self) -> &str {
        "BatchNormalization"
    }

    fn base_name(&self) -> &str {
        "batch_normalization"
    }

    fn params(&self) -> Params {
        Params::new()
            .set("axis", self.axis)
            .set("momentum", self.momentum)
            .set("epsilon", self.epsilon)
            .set("center", self.center)
            .set("scale", self.scale)
            .object("beta_initializer", Some(&self.beta_initializer))
            .object("gamma_initializer", Some(&self.gamma_initializer))
            .object("moving_mean_initializer", Some(&self.moving_mean_initializer))
            .object(
                "moving_variance_initializer",
                Some(&self.moving_variance_initializer),
            )
            .object("beta_regularizer", self.beta_regularizer.as_ref())
            .object("gamma_regularizer", self.gamma_regularizer.as_ref())
            .object("beta_constraint", self.beta_constraint.as_ref())
            .object("gamma_constraint", self.gamma_constraint.as_ref())
    }

    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.momentum) {
            return Err(format!("momentum {} outside [0, 1]", self.momentum));
        }
        if self.epsilon <= 0.0 {
            return Err("epsilon must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerNormalization {
    pub axis: Vec<i64>,
    pub epsilon: f64,
    pub center: bool,
    pub scale: bool,
    pub beta_initializer: Initializer,
    pub gamma_initializer: Initializer,
    pub beta_regularizer: Option<Regularizer>,
    pub gamma_regularizer: Option<Regularizer>,
    pub beta_constraint: Option<Constraint>,
    pub gamma_constraint: Option<Constraint>,
}

impl LayerNormalization {
    pub fn new() -> Self {
        Self {
            axis: vec![-1],
            epsilon: 0.001,
            center: true,
            scale: true,
            beta_initializer: Initializer::Zeros,
            gamma_initializer: Initializer::Ones,
            beta_regularizer: None,
            gamma_regularizer: None,
            beta_constraint: None,
            gamma_constraint: None,
        }
    }

    pub fn axis(mut self, axis: Vec<i64>) -> Self {
        self.axis = axis;
        self
    }
}

impl Default for LayerNormalization {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerType for LayerNormalization {
    fn class_name(&self) -> &str {
        "LayerNormalization"
    }

    fn base_name(&self) -> &str {
        "layer_normalization"
    }

    fn params(&self) -> Params {
        Params::new()
            .set("axis", self.axis.clone())
            .set("epsilon", self.epsilon)
            .set("center", self.center)
            .set("scale", self.scale)
            .object("beta_initializer", Some(&self.beta_initializer))
            .object("gamma_initializer", Some(&self.gamma_initializer))
            .object("beta_regularizer", self.beta_regularizer.as_ref())
            .object("gamma_regularizer", self.gamma_regularizer.as_ref())
            .object("beta_constraint", self.beta_constraint.as_ref())
            .object("gamma_constraint", self.gamma_constraint.as_ref())
    }

    fn validate(&self) -> Result<(), String> {
        if self.axis.is_empty() {
            return Err("axis list is empty".to_string());
        }
        Ok(())
    }
}
