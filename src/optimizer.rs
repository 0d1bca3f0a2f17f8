//! Optimizer configurations handed to the runtime's `compile` step.
//!
//! Only the hyperparameters travel; the update rules live in the runtime.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::layer::KerasObject;

/// Update rule and its rule-specific hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Algorithm {
    Sgd {
        momentum: f64,
        nesterov: bool,
    },
    Adam {
        beta_1: f64,
        beta_2: f64,
        epsilon: f64,
        amsgrad: bool,
    },
    Adamax {
        beta_1: f64,
        beta_2: f64,
        epsilon: f64,
    },
    Nadam {
        beta_1: f64,
        beta_2: f64,
        epsilon: f64,
    },
    RmsProp {
        rho: f64,
        momentum: f64,
        epsilon: f64,
        centered: bool,
    },
    Adagrad {
        initial_accumulator_value: f64,
        epsilon: f64,
    },
    Adadelta {
        rho: f64,
        epsilon: f64,
    },
    Ftrl {
        learning_rate_power: f64,
        initial_accumulator_value: f64,
        l1_regularization_strength: f64,
        l2_regularization_strength: f64,
        l2_shrinkage_regularization_strength: f64,
        beta: f64,
    },
}

impl Algorithm {
    pub fn class_name(&self) -> &'static str {
        match self {
            Algorithm::Sgd { .. } => "SGD",
            Algorithm::Adam { .. } => "Adam",
            Algorithm::Adamax { .. } => "Adamax",
            Algorithm::Nadam { .. } => "Nadam",
            Algorithm::RmsProp { .. } => "RMSprop",
            Algorithm::Adagrad { .. } => "Adagrad",
            Algorithm::Adadelta { .. } => "Adadelta",
            Algorithm::Ftrl { .. } => "Ftrl",
        }
    }

    fn write(&self, config: &mut Map<String, Value>) {
        let mut put = |key: &str, value: Value| {
            config.insert(key.to_string(), value);
        };
        match *self {
            Algorithm::Sgd { momentum, nesterov } => {
                put("momentum", json!(momentum));
                put("nesterov", json!(nesterov));
            }
            Algorithm::Adam {
                beta_1,
                beta_2,
                epsilon,
                amsgrad,
            } => {
                put("beta_1", json!(beta_1));
                put("beta_2", json!(beta_2));
                put("epsilon", json!(epsilon));
                put("amsgrad", json!(amsgrad));
            }
            Algorithm::Adamax {
                beta_1,
                beta_2,
                epsilon,
            }
            | Algorithm::Nadam {
                beta_1,
                beta_2,
                epsilon,
            } => {
                put("beta_1", json!(beta_1));
                put("beta_2", json!(beta_2));
                put("epsilon", json!(epsilon));
            }
            Algorithm::RmsProp {
                rho,
                momentum,
                epsilon,
                centered,
            } => {
                put("rho", json!(rho));
                put("momentum", json!(momentum));
                put("epsilon", json!(epsilon));
                put("centered", json!(centered));
            }
            Algorithm::Adagrad {
                initial_accumulator_value,
                epsilon,
            } => {
                put("initial_accumulator_value", json!(initial_accumulator_value));
                put("epsilon", json!(epsilon));
            }
            Algorithm::Adadelta { rho, epsilon } => {
                put("rho", json!(rho));
                put("epsilon", json!(epsilon));
            }
            Algorithm::Ftrl {
                learning_rate_power,
                initial_accumulator_value,
                l1_regularization_strength,
                l2_regularization_strength,
                l2_shrinkage_regularization_strength,
                beta,
            } => {
                put("learning_rate_power", json!(learning_rate_power));
                put("initial_accumulator_value", json!(initial_accumulator_value));
                put("l1_regularization_strength", json!(l1_regularization_strength));
                put("l2_regularization_strength", json!(l2_regularization_strength));
                put(
                    "l2_shrinkage_regularization_strength",
                    json!(l2_shrinkage_regularization_strength),
                );
                put("beta", json!(beta));
            }
        }
    }
}

/// An optimizer: update rule plus the settings every rule shares.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimizer {
    pub algorithm: Algorithm,
    pub learning_rate: f64,
    pub decay: f64,
    /// Defaults to the class name.
    pub name: Option<String>,
}

impl Optimizer {
    fn with(algorithm: Algorithm, learning_rate: f64) -> Self {
        Self {
            algorithm,
            learning_rate,
            decay: 0.0,
            name: None,
        }
    }

    pub fn sgd() -> Self {
        Self::with(
            Algorithm::Sgd {
                momentum: 0.0,
                nesterov: false,
            },
            0.01,
        )
    }

    pub fn adam() -> Self {
        Self::with(
            Algorithm::Adam {
                beta_1: 0.9,
                beta_2: 0.999,
                epsilon: 1e-7,
                amsgrad: false,
            },
            0.001,
        )
    }

    pub fn adamax() -> Self {
        Self::with(
            Algorithm::Adamax {
                beta_1: 0.9,
                beta_2: 0.999,
                epsilon: 1e-7,
            },
            0.001,
        )
    }

    pub fn nadam() -> Self {
        Self::with(
            Algorithm::Nadam {
                beta_1: 0.9,
                beta_2: 0.999,
                epsilon: 1e-7,
            },
            0.001,
        )
    }

    pub fn rms_prop() -> Self {
        Self::with(
            Algorithm::RmsProp {
                rho: 0.9,
                momentum: 0.0,
                epsilon: 1e-7,
                centered: false,
            },
            0.001,
        )
    }

    pub fn adagrad() -> Self {
        Self::with(
            Algorithm::Adagrad {
                initial_accumulator_value: 0.1,
                epsilon: 1e-7,
            },
            0.001,
        )
    }

    pub fn adadelta() -> Self {
        Self::with(
            Algorithm::Adadelta {
                rho: 0.95,
                epsilon: 1e-7,
            },
            0.001,
        )
    }

    pub fn ftrl() -> Self {
        Self::with(
            Algorithm::Ftrl {
                learning_rate_power: -0.5,
                initial_accumulator_value: 0.1,
                l1_regularization_strength: 0.0,
                l2_regularization_strength: 0.0,
                l2_shrinkage_regularization_strength: 0.0,
                beta: 0.0,
            },
            0.001,
        )
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class_name(&self) -> &'static str {
        self.algorithm.class_name()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.class_name())
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::adam()
    }
}

impl KerasObject for Optimizer {
    fn keras_config(&self) -> Value {
        let mut config = Map::new();
        config.insert("name".to_string(), json!(self.name()));
        config.insert("learning_rate".to_string(), json!(self.learning_rate));
        config.insert("decay".to_string(), json!(self.decay));
        self.algorithm.write(&mut config);
        json!({ "class_name": self.class_name(), "config": config })
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(lr={})", self.class_name(), self.learning_rate)
    }
}

impl FromStr for Optimizer {
    type Err = String;

    /// Accepts the lowercase Keras aliases (`adam`, `sgd`, `rmsprop`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sgd" => Ok(Self::sgd()),
            "adam" => Ok(Self::adam()),
            "adamax" => Ok(Self::adamax()),
            "nadam" => Ok(Self::nadam()),
            "rmsprop" => Ok(Self::rms_prop()),
            "adagrad" => Ok(Self::adagrad()),
            "adadelta" => Ok(Self::adadelta()),
            "ftrl" => Ok(Self::ftrl()),
            other => Err(format!("unknown optimizer '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_adam_defaults() {
        let value = Optimizer::adam().keras_config();
        assert_eq!(value["class_name"], "Adam");
        assert_eq!(
            value["config"],
            json!({
                "name": "Adam",
                "learning_rate": 0.001,
                "decay": 0.0,
                "beta_1": 0.9,
                "beta_2": 0.999,
                "epsilon": 1e-7,
                "amsgrad": false,
            })
        );
    }

    #[test]
    fn test_sgd_overrides() {
        let sgd = Optimizer::sgd().learning_rate(0.1).decay(0.5).named("fast");
        let value = sgd.keras_config();
        assert_eq!(value["class_name"], "SGD");
        assert_eq!(value["config"]["learning_rate"], 0.1);
        assert_eq!(value["config"]["decay"], 0.5);
        assert_eq!(value["config"]["name"], "fast");
        assert_eq!(value["config"]["nesterov"], false);
    }

    #[rstest]
    #[case("sgd", "SGD", 0.01)]
    #[case("Adam", "Adam", 0.001)]
    #[case("rmsprop", "RMSprop", 0.001)]
    #[case("ftrl", "Ftrl", 0.001)]
    #[case("adadelta", "Adadelta", 0.001)]
    fn test_parse_alias(#[case] alias: &str, #[case] class_name: &str, #[case] lr: f64) {
        let optimizer: Optimizer = alias.parse().unwrap();
        assert_eq!(optimizer.class_name(), class_name);
        assert_eq!(optimizer.learning_rate, lr);
    }

    #[test]
    fn test_unknown_alias() {
        assert!("lbfgs".parse::<Optimizer>().is_err());
    }

    #[test]
    fn test_ftrl_keys() {
        let value = Optimizer::ftrl().keras_config();
        let config = value["config"].as_object().unwrap();
        for key in [
            "learning_rate_power",
            "initial_accumulator_value",
            "l1_regularization_strength",
            "l2_regularization_strength",
            "l2_shrinkage_regularization_strength",
            "beta",
        ] {
            assert!(config.contains_key(key), "missing {}", key);
        }
    }
}
