//! Weight initializers.

use serde_json::{json, Value};

use super::KerasObject;

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Zeros,
    Ones,
    Constant {
        value: f64,
    },
    RandomNormal {
        mean: f64,
        stddev: f64,
        seed: Option<u64>,
    },
    RandomUniform {
        minval: f64,
        maxval: f64,
        seed: Option<u64>,
    },
    TruncatedNormal {
        mean: f64,
        stddev: f64,
        seed: Option<u64>,
    },
    GlorotNormal {
        seed: Option<u64>,
    },
    GlorotUniform {
        seed: Option<u64>,
    },
    HeNormal {
        seed: Option<u64>,
    },
    HeUniform {
        seed: Option<u64>,
    },
    Identity {
        gain: f64,
    },
    Orthogonal {
        gain: f64,
        seed: Option<u64>,
    },
    VarianceScaling {
        scale: f64,
        mode: String,
        distribution: String,
        seed: Option<u64>,
    },
}

impl Initializer {
    pub fn glorot_uniform() -> Self {
        Initializer::GlorotUniform { seed: None }
    }

    pub fn orthogonal() -> Self {
        Initializer::Orthogonal {
            gain: 1.0,
            seed: None,
        }
    }

    pub fn random_uniform() -> Self {
        Initializer::RandomUniform {
            minval: -0.05,
            maxval: 0.05,
            seed: None,
        }
    }

    pub fn random_normal() -> Self {
        Initializer::RandomNormal {
            mean: 0.0,
            stddev: 0.05,
            seed: None,
        }
    }

    pub fn truncated_normal() -> Self {
        Initializer::TruncatedNormal {
            mean: 0.0,
            stddev: 0.05,
            seed: None,
        }
    }

    pub fn variance_scaling() -> Self {
        Initializer::VarianceScaling {
            scale: 1.0,
            mode: "fan_in".to_string(),
            distribution: "truncated_normal".to_string(),
            seed: None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Initializer::Zeros => "Zeros",
            Initializer::Ones => "Ones",
            Initializer::Constant { .. } => "Constant",
            Initializer::RandomNormal { .. } => "RandomNormal",
            Initializer::RandomUniform { .. } => "RandomUniform",
            Initializer::TruncatedNormal { .. } => "TruncatedNormal",
            Initializer::GlorotNormal { .. } => "GlorotNormal",
            Initializer::GlorotUniform { .. } => "GlorotUniform",
            Initializer::HeNormal { .. } => "HeNormal",
            Initializer::HeUniform { .. } => "HeUniform",
            Initializer::Identity { .. } => "Identity",
            Initializer::Orthogonal { .. } => "Orthogonal",
            Initializer::VarianceScaling { .. } => "VarianceScaling",
        }
    }
}

impl KerasObject for Initializer {
    fn keras_config(&self) -> Value {
        let config = match self {
            Initializer::Zeros | Initializer::Ones => json!({}),
            Initializer::Constant { value } => json!({ "value": value }),
            Initializer::RandomNormal { mean, stddev, seed }
            | Initializer::TruncatedNormal { mean, stddev, seed } => {
                json!({ "mean": mean, "stddev": stddev, "seed": seed })
            }
            Initializer::RandomUniform {
                minval,
                maxval,
                seed,
            } => json!({ "minval": minval, "maxval": maxval, "seed": seed }),
            Initializer::GlorotNormal { seed }
            | Initializer::GlorotUniform { seed }
            | Initializer::HeNormal { seed }
            | Initializer::HeUniform { seed } => json!({ "seed": seed }),
            Initializer::Identity { gain } => json!({ "gain": gain }),
            Initializer::Orthogonal { gain, seed } => json!({ "gain": gain, "seed": seed }),
            Initializer::VarianceScaling {
                scale,
                mode,
                distribution,
                seed,
            } => json!({
                "scale": scale,
                "mode": mode,
                "distribution": distribution,
                "seed": seed,
            }),
        };
        json!({ "class_name": self.class_name(), "config": config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glorot_uniform_config() {
        assert_eq!(
            Initializer::glorot_uniform().keras_config(),
            json!({ "class_name": "GlorotUniform", "config": { "seed": null } })
        );
    }

    #[test]
    fn test_variance_scaling_config() {
        let value = Initializer::variance_scaling().keras_config();
        assert_eq!(value["class_name"], "VarianceScaling");
        assert_eq!(value["config"]["mode"], "fan_in");
        assert_eq!(value["config"]["distribution"], "truncated_normal");
        assert_eq!(value["config"]["scale"], 1.0);
    }

    #[test]
    fn test_zeros_has_empty_config() {
        assert_eq!(
            Initializer::Zeros.keras_config(),
            json!({ "class_name": "Zeros", "config": {} })
        );
    }
}
