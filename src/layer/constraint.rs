use serde_json::{json, Value};

use super::KerasObject;

/// Projection applied to weights after each update.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    MaxNorm {
        max_value: f64,
        axis: i64,
    },
    MinMaxNorm {
        min_value: f64,
        max_value: f64,
        rate: f64,
        axis: i64,
    },
    NonNeg,
    UnitNorm {
        axis: i64,
    },
    RadialConstraint,
}

impl Constraint {
    pub fn max_norm(max_value: f64) -> Self {
        Constraint::MaxNorm { max_value, axis: 0 }
    }

    pub fn unit_norm() -> Self {
        Constraint::UnitNorm { axis: 0 }
    }
}

impl KerasObject for Constraint {
    fn keras_config(&self) -> Value {
        match self {
            Constraint::MaxNorm { max_value, axis } => json!({
                "class_name": "MaxNorm",
                "config": { "max_value": max_value, "axis": axis },
            }),
            Constraint::MinMaxNorm {
                min_value,
                max_value,
                rate,
                axis,
            } => json!({
                "class_name": "MinMaxNorm",
                "config": {
                    "min_value": min_value,
                    "max_value": max_value,
                    "rate": rate,
                    "axis": axis,
                },
            }),
            Constraint::NonNeg => json!({ "class_name": "NonNeg", "config": {} }),
            Constraint::UnitNorm { axis } => {
                json!({ "class_name": "UnitNorm", "config": { "axis": axis } })
            }
            Constraint::RadialConstraint => {
                json!({ "class_name": "RadialConstraint", "config": {} })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_norm_config() {
        assert_eq!(
            Constraint::max_norm(2.0).keras_config(),
            json!({ "class_name": "MaxNorm", "config": { "max_value": 2.0, "axis": 0 } })
        );
    }

    #[test]
    fn test_non_neg_config() {
        assert_eq!(Constraint::NonNeg.keras_config()["class_name"], "NonNeg");
    }
}
