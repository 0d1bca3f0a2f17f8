use serde_json::{json, Value};

use super::KerasObject;

/// Weight penalty added to the loss.
#[derive(Debug, Clone, PartialEq)]
pub enum Regularizer {
    L1(f64),
    L2(f64),
    L1L2 { l1: f64, l2: f64 },
}

impl Regularizer {
    pub fn l1() -> Self {
        Regularizer::L1(0.01)
    }

    pub fn l2() -> Self {
        Regularizer::L2(0.01)
    }
}

impl KerasObject for Regularizer {
    fn keras_config(&self) -> Value {
        match self {
            Regularizer::L1(l1) => json!({ "class_name": "L1", "config": { "l1": l1 } }),
            Regularizer::L2(l2) => json!({ "class_name": "L2", "config": { "l2": l2 } }),
            Regularizer::L1L2 { l1, l2 } => {
                json!({ "class_name": "L1L2", "config": { "l1": l1, "l2": l2 } })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_penalties() {
        assert_eq!(
            Regularizer::l2().keras_config(),
            json!({ "class_name": "L2", "config": { "l2": 0.01 } })
        );
        assert_eq!(Regularizer::l1().keras_config()["config"]["l1"], 0.01);
    }
}
