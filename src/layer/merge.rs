//! Layers that combine several upstream tensors.

use super::{Arity, LayerType, Params};

/// Concatenate inputs along `axis`.
#[derive(Debug, Clone, PartialEq)]
pub struct Concatenate {
    pub axis: i64,
}

impl Concatenate {
    pub fn new() -> Self {
        Self { axis: -1 }
    }

    pub fn axis(mut self, axis: i64) -> Self {
        self.axis = axis;
        self
    }
}

impl Default for Concatenate {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerType for Concatenate {
    fn class_name(&self) -> &str {
        "Concatenate"
    }

    fn base_name(&self) -> &str {
        "concatenate"
    }

    fn params(&self) -> Params {
        Params::new().set("axis", self.axis)
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }
}

/// Element-wise merge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOp {
    Add,
    Subtract,
    Multiply,
    Average,
    Maximum,
    Minimum,
}

/// Element-wise merge of same-shaped inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub op: MergeOp,
}

impl Merge {
    pub fn new(op: MergeOp) -> Self {
        Self { op }
    }

    pub fn add() -> Self {
        Self::new(MergeOp::Add)
    }

    pub fn multiply() -> Self {
        Self::new(MergeOp::Multiply)
    }
}

impl LayerType for Merge {
    fn class_name(&self) -> &str {
        match self.op {
            MergeOp::Add => "Add",
            MergeOp::Subtract => "Subtract",
            MergeOp::Multiply => "Multiply",
            MergeOp::Average => "Average",
            MergeOp::Maximum => "Maximum",
            MergeOp::Minimum => "Minimum",
        }
    }

    fn base_name(&self) -> &str {
        match self.op {
            MergeOp::Add => "add",
            MergeOp::Subtract => "subtract",
            MergeOp::Multiply => "multiply",
            MergeOp::Average => "average",
            MergeOp::Maximum => "maximum",
            MergeOp::Minimum => "minimum",
        }
    }

    fn params(&self) -> Params {
        Params::new()
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }
}
