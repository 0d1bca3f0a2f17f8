//! Recurrent layers (LSTM, GRU, SimpleRNN).

use super::{Constraint, Initializer, LayerType, Params, Regularizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrentCell {
    Lstm,
    Gru,
    SimpleRnn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recurrent {
    pub cell: RecurrentCell,
    pub units: u64,
    pub activation: String,
    pub recurrent_activation: String,
    pub use_bias: bool,
    pub kernel_initializer: Initializer,
    pub recurrent_initializer: Initializer,
    pub bias_initializer: Initializer,
    pub kernel_regularizer: Option<Regularizer>,
    pub recurrent_regularizer: Option<Regularizer>,
    pub bias_regularizer: Option<Regularizer>,
    pub activity_regularizer: Option<Regularizer>,
    pub kernel_constraint: Option<Constraint>,
    pub recurrent_constraint: Option<Constraint>,
    pub bias_constraint: Option<Constraint>,
    pub dropout: f64,
    pub recurrent_dropout: f64,
    pub return_sequences: bool,
    pub return_state: bool,
    pub go_backwards: bool,
    pub stateful: bool,
    pub unroll: bool,
    /// LSTM only.
    pub unit_forget_bias: bool,
    /// GRU only.
    pub reset_after: bool,
}

impl Recurrent {
    pub fn new(cell: RecurrentCell, units: u64) -> Self {
        Self {
            cell,
            units,
            activation: "tanh".to_string(),
            recurrent_activation: "sigmoid".to_string(),
            use_bias: true,
            kernel_initializer: Initializer::glorot_uniform(),
            recurrent_initializer: Initializer::orthogonal(),
            bias_initializer: Initializer::Zeros,
            kernel_regularizer: None,
            recurrent_regularizer: None,
            bias_regularizer: None,
            activity_regularizer: None,
            kernel_constraint: None,
            recurrent_constraint: None,
            bias_constraint: None,
            dropout: 0.0,
            recurrent_dropout: 0.0,
            return_sequences: false,
            return_state: false,
            go_backwards: false,
            stateful: false,
            unroll: false,
            unit_forget_bias: true,
            reset_after: true,
        }
    }

    pub fn lstm(units: u64) -> Self {
        Self::new(RecurrentCell::Lstm, units)
    }

    pub fn gru(units: u64) -> Self {
        Self::new(RecurrentCell::Gru, units)
    }

    pub fn simple_rnn(units: u64) -> Self {
        Self::new(RecurrentCell::SimpleRnn, units)
    }

    pub fn return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    pub fn return_state(mut self, return_state: bool) -> Self {
        self.return_state = return_state;
        self
    }

    pub fn dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn recurrent_dropout(mut self, recurrent_dropout: f64) -> Self {
        self.recurrent_dropout = recurrent_dropout;
        self
    }

    pub fn go_backwards(mut self, go_backwards: bool) -> Self {
        self.go_backwards = go_backwards;
        self
    }

    pub fn activation(mut self, activation: impl Into<String>) -> Self {
        self.activation = activation.into();
        self
    }
}

impl LayerType for Recurrent {
    fn class_name(&self) -> &str {
        match self.cell {
            RecurrentCell::Lstm => "LSTM",
            RecurrentCell::Gru => "GRU",
            RecurrentCell::SimpleRnn => "SimpleRNN",
        }
    }

    fn base_name(&self) -> &str {
        match self.cell {
            RecurrentCell::Lstm => "lstm",
            RecurrentCell::Gru => "gru",
            RecurrentCell::SimpleRnn => "simple_rnn",
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new()
            .set("units", self.units)
            .set("activation", self.activation.as_str())
            .set("use_bias", self.use_bias)
            .object("kernel_initializer", Some(&self.kernel_initializer))
            .object("recurrent_initializer", Some(&self.recurrent_initializer))
            .object("bias_initializer", Some(&self.bias_initializer))
            .object("kernel_regularizer", self.kernel_regularizer.as_ref())
            .object("recurrent_regularizer", self.recurrent_regularizer.as_ref())
            .object("bias_regularizer", self.bias_regularizer.as_ref())
            .object("activity_regularizer", self.activity_regularizer.as_ref())
            .object("kernel_constraint", self.kernel_constraint.as_ref())
            .object("recurrent_constraint", self.recurrent_constraint.as_ref())
            .object("bias_constraint", self.bias_constraint.as_ref())
            .set("dropout", self.dropout)
            .set("recurrent_dropout", self.recurrent_dropout)
            .set("return_sequences", self.return_sequences)
            .set("return_state", self.return_state)
            .set("go_backwards", self.go_backwards)
            .set("stateful", self.stateful)
            .set("unroll", self.unroll)
            .set("time_major", false);

        match self.cell {
            RecurrentCell::Lstm => {
                params = params
                    .set("recurrent_activation", self.recurrent_activation.as_str())
                    .set("unit_forget_bias", self.unit_forget_bias)
                    .set("implementation", 2);
            }
            RecurrentCell::Gru => {
                params = params
                    .set("recurrent_activation", self.recurrent_activation.as_str())
                    .set("reset_after", self.reset_after)
                    .set("implementation", 2);
            }
            RecurrentCell::SimpleRnn => {}
        }
        params
    }

    fn validate(&self) -> Result<(), String> {
        if self.units == 0 {
            return Err("units must be positive".to_string());
        }
        for (what, rate) in [
            ("dropout", self.dropout),
            ("recurrent_dropout", self.recurrent_dropout),
        ] {
            if !(0.0..1.0).contains(&rate) {
                return Err(format!("{} {} outside [0, 1)", what, rate));
            }
        }
        Ok(())
    }
}
