//! Layers outside the typed catalogue.

use serde_json::{Map, Value};

use super::{Arity, LayerType, Params};

/// A layer class the runtime learns from user-supplied source text.
///
/// `definition` is pasted into the generated script verbatim; it must
/// register `class_name` in `custom_objects`.
#[derive(Debug, Clone, PartialEq)]
pub struct Custom {
    pub class_name: String,
    pub base_name: String,
    pub params: Map<String, Value>,
    pub definition: Option<String>,
}

impl Custom {
    pub fn new(class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        let base_name = to_snake_case(&class_name);
        Self {
            class_name,
            base_name,
            params: Map::new(),
            definition: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn definition(mut self, source: impl Into<String>) -> Self {
        self.definition = Some(source.into());
        self
    }
}

impl LayerType for Custom {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn base_name(&self) -> &str {
        &self.base_name
    }

    fn params(&self) -> Params {
        Params::new().extend(self.params.clone())
    }

    fn arity(&self) -> Arity {
        Arity::Any
    }

    fn validate(&self) -> Result<(), String> {
        let valid = self
            .class_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .class_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(format!(
                "'{}' is not a valid class name",
                self.class_name
            ));
        }
        Ok(())
    }

    fn custom_definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }
}

/// `ConvLSTM2D` → `conv_lstm2d`.
fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_ascii_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Random Fourier feature map.
///
/// Its `kernel_initializer` is a distribution name (`"gaussian"` or
/// `"laplacian"`), not an initializer object.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomFourierFeatures {
    pub output_dim: u64,
    pub kernel_initializer: String,
    pub scale: Option<f64>,
}

impl RandomFourierFeatures {
    pub fn new(output_dim: u64) -> Self {
        Self {
            output_dim,
            kernel_initializer: "gaussian".to_string(),
            scale: None,
        }
    }

    pub fn laplacian(mut self) -> Self {
        self.kernel_initializer = "laplacian".to_string();
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

impl LayerType for RandomFourierFeatures {
    fn class_name(&self) -> &str {
        "RandomFourierFeatures"
    }

    fn base_name(&self) -> &str {
        "random_fourier_features"
    }

    fn params(&self) -> Params {
        Params::new()
            .set("output_dim", self.output_dim)
            .set("kernel_initializer", self.kernel_initializer.as_str())
            .set("scale", self.scale)
    }

    fn validate(&self) -> Result<(), String> {
        if self.output_dim == 0 {
            return Err("output_dim must be positive".to_string());
        }
        match self.kernel_initializer.as_str() {
            "gaussian" | "laplacian" => Ok(()),
            other => Err(format!("unsupported kernel distribution '{}'", other)),
        }
    }
}
