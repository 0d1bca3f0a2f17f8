//! Element types and tensor shapes as the runtime spells them.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

// ─── DataType ─────────────────────────────────────────────────────

/// Scalar element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    Float16,
    #[default]
    Float32,
    Float64,
    Double,
    Half,
    Bfloat16,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Qint8,
    Qint16,
    Qint32,
    Quint8,
    Quint16,
    Complex,
    Complex64,
    Complex128,
    String,
    Bool,
}

const ALL_DTYPES: [DataType; 24] = [
    DataType::Float16,
    DataType::Float32,
    DataType::Float64,
    DataType::Double,
    DataType::Half,
    DataType::Bfloat16,
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Uint8,
    DataType::Uint16,
    DataType::Uint32,
    DataType::Uint64,
    DataType::Qint8,
    DataType::Qint16,
    DataType::Qint32,
    DataType::Quint8,
    DataType::Quint16,
    DataType::Complex,
    DataType::Complex64,
    DataType::Complex128,
    DataType::String,
    DataType::Bool,
];

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Float16 => "float16",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Double => "double",
            DataType::Half => "half",
            DataType::Bfloat16 => "bfloat16",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Qint8 => "qint8",
            DataType::Qint16 => "qint16",
            DataType::Qint32 => "qint32",
            DataType::Quint8 => "quint8",
            DataType::Quint16 => "quint16",
            DataType::Complex => "complex",
            DataType::Complex64 => "complex64",
            DataType::Complex128 => "complex128",
            DataType::String => "string",
            DataType::Bool => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_DTYPES
            .iter()
            .copied()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| format!("unknown dtype '{}'", s))
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ─── Shape ────────────────────────────────────────────────────────

/// One tensor dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Batch size, decided at run time. Serialized as `null`.
    Batch,
    Fixed(u64),
}

impl Serialize for Dim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dim::Batch => serializer.serialize_none(),
            Dim::Fixed(n) => serializer.serialize_u64(*n),
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Batch => f.write_str("?"),
            Dim::Fixed(n) => write!(f, "{}", n),
        }
    }
}

/// Ordered dimensions, batch dimension included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Shape(pub Vec<Dim>);

impl Shape {
    pub fn new(dims: Vec<Dim>) -> Self {
        Shape(dims)
    }

    /// `[batch, d0, d1, ...]`.
    pub fn batched(dims: &[u64]) -> Self {
        let mut out = Vec::with_capacity(dims.len() + 1);
        out.push(Dim::Batch);
        out.extend(dims.iter().map(|&d| Dim::Fixed(d)));
        Shape(out)
    }

    /// Dimensions after the leading one.
    pub fn without_batch(&self) -> &[Dim] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Whether every non-batch dimension is a positive integer.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .without_batch()
                .iter()
                .all(|d| matches!(d, Dim::Fixed(n) if *n > 0))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DataType::Float32, "float32")]
    #[case(DataType::Int32, "int32")]
    #[case(DataType::String, "string")]
    #[case(DataType::Bool, "bool")]
    #[case(DataType::Complex128, "complex128")]
    fn test_dtype_names(#[case] dtype: DataType, #[case] expected: &str) {
        assert_eq!(dtype.as_str(), expected);
        assert_eq!(expected.parse::<DataType>().unwrap(), dtype);
    }

    #[test]
    fn test_every_dtype_parses_back() {
        for dt in ALL_DTYPES {
            assert_eq!(dt.as_str().parse::<DataType>(), Ok(dt));
        }
        assert!("float128".parse::<DataType>().is_err());
    }

    #[test]
    fn test_shape_serializes_batch_as_null() {
        let shape = Shape::batched(&[28, 28, 1]);
        let json = serde_json::to_string(&shape).unwrap();
        assert_eq!(json, "[null,28,28,1]");
        assert_eq!(shape.to_string(), "(?, 28, 28, 1)");
    }

    #[test]
    fn test_shape_validity() {
        assert!(Shape::batched(&[4]).is_valid());
        assert!(!Shape::default().is_valid());
        assert!(!Shape(vec![Dim::Batch, Dim::Fixed(0)]).is_valid());
        assert!(!Shape(vec![Dim::Batch, Dim::Batch]).is_valid());
    }
}
