//! Declared value shapes (`scalar`, `map`, `seq`)

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Shape a parameter, local or expression result is declared to have.
///
/// Only checked after the value is computed; there is no coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Scalar,
    Map,
    Seq,
}

impl DeclaredType {
    /// Parse a type name; `sequence` is accepted for `seq`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "scalar" => Some(DeclaredType::Scalar),
            "map" => Some(DeclaredType::Map),
            "seq" | "sequence" => Some(DeclaredType::Seq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredType::Scalar => "scalar",
            DeclaredType::Map => "map",
            DeclaredType::Seq => "seq",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        DeclaredType::of(value) == *self
    }

    /// Shape of a concrete value; tagged values report their inner shape.
    pub fn of(value: &Value) -> DeclaredType {
        match value {
            Value::Mapping(_) => DeclaredType::Map,
            Value::Sequence(_) => DeclaredType::Seq,
            Value::Tagged(tagged) => DeclaredType::of(&tagged.value),
            _ => DeclaredType::Scalar,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
