//! Primitive JSON types as used by the `type` keyword.
use core::fmt;

use serde_json::Value;

/// For faster error handling, types are stored as a compact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl PrimitiveType {
    pub(crate) fn from_keyword(value: &str) -> Option<PrimitiveType> {
        match value {
            "array" => Some(PrimitiveType::Array),
            "boolean" => Some(PrimitiveType::Boolean),
            "integer" => Some(PrimitiveType::Integer),
            "null" => Some(PrimitiveType::Null),
            "number" => Some(PrimitiveType::Number),
            "object" => Some(PrimitiveType::Object),
            "string" => Some(PrimitiveType::String),
            _ => None,
        }
    }
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Array => "array",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Null => "null",
            PrimitiveType::Number => "number",
            PrimitiveType::Object => "object",
            PrimitiveType::String => "string",
        }
    }
    /// The primitive type of a JSON value. Numbers with a zero fractional
    /// part are still numbers.
    pub(crate) fn of(value: &Value) -> PrimitiveType {
        match value {
            Value::Null => PrimitiveType::Null,
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Number(n) if n.is_u64() || n.is_i64() => PrimitiveType::Integer,
            Value::Number(_) => PrimitiveType::Number,
            Value::String(_) => PrimitiveType::String,
            Value::Array(_) => PrimitiveType::Array,
            Value::Object(_) => PrimitiveType::Object,
        }
    }
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALL_TYPES: [PrimitiveType; 7] = [
    PrimitiveType::Array,
    PrimitiveType::Boolean,
    PrimitiveType::Integer,
    PrimitiveType::Null,
    PrimitiveType::Number,
    PrimitiveType::Object,
    PrimitiveType::String,
];

/// A set of primitive types, preserving whether the keyword value was a
/// single name or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TypeSet {
    mask: u8,
    single: bool,
}

impl TypeSet {
    pub(crate) const fn single(ty: PrimitiveType) -> TypeSet {
        TypeSet {
            mask: ty.bit(),
            single: true,
        }
    }
    pub(crate) fn multiple(types: impl Iterator<Item = PrimitiveType>) -> TypeSet {
        let mut mask = 0;
        for ty in types {
            mask |= ty.bit();
        }
        TypeSet {
            mask,
            single: false,
        }
    }
    pub(crate) const fn contains(self, ty: PrimitiveType) -> bool {
        self.mask & ty.bit() != 0
    }
    /// Whether the given value is of any of the types in this set.
    ///
    /// Integer-valued floats such as `1.0` count as integers.
    pub(crate) fn matches(self, value: &Value) -> bool {
        match PrimitiveType::of(value) {
            PrimitiveType::Integer => {
                self.contains(PrimitiveType::Integer) || self.contains(PrimitiveType::Number)
            }
            PrimitiveType::Number => {
                self.contains(PrimitiveType::Number)
                    || (self.contains(PrimitiveType::Integer) && is_integer_valued(value))
            }
            other => self.contains(other),
        }
    }
    fn iter(self) -> impl Iterator<Item = PrimitiveType> {
        ALL_TYPES.into_iter().filter(move |ty| self.contains(*ty))
    }
    /// The keyword value this set was parsed from.
    pub(crate) fn to_value(self) -> Value {
        let mut names = self.iter().map(|ty| Value::from(ty.as_str()));
        if self.single {
            names.next().unwrap_or(Value::Null)
        } else {
            Value::Array(names.collect())
        }
    }
}

fn is_integer_valued(value: &Value) -> bool {
    value
        .as_f64()
        .map_or(false, |value| value.trunc() == value)
}
