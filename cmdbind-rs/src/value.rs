//! Value kinds and string coercion.
//!
//! Every declared option or positional carries a [`ValueKind`]. The binder
//! coerces raw command-line payloads into a [`Value`] of that kind and hands
//! it to the field setter, which is generated from the field's [`Bindable`]
//! implementation.

use serde::Serialize;
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

// ============================================================================
// Kinds and Values
// ============================================================================

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Used verbatim.
    Text,

    /// Flag: presence means `true`, never takes a payload.
    Bool,

    /// 32-bit signed integer, decimal or `0x`-prefixed hex.
    Int32,

    /// 64-bit signed integer, decimal or `0x`-prefixed hex.
    Int64,

    /// Single precision float.
    Float32,

    /// Double precision float.
    Float64,

    /// A field type with no coercion rule. Carries the type name for errors.
    Unsupported(&'static str),
}

impl ValueKind {
    /// Zero-argument flag?
    pub fn is_bool(self) -> bool {
        matches!(self, ValueKind::Bool)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ValueKind::Int32 | ValueKind::Int64)
    }

    /// Numeric kinds always consume the next token as their value, so that
    /// `--offset -5` is not mistaken for another flag.
    ///
    /// This deliberately covers the float kinds too, so `--ratio -0.5` binds
    /// the same way an integer option would.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::Int32 | ValueKind::Int64 | ValueKind::Float32 | ValueKind::Float64
        )
    }

    /// Short type name used in error messages.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Text => "String",
            ValueKind::Bool => "bool",
            ValueKind::Int32 => "i32",
            ValueKind::Int64 => "i64",
            ValueKind::Float32 => "f32",
            ValueKind::Float64 => "f64",
            ValueKind::Unsupported(name) => name,
        }
    }

    /// Placeholder shown after the option name in help output.
    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            ValueKind::Bool => None,
            kind if kind.is_integer() => Some("N"),
            _ => Some("val"),
        }
    }
}

/// A coerced value, ready to be assigned to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Float32(x) => write!(f, "{x}"),
            Value::Float64(x) => write!(f, "{x}"),
        }
    }
}

// ============================================================================
// Coercion
// ============================================================================

/// Reasons a payload could not be turned into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    /// The payload does not parse as the declared kind (user error).
    #[error("{0}")]
    Invalid(String),

    /// The declared kind has no coercion rule for a payload (declaration error).
    #[error("no coercion from a string payload to {0}")]
    Unsupported(&'static str),
}

/// Coerce a raw string payload to `kind`.
///
/// Integers starting with `0x` are parsed as hex, everything else as decimal.
/// Flags never take a payload, so [`ValueKind::Bool`] is rejected here.
pub fn coerce(kind: ValueKind, raw: &str) -> Result<Value, CoerceError> {
    match kind {
        ValueKind::Text => Ok(Value::Text(raw.to_string())),
        ValueKind::Int32 => parse_integer(raw, i32::from_str_radix).map(Value::Int32),
        ValueKind::Int64 => parse_integer(raw, i64::from_str_radix).map(Value::Int64),
        ValueKind::Float32 => raw
            .parse::<f32>()
            .map(Value::Float32)
            .map_err(|e| CoerceError::Invalid(e.to_string())),
        ValueKind::Float64 => raw
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| CoerceError::Invalid(e.to_string())),
        ValueKind::Bool | ValueKind::Unsupported(_) => {
            Err(CoerceError::Unsupported(kind.type_name()))
        }
    }
}

fn parse_integer<T>(
    raw: &str,
    from_radix: fn(&str, u32) -> Result<T, ParseIntError>,
) -> Result<T, CoerceError> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => from_radix(hex, 16),
        None => from_radix(raw, 10),
    };
    parsed.map_err(|e| CoerceError::Invalid(e.to_string()))
}

// ============================================================================
// Field Binding
// ============================================================================

/// Field types the binder knows how to assign.
///
/// Implemented for `String`, `bool`, `i32`, `i64`, `f32`, `f64`, plus their
/// `Option<_>` forms (assigns `Some`) and `Vec<_>` forms (appends, and marks
/// the option as accepting multiple occurrences).
pub trait Bindable {
    /// Kind used for coercion and tokenizer lookahead.
    const KIND: ValueKind;

    /// Whether every occurrence is applied rather than only the first.
    const MULTIPLE: bool = false;

    /// Assign `value` to `slot`. A value of the wrong variant is handed back.
    fn assign(slot: &mut Self, value: Value) -> Result<(), Value>;
}

trait Scalar: Sized {
    fn from_value(value: Value) -> Result<Self, Value>;
}

macro_rules! bindable {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::$kind(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }

        impl Bindable for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn assign(slot: &mut Self, value: Value) -> Result<(), Value> {
                *slot = <$ty as Scalar>::from_value(value)?;
                Ok(())
            }
        }

        impl Bindable for Option<$ty> {
            const KIND: ValueKind = ValueKind::$kind;

            fn assign(slot: &mut Self, value: Value) -> Result<(), Value> {
                *slot = Some(<$ty as Scalar>::from_value(value)?);
                Ok(())
            }
        }

        impl Bindable for Vec<$ty> {
            const KIND: ValueKind = ValueKind::$kind;
            const MULTIPLE: bool = true;

            fn assign(slot: &mut Self, value: Value) -> Result<(), Value> {
                slot.push(<$ty as Scalar>::from_value(value)?);
                Ok(())
            }
        }
    )*};
}

bindable! {
    String => Text,
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}
