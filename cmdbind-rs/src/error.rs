//! Errors produced while resolving and binding command-line arguments.

use std::fmt;
use thiserror::Error;

/// A required option or positional that received no value and has no default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArgument {
    /// Option key or positional name.
    pub name: String,

    /// Whether the missing argument is a positional.
    pub positional: bool,
}

impl MissingArgument {
    pub fn option(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positional: false,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positional: true,
        }
    }
}

impl fmt::Display for MissingArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing argument: {}", self.name)
    }
}

/// Errors raised by the resolver and the binder.
///
/// `UnknownArgument` aborts resolution immediately. Missing arguments are
/// collected across every descriptor and reported together. Invalid values
/// and unsupported types abort binding at the point of coercion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    /// An option token names nothing declared for the command.
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),

    /// One or more required arguments had no value and no default.
    #[error("{}", join_lines(.0))]
    MissingArguments(Vec<MissingArgument>),

    /// A payload could not be coerced to the declared type.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    /// The declared field type has no coercion rule. A defect in the command
    /// declaration, never recoverable by the user.
    #[error("Cannot assign '{value}' to field '{field}': unsupported type {type_name}")]
    UnsupportedType {
        field: String,
        type_name: String,
        value: String,
    },

    /// An option flagged as a help trigger was present.
    #[error("Help requested")]
    HelpRequested,
}

impl ArgError {
    pub fn invalid(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(
        field: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            field: field.into(),
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// True for errors in the command declaration rather than in user input.
    pub fn is_declaration_error(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }

    /// One message per reportable problem (one per missing argument).
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::MissingArguments(missing) => missing.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

fn join_lines(missing: &[MissingArgument]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
