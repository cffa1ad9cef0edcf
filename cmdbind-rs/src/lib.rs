//! # cmdbind: declarative command-line binding
//!
//! Commands are plain structs. A derive macro (or a hand-written
//! [`CommandDescriptor`]) declares which fields are options and positionals;
//! the framework tokenizes argv, resolves it against those declarations,
//! coerces payloads to the field types and runs the command.
//!
//! ## Core Pieces
//!
//! - [`resolve`]: argv tokens → option occurrences + positional tokens
//! - [`bind`]: occurrences → typed field assignments, defaults and required checks
//! - [`Registry`]: command table, dispatch, help and error rendering
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cmdbind::{CliResult, Command, Describe, Registry};
//!
//! #[derive(Default, Describe)]
//! #[command(name = "head", desc = "Print the first lines of a file")]
//! struct Head {
//!     #[arg(short = 'n', long = "lines", default = "10", desc = "Number of lines")]
//!     lines: i32,
//!
//!     #[arg(positional, name = "FILE", required)]
//!     file: String,
//! }
//!
//! impl Command for Head {
//!     fn exec(&mut self) -> CliResult<()> {
//!         let text = std::fs::read_to_string(&self.file)?;
//!         for line in text.lines().take(self.lines as usize) {
//!             println!("{line}");
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     cmdbind::init_subscriber();
//!     let response = Registry::new().prog_name("tool").command::<Head>().run_from_env();
//!     response.emit();
//!     std::process::exit(response.exit_code);
//! }
//! ```

pub use cmdbind_macros::Describe;

pub mod bind;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod help;
pub mod registry;
pub mod resolve;
pub mod tracing_support;
pub mod value;

pub use bind::{bind, BindReport};
pub use command::{parse_args, Command, Describe};
pub use descriptor::{
    Arity, CommandDescriptor, CommandInfo, CommandSpec, OptionDescriptor, OptionSpec,
    PositionalDescriptor, PositionalSpec,
};
pub use error::{ArgError, MissingArgument};
pub use registry::{Registry, RegistryConfig, UnroutedPolicy};
pub use resolve::{resolve, Occurrence, ResolvedArgs};
pub use value::{coerce, Bindable, CoerceError, Value, ValueKind};

#[cfg(feature = "tracing")]
pub use tracing_support::tracing;

#[cfg(feature = "tracing")]
pub use tracing_support::{
    debug, error, info, init_subscriber_with_config, instrument, trace, warn, TracingConfig,
    TracingFormat,
};

pub use tracing_support::init_subscriber;

/// Result type for command entry points and hooks.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Error Types
// ============================================================================

/// Top-level error type for command execution.
///
/// Distinguishes between user-fixable errors (exit code 1) and system failures (exit code 101).
#[derive(Debug)]
pub enum CliError {
    /// User-fixable errors (exit code 1).
    User(UserError),

    /// Defects and environment failures (exit code 101).
    System(SystemError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::User(_) => 1,
            CliError::System(_) => 101,
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        CliError::User(UserError::Generic(message.into()))
    }

    pub fn system(message: impl Into<String>) -> Self {
        CliError::System(SystemError::Internal(message.into()))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::User(e) => write!(f, "{}", e),
            CliError::System(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

/// User-fixable errors (exit code 1).
#[derive(Debug)]
pub enum UserError {
    Generic(String),

    /// An option the command does not declare.
    UnknownArgument(String),

    InvalidArgument { arg: String, reason: String },

    /// One line per failed check.
    ValidationFailed { details: Vec<String> },
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::Generic(msg) => write!(f, "Error: {}", msg),
            UserError::UnknownArgument(arg) => write!(f, "Error: Unknown argument '{}'", arg),
            UserError::InvalidArgument { arg, reason } => {
                write!(f, "Error: Invalid argument '{}'\n\n{}", arg, reason)
            }
            UserError::ValidationFailed { details } => {
                write!(f, "Error: Validation failed\n\n{}", details.join("\n"))
            }
        }
    }
}

/// System-level failures (exit code 101).
#[derive(Debug)]
pub enum SystemError {
    Internal(String),

    Io(std::io::Error),

    /// The command declaration itself is broken (e.g. a field type with no
    /// coercion rule).
    Declaration(String),

    /// Any other error raised inside a command.
    Handler(anyhow::Error),
}

impl std::fmt::Display for SystemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemError::Internal(msg) => {
                write!(f, "Internal Error: {}\n\nThis is likely a bug.", msg)
            }
            SystemError::Io(e) => {
                write!(f, "Internal Error: I/O operation failed\n\n{}", e)
            }
            SystemError::Declaration(msg) => {
                write!(
                    f,
                    "Internal Error: Invalid command declaration\n\n{}\n\nThis is likely a bug.",
                    msg
                )
            }
            SystemError::Handler(e) => write!(f, "Internal Error: {:#}", e),
        }
    }
}

impl From<ArgError> for CliError {
    fn from(e: ArgError) -> Self {
        match e {
            ArgError::UnknownArgument(arg) => CliError::User(UserError::UnknownArgument(arg)),
            ArgError::InvalidValue { ref name, .. } => CliError::User(UserError::InvalidArgument {
                arg: name.clone(),
                reason: e.to_string(),
            }),
            ArgError::MissingArguments(_) => CliError::User(UserError::ValidationFailed {
                details: e.messages(),
            }),
            ArgError::UnsupportedType { .. } => {
                CliError::System(SystemError::Declaration(e.to_string()))
            }
            ArgError::HelpRequested => CliError::user(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::System(SystemError::Io(e))
    }
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        CliError::System(SystemError::Handler(e))
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Outcome of a dispatch: exit code plus what to print.
#[derive(Debug)]
pub struct Response {
    /// Exit code (0 = success, 1 = user error, 101 = system error).
    pub exit_code: i32,

    pub output: Output,
}

impl Response {
    /// Successful response with text for stdout.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            output: Output::Text(content.into()),
        }
    }

    pub fn silent() -> Self {
        Self {
            exit_code: 0,
            output: Output::Silent,
        }
    }

    /// Help, usage or error text for stderr.
    pub fn diagnostic(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: Output::Diagnostic(message.into()),
        }
    }

    /// Print the output to the stream it belongs on.
    pub fn emit(&self) {
        match &self.output {
            Output::Silent => {}
            Output::Text(s) => println!("{}", s),
            Output::Diagnostic(s) => eprint!("{}", s),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    Silent,

    /// Command output (stdout).
    Text(String),

    /// Help and errors (stderr).
    Diagnostic(String),
}

impl Output {
    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Silent)
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Silent => Ok(()),
            Output::Text(s) | Output::Diagnostic(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// Response Conversion Trait
// ============================================================================

/// Conversion of command results into a [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        Response::silent()
    }
}

impl<T: IntoResponse> IntoResponse for CliResult<T> {
    fn into_response(self) -> Response {
        match self {
            Ok(value) => value.into_response(),
            Err(e) => Response::diagnostic(e.exit_code(), format!("{}\n", e)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
