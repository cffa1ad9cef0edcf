//! Command registry and dispatcher.
//!
//! The registry owns one descriptor table per command, built once at
//! registration and read-only afterwards, so a single registry can serve
//! independent argument vectors from several threads.
//!
//! # Example
//!
//! ```ignore
//! use cmdbind::{Command, CliResult, Describe, Registry};
//!
//! #[derive(Default, Describe)]
//! #[command(name = "greet", desc = "Print a greeting")]
//! struct Greet {
//!     #[arg(short = 'n', long = "name", default = "World")]
//!     name: String,
//! }
//!
//! impl Command for Greet {
//!     fn exec(&mut self) -> CliResult<()> {
//!         println!("Hello, {}!", self.name);
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     let registry = Registry::new().prog_name("demo").command::<Greet>();
//!     let response = registry.run_from_env();
//!     if !response.output.is_empty() {
//!         eprintln!("{}", response.output);
//!     }
//!     std::process::exit(response.exit_code);
//! }
//! ```

use crate::bind::bind;
use crate::command::Command;
use crate::descriptor::{CommandDescriptor, CommandSpec};
use crate::error::ArgError;
use crate::help;
use crate::resolve::resolve;
use crate::{CliError, IntoResponse, Response};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// What to do with occurrences no option claimed when the command declares
/// no catch-all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnroutedPolicy {
    /// Drop them silently.
    #[default]
    Ignore,

    /// Report the first one as an unknown argument.
    Fail,
}

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Program name shown in usage lines.
    pub prog_name: Option<String>,

    /// Printed above the command list.
    pub default_usage: Option<String>,

    /// Printed at the top of every help screen.
    pub help_header: Option<String>,

    /// Printed at the bottom of every help screen.
    pub help_footer: Option<String>,

    /// Category for commands that declare none.
    pub default_category: String,

    /// Explicit category order for the command list; sorted when `None`.
    pub category_order: Option<Vec<String>>,

    pub unrouted: UnroutedPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            prog_name: None,
            default_usage: None,
            help_header: None,
            help_footer: None,
            default_category: "General".to_string(),
            category_order: None,
            unrouted: UnroutedPolicy::Ignore,
        }
    }
}

enum Failure {
    Args(ArgError),
    Exec(CliError),
}

impl From<ArgError> for Failure {
    fn from(err: ArgError) -> Self {
        Failure::Args(err)
    }
}

trait Runner: Send + Sync {
    fn spec(&self) -> &CommandSpec;

    fn invoke(&self, registry: &Registry, args: &[String], start: usize) -> Result<(), Failure>;
}

struct Typed<C: Command> {
    descriptor: CommandDescriptor<C>,
    spec: CommandSpec,
}

impl<C: Command> Typed<C> {
    fn new() -> Self {
        let descriptor = C::describe();
        let spec = descriptor.spec();
        Self { descriptor, spec }
    }
}

impl<C: Command> Runner for Typed<C> {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn invoke(&self, registry: &Registry, args: &[String], start: usize) -> Result<(), Failure> {
        let mut resolved = resolve(args, &self.spec.options, start)?;

        let mut command = C::default();
        command.attach(registry);

        let report = bind(&mut resolved, &self.descriptor, &mut command)?;
        if let Some(first) = report.unrouted.first() {
            match registry.config.unrouted {
                UnroutedPolicy::Ignore => {
                    debug!(count = report.unrouted.len(), "Ignoring unrouted arguments");
                }
                UnroutedPolicy::Fail => {
                    warn!(argument = %first.flag(), "Unrouted argument");
                    return Err(ArgError::UnknownArgument(first.flag()).into());
                }
            }
        }

        command.exec().map_err(Failure::Exec)?;
        command.cleanup().map_err(Failure::Exec)
    }
}

/// Registered commands plus dispatcher configuration.
pub struct Registry {
    commands: BTreeMap<String, Box<dyn Runner>>,
    config: RegistryConfig,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            commands: BTreeMap::new(),
            config,
        }
    }

    pub fn prog_name(mut self, name: impl Into<String>) -> Self {
        self.config.prog_name = Some(name.into());
        self
    }

    pub fn default_usage(mut self, usage: impl Into<String>) -> Self {
        self.config.default_usage = Some(usage.into());
        self
    }

    pub fn help_header(mut self, header: impl Into<String>) -> Self {
        self.config.help_header = Some(header.into());
        self
    }

    pub fn help_footer(mut self, footer: impl Into<String>) -> Self {
        self.config.help_footer = Some(footer.into());
        self
    }

    pub fn default_category(mut self, category: impl Into<String>) -> Self {
        self.config.default_category = category.into();
        self
    }

    pub fn category_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.category_order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    pub fn unrouted_policy(mut self, policy: UnroutedPolicy) -> Self {
        self.config.unrouted = policy;
        self
    }

    /// Register `C` under its declared name, replacing any earlier command
    /// with the same name.
    pub fn command<C: Command>(mut self) -> Self {
        let runner = Typed::<C>::new();
        let name = runner.spec.info.name.clone();
        debug!(command = %name, handler = std::any::type_name::<C>(), "Added command");
        self.commands.insert(name, Box::new(runner));
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn is_valid_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn spec(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name).map(|runner| runner.spec())
    }

    /// Specs of every registered command, sorted by name.
    pub fn manifest(&self) -> Vec<&CommandSpec> {
        self.commands.values().map(|runner| runner.spec()).collect()
    }

    pub fn manifest_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.manifest())
    }

    pub fn render_commands(&self) -> String {
        help::render_command_list(self.manifest(), &self.config)
    }

    pub fn render_command_help(&self, name: &str) -> Option<String> {
        self.spec(name)
            .map(|spec| help::render_command_help(spec, &self.config))
    }

    /// Dispatch `args` (program name excluded): `args[0]` selects the command
    /// and option parsing starts at `args[1]`.
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Response {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        let Some(first) = args.first() else {
            return Response::diagnostic(0, self.render_commands());
        };

        if first == "help" {
            return match args.get(1) {
                None => Response::diagnostic(0, self.render_commands()),
                Some(name) => match self.render_command_help(name) {
                    Some(help) => Response::diagnostic(0, help),
                    None => self.unknown_command(name),
                },
            };
        }

        match self.commands.get(first) {
            Some(runner) => self.finish(runner.spec(), runner.invoke(self, &args, 1)),
            None => self.unknown_command(first),
        }
    }

    /// Dispatch the current process arguments.
    pub fn run_from_env(&self) -> Response {
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.run(&args)
    }

    /// Run `C` directly, parsing options from `args[0]` onwards. For
    /// programs with a single command; `C` need not be registered.
    pub fn run_command<C: Command, S: AsRef<str>>(&self, args: &[S]) -> Response {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        let runner = Typed::<C>::new();
        self.finish(runner.spec(), runner.invoke(self, &args, 0))
    }

    fn unknown_command(&self, name: &str) -> Response {
        Response::diagnostic(
            1,
            format!("ERROR: Unknown command: {name}\n\n{}", self.render_commands()),
        )
    }

    fn finish(&self, spec: &CommandSpec, outcome: Result<(), Failure>) -> Response {
        match outcome {
            Ok(()) => Response::silent(),
            Err(Failure::Args(ArgError::HelpRequested)) => {
                Response::diagnostic(1, help::render_command_help(spec, &self.config))
            }
            Err(Failure::Args(err)) => {
                let exit_code = if err.is_declaration_error() { 101 } else { 1 };
                let mut text = String::new();
                for message in err.messages() {
                    text.push_str(&format!("ERROR: {message}\n"));
                }
                text.push('\n');
                text.push_str(&help::render_command_help(spec, &self.config));
                Response::diagnostic(exit_code, text)
            }
            Err(Failure::Exec(err)) => {
                error!(command = %spec.info.name, error = %err, "Command failed");
                Err::<(), _>(err).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{OptionSpec, PositionalSpec};
    use crate::{CliResult, Describe, Output};

    #[derive(Default)]
    struct Echo {
        upper: bool,
        words: Vec<String>,
    }

    impl Describe for Echo {
        fn describe() -> CommandDescriptor<Self> {
            CommandDescriptor::new("echo")
                .desc("Print words")
                .option(OptionSpec::new("upper").short('u'), |e: &mut Echo| &mut e.upper)
                .positional(PositionalSpec::new("WORD").required(), |e: &mut Echo| &mut e.words)
        }
    }

    impl Command for Echo {
        fn exec(&mut self) -> CliResult<()> {
            if self.words.iter().any(|w| w == "fail") {
                return Err(CliError::user("asked to fail"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Pick {
        picked: bool,
    }

    impl Describe for Pick {
        fn describe() -> CommandDescriptor<Self> {
            CommandDescriptor::new("pick")
                .option(OptionSpec::new("picked").short('p').long("x"), |p: &mut Pick| &mut p.picked)
        }
    }

    impl Command for Pick {
        fn exec(&mut self) -> CliResult<()> {
            Ok(())
        }
    }

    fn registry() -> Registry {
        Registry::new().prog_name("tool").command::<Echo>()
    }

    fn text(response: &Response) -> String {
        response.output.to_string()
    }

    #[test]
    fn test_registry_lists_commands() {
        let registry = registry();
        assert!(registry.is_valid_command("echo"));
        assert_eq!(registry.command_names().collect::<Vec<_>>(), vec!["echo"]);

        let response = registry.run::<&str>(&[]);
        assert_eq!(response.exit_code, 0);
        assert!(text(&response).contains("Available commands:"));
        assert!(text(&response).contains("echo - Print words"));
    }

    #[test]
    fn test_help_for_command() {
        let response = registry().run(&["help", "echo"]);
        assert_eq!(response.exit_code, 0);
        assert!(text(&response).contains("Usage: tool echo [options] WORD"));
    }

    #[test]
    fn test_unknown_command() {
        let response = registry().run(&["nope"]);
        assert_eq!(response.exit_code, 1);
        assert!(text(&response).starts_with("ERROR: Unknown command: nope"));

        let response = registry().run(&["help", "nope"]);
        assert_eq!(response.exit_code, 1);
    }

    #[test]
    fn test_successful_run_is_silent() {
        let response = registry().run(&["echo", "-u", "hi"]);
        assert_eq!(response.exit_code, 0);
        assert!(matches!(response.output, Output::Silent));
    }

    #[test]
    fn test_argument_errors_print_usage() {
        let response = registry().run(&["echo", "--loud"]);
        assert_eq!(response.exit_code, 1);
        let out = text(&response);
        assert!(out.starts_with("ERROR: Unknown argument: --loud\n\n"));
        assert!(out.contains("Usage: tool echo"));

        let response = registry().run(&["echo"]);
        assert!(text(&response).starts_with("ERROR: Missing argument: WORD"));

        let response = registry().run(&["echo", "--"]);
        assert_eq!(response.exit_code, 1);
        assert!(text(&response).starts_with("ERROR: Missing argument: WORD"));
    }

    #[test]
    fn test_unrouted_single_character_long_name_keeps_dashes() {
        let registry = Registry::new()
            .unrouted_policy(UnroutedPolicy::Fail)
            .command::<Pick>();
        let response = registry.run(&["pick", "-p", "--x"]);
        assert_eq!(response.exit_code, 1);
        assert!(text(&response).starts_with("ERROR: Unknown argument: --x\n"));
    }

    #[test]
    fn test_exec_failure_uses_error_exit_code() {
        let response = registry().run(&["echo", "fail"]);
        assert_eq!(response.exit_code, 1);
        assert!(text(&response).contains("asked to fail"));
    }

    #[test]
    fn test_run_command_starts_at_index_zero() {
        let registry = Registry::new();
        let response = registry.run_command::<Echo, _>(&["-u", "x"]);
        assert_eq!(response.exit_code, 0);
    }

    #[test]
    fn test_manifest_json_lists_specs() {
        let json = registry().manifest_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["name"], "echo");
        assert_eq!(parsed[0]["positionals"][0]["name"], "WORD");
    }
}
