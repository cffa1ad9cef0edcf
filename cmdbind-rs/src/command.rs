//! Command traits.

use crate::bind::{bind, BindReport};
use crate::descriptor::CommandDescriptor;
use crate::error::ArgError;
use crate::registry::Registry;
use crate::resolve::resolve;
use crate::CliResult;

/// Supplies the descriptor table for a command type.
///
/// Usually generated with `#[derive(Describe)]`.
pub trait Describe: Sized + 'static {
    fn describe() -> CommandDescriptor<Self>;
}

/// A runnable command.
///
/// The registry constructs a fresh `Default` value per invocation, calls
/// [`attach`](Command::attach), binds the arguments, runs
/// [`exec`](Command::exec) and, only if that succeeded,
/// [`cleanup`](Command::cleanup).
pub trait Command: Describe + Default {
    /// Main entry point, called once every argument is bound.
    fn exec(&mut self) -> CliResult<()>;

    /// Pre-binding hook receiving the registry that dispatched the command.
    fn attach(&mut self, _registry: &Registry) {}

    /// Post-exec hook; skipped when `exec` fails.
    fn cleanup(&mut self) -> CliResult<()> {
        Ok(())
    }
}

/// Resolve and bind `args[start..]` onto a fresh `C` without running it.
///
/// Leftover occurrences and positionals are returned alongside the value.
pub fn parse_args<C, S>(args: &[S], start: usize) -> Result<(C, BindReport), ArgError>
where
    C: Describe + Default,
    S: AsRef<str>,
{
    let descriptor = C::describe();
    let spec = descriptor.spec();
    let mut resolved = resolve(args, &spec.options, start)?;
    let mut target = C::default();
    let report = bind(&mut resolved, &descriptor, &mut target)?;
    Ok((target, report))
}
