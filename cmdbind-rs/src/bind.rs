//! Binder: resolved occurrences → typed field assignments.
//!
//! Options are processed in declaration order. Each one selects its
//! occurrences by short alias, then long name, then derived name; the first
//! key that matched is marked consumed. Absent options fall back to their
//! default or are recorded as missing. Positionals are served afterwards, in
//! declaration order, from the resolver's positional list.
//!
//! Missing arguments are collected across every descriptor and reported
//! together. Coercion failures abort binding immediately.

use crate::descriptor::{Arity, CommandDescriptor, OptionDescriptor, PositionalDescriptor};
use crate::error::{ArgError, MissingArgument};
use crate::resolve::{Occurrence, ResolvedArgs};
use crate::value::{coerce, CoerceError, Value, ValueKind};
use tracing::{debug, trace};

/// What a successful binding pass left over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    /// Occurrences no option claimed and no catch-all received, in
    /// command-line order. Whether these are fatal is the caller's policy.
    pub unrouted: Vec<Occurrence>,

    /// Positional tokens left after every positional descriptor was served.
    pub extra_positionals: Vec<String>,
}

/// Bind `resolved` onto `target` according to `command`.
pub fn bind<T>(
    resolved: &mut ResolvedArgs,
    command: &CommandDescriptor<T>,
    target: &mut T,
) -> Result<BindReport, ArgError> {
    let mut missing = Vec::new();

    for option in command.options() {
        bind_option(resolved, option, target, &mut missing)?;
    }

    let tokens = resolved.positionals().map(<[String]>::to_vec);
    let mut cursor = 0;
    for positional in command.positionals() {
        let remaining = tokens.as_deref().map(|all| &all[cursor.min(all.len())..]);
        match (positional.spec.arity, remaining) {
            (Arity::List, Some(rest)) if !rest.is_empty() => {
                for token in rest {
                    assign_positional(positional, target, token)?;
                }
                cursor += rest.len();
            }
            (Arity::Single, Some([first, ..])) => {
                assign_positional(positional, target, first)?;
                cursor += 1;
            }
            _ => {
                if let Some(default) = &positional.spec.default_value {
                    assign_positional(positional, target, default)?;
                } else if positional.spec.required {
                    missing.push(MissingArgument::positional(&positional.spec.name));
                }
            }
        }
    }

    let leftovers: Vec<Occurrence> = resolved.unconsumed().cloned().collect();
    let unrouted = match command.catch_all_handler() {
        Some(handler) => {
            for occ in &leftovers {
                trace!(key = %occ.key, value = ?occ.value, "routed to catch-all");
                handler(target, &occ.key, occ.value.as_deref());
            }
            Vec::new()
        }
        None => leftovers,
    };

    if !missing.is_empty() {
        return Err(ArgError::MissingArguments(missing));
    }

    let extra_positionals = tokens
        .map(|all| all.get(cursor..).map(<[String]>::to_vec).unwrap_or_default())
        .unwrap_or_default();

    debug!(
        command = command.name(),
        unrouted = unrouted.len(),
        extra_positionals = extra_positionals.len(),
        "Arguments bound"
    );

    Ok(BindReport {
        unrouted,
        extra_positionals,
    })
}

fn bind_option<T>(
    resolved: &mut ResolvedArgs,
    option: &OptionDescriptor<T>,
    target: &mut T,
    missing: &mut Vec<MissingArgument>,
) -> Result<(), ArgError> {
    let spec = &option.spec;
    let candidates = spec
        .short
        .map(String::from)
        .into_iter()
        .chain(spec.long.clone())
        .chain(std::iter::once(spec.derived_name()));

    let mut selected = None;
    for key in candidates {
        if resolved.contains(&key) {
            selected = Some(key);
            break;
        }
    }

    let Some(key) = selected else {
        if let Some(default) = &spec.default_value {
            debug!(option = %spec.key(), default = %default, "Applying default");
            assign_option(option, target, Some(default.as_str()))?;
        } else if spec.required {
            missing.push(MissingArgument::option(spec.key()));
        }
        return Ok(());
    };

    resolved.mark_consumed(&key);
    if spec.show_help {
        return Err(ArgError::HelpRequested);
    }

    let values: Vec<Option<String>> = resolved
        .values(&key)
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    let take = if spec.multiple { values.len() } else { 1 };
    for value in values.iter().take(take) {
        trace!(option = %spec.key(), value = ?value, "Binding");
        assign_option(option, target, value.as_deref())?;
    }
    Ok(())
}

fn assign_option<T>(
    option: &OptionDescriptor<T>,
    target: &mut T,
    raw: Option<&str>,
) -> Result<(), ArgError> {
    let spec = &option.spec;
    let value = match raw {
        None if spec.is_boolean() => Value::Bool(true),
        None => return Err(ArgError::invalid(spec.flag(), "", "a value is required")),
        Some(raw) => coerce(spec.kind, raw)
            .map_err(|err| coercion_error(err, spec.flag(), &spec.field, spec.kind, raw))?,
    };
    option
        .assign(target, value)
        .map_err(|rejected| ArgError::unsupported(&spec.field, spec.kind.type_name(), rejected.to_string()))
}

fn assign_positional<T>(
    positional: &PositionalDescriptor<T>,
    target: &mut T,
    raw: &str,
) -> Result<(), ArgError> {
    let spec = &positional.spec;
    trace!(positional = %spec.name, value = raw, "Binding");
    let value = coerce(spec.kind, raw)
        .map_err(|err| coercion_error(err, spec.name.clone(), &spec.name, spec.kind, raw))?;
    positional
        .assign(target, value)
        .map_err(|rejected| ArgError::unsupported(&spec.name, spec.kind.type_name(), rejected.to_string()))
}

fn coercion_error(
    err: CoerceError,
    name: String,
    field: &str,
    kind: ValueKind,
    raw: &str,
) -> ArgError {
    match err {
        CoerceError::Invalid(reason) => ArgError::invalid(name, raw, reason),
        CoerceError::Unsupported(_) => ArgError::unsupported(field, kind.type_name(), raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{OptionSpec, PositionalSpec};
    use crate::resolve::resolve;

    #[derive(Debug, Default)]
    struct Target {
        name: Option<String>,
        count: i32,
        big: i64,
        ratio: f64,
        verbose: bool,
        tags: Vec<String>,
        first: Option<String>,
        second: Option<String>,
        rest: Vec<String>,
        unknown: Vec<(String, Option<String>)>,
    }

    fn command() -> CommandDescriptor<Target> {
        CommandDescriptor::new("test")
            .option(OptionSpec::new("name").long("name").short('n'), |t: &mut Target| &mut t.name)
            .option(OptionSpec::new("count").long("count").default("7"), |t: &mut Target| &mut t.count)
            .option(OptionSpec::new("big").short('b'), |t: &mut Target| &mut t.big)
            .option(OptionSpec::new("ratio").long("ratio"), |t: &mut Target| &mut t.ratio)
            .option(OptionSpec::new("verbose").short('v'), |t: &mut Target| &mut t.verbose)
            .option(OptionSpec::new("tags").long("tag"), |t: &mut Target| &mut t.tags)
    }

    fn run(
        command: &CommandDescriptor<Target>,
        args: &[&str],
    ) -> (Target, Result<BindReport, ArgError>) {
        let spec = command.spec();
        let mut resolved = resolve(args, &spec.options, 0).unwrap();
        let mut target = Target::default();
        let result = bind(&mut resolved, command, &mut target);
        (target, result)
    }

    #[test]
    fn test_defaults_apply_when_absent() {
        let (target, result) = run(&command(), &[]);
        result.unwrap();
        assert_eq!(target.count, 7);
        assert!(target.name.is_none());
    }

    #[test]
    fn test_explicit_value_overrides_default() {
        let (target, result) = run(&command(), &["--count", "0x10"]);
        result.unwrap();
        assert_eq!(target.count, 16);
    }

    #[test]
    fn test_boolean_presence_and_absence() {
        let (target, _) = run(&command(), &["-v"]);
        assert!(target.verbose);

        let (target, _) = run(&command(), &[]);
        assert!(!target.verbose);
    }

    #[test]
    fn test_single_valued_option_keeps_first_occurrence() {
        let (target, result) = run(&command(), &["--name", "a", "--name", "b"]);
        assert!(result.unwrap().unrouted.is_empty());
        assert_eq!(target.name.as_deref(), Some("a"));
    }

    #[test]
    fn test_multiple_option_replays_in_order() {
        let (target, _) = run(&command(), &["--tag", "x", "--tag", "y", "--tag", "z"]);
        assert_eq!(target.tags, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_short_alias_wins_over_long_name() {
        let (target, result) = run(&command(), &["--name", "long", "-n", "short"]);
        assert_eq!(target.name.as_deref(), Some("short"));
        let report = result.unwrap();
        assert_eq!(report.unrouted, vec![Occurrence::new("name", Some("long".into()))]);
    }

    #[test]
    fn test_numeric_coercions() {
        let (target, result) = run(&command(), &["-b", "-9000000000", "--ratio", "2.5e-1"]);
        result.unwrap();
        assert_eq!(target.big, -9_000_000_000);
        assert_eq!(target.ratio, 0.25);
    }

    #[test]
    fn test_invalid_value_aborts() {
        let (_, result) = run(&command(), &["--count", "many"]);
        match result.unwrap_err() {
            ArgError::InvalidValue { name, value, .. } => {
                assert_eq!(name, "--count");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_flag_occurrence_on_value_option_is_invalid() {
        let (_, result) = run(&command(), &["--name"]);
        assert!(matches!(result, Err(ArgError::InvalidValue { .. })));
    }

    #[test]
    fn test_all_missing_required_options_are_reported() {
        let command = CommandDescriptor::<Target>::new("req")
            .option(OptionSpec::new("name").long("name").required(), |t: &mut Target| &mut t.name)
            .option(OptionSpec::new("count").long("count").required(), |t: &mut Target| &mut t.count)
            .positional(PositionalSpec::new("FIRST").required(), |t: &mut Target| &mut t.first);
        let (_, result) = run(&command, &[]);
        match result.unwrap_err() {
            ArgError::MissingArguments(missing) => {
                let names: Vec<_> = missing.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(names, vec!["name", "count", "FIRST"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_required_option_with_default_is_satisfied() {
        let command = CommandDescriptor::<Target>::new("req")
            .option(
                OptionSpec::new("count").long("count").required().default("3"),
                |t: &mut Target| &mut t.count,
            );
        let (target, result) = run(&command, &[]);
        result.unwrap();
        assert_eq!(target.count, 3);
    }

    #[test]
    fn test_positionals_single_then_list() {
        let command = CommandDescriptor::<Target>::new("pos")
            .positional(PositionalSpec::new("FIRST"), |t: &mut Target| &mut t.first)
            .positional(PositionalSpec::new("SECOND"), |t: &mut Target| &mut t.second)
            .positional(PositionalSpec::new("REST"), |t: &mut Target| &mut t.rest);
        let (target, result) = run(&command, &["a", "b", "c", "d"]);
        result.unwrap();
        assert_eq!(target.first.as_deref(), Some("a"));
        assert_eq!(target.second.as_deref(), Some("b"));
        assert_eq!(target.rest, vec!["c", "d"]);
    }

    #[test]
    fn test_absent_positional_uses_default_or_reports_missing() {
        let command = CommandDescriptor::<Target>::new("pos")
            .positional(PositionalSpec::new("FIRST").default("-"), |t: &mut Target| &mut t.first)
            .positional(PositionalSpec::new("SECOND").required(), |t: &mut Target| &mut t.second);
        let (target, result) = run(&command, &[]);
        assert_eq!(target.first.as_deref(), Some("-"));
        assert_eq!(
            result.unwrap_err(),
            ArgError::MissingArguments(vec![MissingArgument::positional("SECOND")])
        );
    }

    #[test]
    fn test_exhausted_positionals_fall_back_to_default() {
        let command = CommandDescriptor::<Target>::new("pos")
            .positional(PositionalSpec::new("FIRST"), |t: &mut Target| &mut t.first)
            .positional(PositionalSpec::new("SECOND").default("b"), |t: &mut Target| &mut t.second);
        let (target, result) = run(&command, &["a"]);
        result.unwrap();
        assert_eq!(target.second.as_deref(), Some("b"));
    }

    #[test]
    fn test_exhausted_list_positional_is_missing_or_defaulted() {
        let required = CommandDescriptor::<Target>::new("cp")
            .positional(PositionalSpec::new("SRC").required(), |t: &mut Target| &mut t.first)
            .positional(PositionalSpec::new("DEST").required(), |t: &mut Target| &mut t.rest);

        let (target, result) = run(&required, &["a"]);
        assert_eq!(target.first.as_deref(), Some("a"));
        assert_eq!(
            result.unwrap_err(),
            ArgError::MissingArguments(vec![MissingArgument::positional("DEST")])
        );

        let (_, result) = run(&required, &["--"]);
        assert_eq!(
            result.unwrap_err(),
            ArgError::MissingArguments(vec![
                MissingArgument::positional("SRC"),
                MissingArgument::positional("DEST"),
            ])
        );

        let defaulted = CommandDescriptor::<Target>::new("cp")
            .positional(PositionalSpec::new("SRC"), |t: &mut Target| &mut t.first)
            .positional(PositionalSpec::new("DEST").default("."), |t: &mut Target| &mut t.rest);

        let (target, result) = run(&defaulted, &["a"]);
        result.unwrap();
        assert_eq!(target.rest, vec!["."]);

        let (target, result) = run(&defaulted, &["--"]);
        result.unwrap();
        assert!(target.first.is_none());
        assert_eq!(target.rest, vec!["."]);
    }

    #[test]
    fn test_extra_positionals_are_reported() {
        let command = CommandDescriptor::<Target>::new("pos")
            .positional(PositionalSpec::new("FIRST"), |t: &mut Target| &mut t.first);
        let (_, result) = run(&command, &["a", "b", "c"]);
        assert_eq!(result.unwrap().extra_positionals, vec!["b", "c"]);
    }

    #[test]
    fn test_catch_all_receives_unconsumed_occurrences() {
        let command = command().catch_all(|t: &mut Target, key: &str, value: Option<&str>| {
            t.unknown.push((key.to_string(), value.map(str::to_string)));
        });
        let (target, result) = run(&command, &["--name", "a", "-n", "b"]);
        assert!(result.unwrap().unrouted.is_empty());
        assert_eq!(target.unknown, vec![("name".to_string(), Some("a".to_string()))]);
    }

    #[test]
    fn test_hand_built_occurrences_with_unknown_keys_are_unrouted() {
        let command = command();
        let mut resolved = ResolvedArgs::new();
        resolved.push("mystery", Some("1".into()));
        resolved.push("v", None);
        let mut target = Target::default();
        let report = bind(&mut resolved, &command, &mut target).unwrap();
        assert!(target.verbose);
        assert_eq!(report.unrouted, vec![Occurrence::new("mystery", Some("1".into()))]);
    }

    #[test]
    fn test_show_help_option_short_circuits() {
        let command = command().option(
            OptionSpec::new("help").short('h').long("help").show_help(),
            |t: &mut Target| &mut t.verbose,
        );
        let (_, result) = run(&command, &["-h"]);
        assert_eq!(result.unwrap_err(), ArgError::HelpRequested);
    }

    #[test]
    fn test_boolean_default_is_a_declaration_error() {
        let command = CommandDescriptor::<Target>::new("bad")
            .option(OptionSpec::new("verbose").short('v').default("true"), |t: &mut Target| &mut t.verbose);
        let (_, result) = run(&command, &[]);
        let err = result.unwrap_err();
        assert!(err.is_declaration_error());
        assert_eq!(err, ArgError::unsupported("verbose", "bool", "true"));
    }

    #[test]
    fn test_unsupported_kind_fails_only_when_assigned() {
        let command = CommandDescriptor::<Target>::new("bad").option_with(
            OptionSpec::new("when").long("when").kind(ValueKind::Unsupported("SystemTime")),
            |_: &mut Target, value: Value| Err(value),
        );
        let (_, result) = run(&command, &[]);
        assert!(result.is_ok());

        let (_, result) = run(&command, &["--when", "now"]);
        assert_eq!(
            result.unwrap_err(),
            ArgError::unsupported("when", "SystemTime", "now")
        );
    }

    #[test]
    fn test_setter_mismatch_is_unsupported() {
        let command = CommandDescriptor::<Target>::new("bad").option_with(
            OptionSpec::new("count").long("count").kind(ValueKind::Text),
            |t: &mut Target, value: Value| match value {
                Value::Int32(n) => {
                    t.count = n;
                    Ok(())
                }
                other => Err(other),
            },
        );
        let (_, result) = run(&command, &["--count", "3"]);
        assert!(result.unwrap_err().is_declaration_error());
    }
}
