//! Tokenizer/Resolver: raw argv tokens → option occurrences + positionals.
//!
//! Accepted syntax:
//!
//! - `--name value`, `--name` (flag). There is no `--name=value` form.
//! - `-c value`, `-c`, and clusters `-abc` where every character but the
//!   last is a bare flag and only the last may take the following token.
//! - `--` ends option parsing; every later token is positional verbatim.
//! - Any other token (including a lone `-`) starts positional collection and
//!   disables option parsing for the rest of the input.
//!
//! Whether an option consumes the following token depends on its declared
//! kind: numeric options always take it (so `--offset -5` works), non-flag
//! options take a literal `-`, flags never take one, and anything else takes
//! the next token unless it looks like an option.

use crate::descriptor::OptionSpec;
use crate::error::ArgError;
use std::collections::HashSet;
use tracing::{debug, trace};

/// One resolved option instance as written on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Long name without `--`, or the single short character without `-`.
    pub key: String,

    /// Payload, or `None` when the option appeared as a bare flag.
    pub value: Option<String>,

    /// Written with `--` rather than `-`.
    pub long_form: bool,
}

impl Occurrence {
    /// Build an occurrence whose form is guessed from the key: single
    /// characters are short, anything longer is long.
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        let key = key.into();
        let long_form = key.chars().count() != 1;
        Self {
            key,
            value,
            long_form,
        }
    }

    /// `--name` as written on the command line.
    pub fn long(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: name.into(),
            value,
            long_form: true,
        }
    }

    /// `-c` as written on the command line, alone or inside a cluster.
    pub fn short(c: char, value: Option<String>) -> Self {
        Self {
            key: c.to_string(),
            value,
            long_form: false,
        }
    }

    /// The key as it was typed.
    pub fn flag(&self) -> String {
        if self.long_form {
            format!("--{}", self.key)
        } else {
            format!("-{}", self.key)
        }
    }
}

/// Output of [`resolve`], consumed by one binding pass.
#[derive(Debug, Clone, Default)]
pub struct ResolvedArgs {
    occurrences: Vec<Occurrence>,
    positionals: Option<Vec<String>>,
    consumed: HashSet<String>,
}

impl ResolvedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence. Order and duplicates are preserved.
    pub fn push(&mut self, key: impl Into<String>, value: Option<String>) {
        self.push_occurrence(Occurrence::new(key, value));
    }

    pub fn push_occurrence(&mut self, occurrence: Occurrence) {
        self.occurrences.push(occurrence);
    }

    /// Switch to positional collection; later calls are no-ops.
    pub fn start_positionals(&mut self) {
        self.positionals.get_or_insert_with(Vec::new);
    }

    pub fn push_positional(&mut self, token: impl Into<String>) {
        self.positionals
            .get_or_insert_with(Vec::new)
            .push(token.into());
    }

    /// Every occurrence in command-line order.
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Positional tokens, or `None` when positional collection never started.
    pub fn positionals(&self) -> Option<&[String]> {
        self.positionals.as_deref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.occurrences.iter().any(|occ| occ.key == key)
    }

    /// Payloads recorded under `key`, in command-line order.
    pub fn values(&self, key: &str) -> Vec<Option<&str>> {
        self.occurrences
            .iter()
            .filter(|occ| occ.key == key)
            .map(|occ| occ.value.as_deref())
            .collect()
    }

    pub fn mark_consumed(&mut self, key: &str) {
        self.consumed.insert(key.to_string());
    }

    pub fn is_consumed(&self, key: &str) -> bool {
        self.consumed.contains(key)
    }

    /// Occurrences whose key no descriptor claimed, in command-line order.
    pub fn unconsumed(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences
            .iter()
            .filter(|occ| !self.consumed.contains(&occ.key))
    }
}

/// Resolve `tokens[start..]` against the declared `options`.
///
/// Fails with [`ArgError::UnknownArgument`] as soon as a token names an option
/// that is not declared; no partial result is returned.
pub fn resolve<S: AsRef<str>>(
    tokens: &[S],
    options: &[OptionSpec],
    start: usize,
) -> Result<ResolvedArgs, ArgError> {
    let mut resolved = ResolvedArgs::new();
    let mut i = start;

    while i < tokens.len() {
        let token = tokens[i].as_ref();
        let next = tokens.get(i + 1).map(AsRef::as_ref);

        if resolved.positionals.is_some() {
            trace!(token, "positional");
            resolved.push_positional(token);
            i += 1;
        } else if token == "--" {
            resolved.start_positionals();
            i += 1;
        } else if let Some(name) = token.strip_prefix("--") {
            let spec = options
                .iter()
                .find(|opt| opt.matches_long(name))
                .ok_or_else(|| ArgError::UnknownArgument(token.to_string()))?;
            let value = take_value(spec, next);
            trace!(key = name, value = ?value, "long option");
            i += if value.is_some() { 2 } else { 1 };
            resolved.push_occurrence(Occurrence::long(name, value.map(str::to_string)));
        } else if token.len() > 1 && token.starts_with('-') {
            let mut chars = token[1..].chars().peekable();
            let mut took_next = false;
            while let Some(c) = chars.next() {
                let spec = options
                    .iter()
                    .find(|opt| opt.short == Some(c))
                    .ok_or_else(|| ArgError::UnknownArgument(token.to_string()))?;
                let value = if chars.peek().is_some() {
                    None
                } else {
                    take_value(spec, next)
                };
                trace!(key = %c, value = ?value, "short option");
                took_next = value.is_some();
                resolved.push_occurrence(Occurrence::short(c, value.map(str::to_string)));
            }
            i += if took_next { 2 } else { 1 };
        } else {
            trace!(token, "positional collection starts");
            resolved.push_positional(token);
            i += 1;
        }
    }

    debug!(
        occurrences = resolved.occurrences.len(),
        positionals = ?resolved.positionals,
        "Arguments resolved"
    );
    Ok(resolved)
}

/// Decide whether `spec` consumes the following token as its payload.
fn take_value<'a>(spec: &OptionSpec, next: Option<&'a str>) -> Option<&'a str> {
    let next = next?;
    if spec.is_numeric() {
        return Some(next);
    }
    if next == "-" && !spec.is_boolean() {
        return Some(next);
    }
    if next.starts_with('-') || spec.is_boolean() {
        return None;
    }
    Some(next)
}
