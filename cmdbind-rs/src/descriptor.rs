//! Option, positional and command descriptors.
//!
//! A [`CommandDescriptor`] is the explicit table the binder consumes: static
//! metadata for every option and positional plus a typed setter for the field
//! it fills. Descriptors are built once at registration and never mutated.
//!
//! # Example
//!
//! ```
//! use cmdbind::{CommandDescriptor, OptionSpec, PositionalSpec};
//!
//! #[derive(Default)]
//! struct CopyFiles {
//!     verbose: bool,
//!     depth: i32,
//!     files: Vec<String>,
//! }
//!
//! let descriptor = CommandDescriptor::<CopyFiles>::new("copy")
//!     .desc("Copy files")
//!     .option(OptionSpec::new("verbose").short('v'), |c: &mut CopyFiles| &mut c.verbose)
//!     .option(OptionSpec::new("depth").long("depth").default("1"), |c: &mut CopyFiles| &mut c.depth)
//!     .positional(PositionalSpec::new("FILE").required(), |c: &mut CopyFiles| &mut c.files);
//!
//! assert_eq!(descriptor.options().len(), 2);
//! assert!(descriptor.options()[0].spec.is_boolean());
//! ```

use crate::value::{Bindable, Value, ValueKind};
use serde::Serialize;

// ============================================================================
// Serializable Specs
// ============================================================================

/// Static metadata for one declared option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    /// Identifier of the target field; source of the derived fallback name.
    pub field: String,

    /// Long name, written as `--name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,

    /// Short alias, written as `-c`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,

    /// Semantic type of the target field.
    pub kind: ValueKind,

    pub required: bool,

    /// Apply every occurrence in command-line order instead of only the first.
    pub multiple: bool,

    /// Coerced and assigned when the option is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    /// Shown in help instead of the raw default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_text: Option<String>,

    /// Value placeholder in help (e.g. `FILE`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_value: Option<String>,

    pub desc: String,

    /// Omit from help output.
    pub hidden: bool,

    /// Presence of this option requests the command help instead of a run.
    pub show_help: bool,
}

impl OptionSpec {
    /// Create a text option bound to `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            long: None,
            short: None,
            kind: ValueKind::Text,
            required: false,
            multiple: false,
            default_value: None,
            default_text: None,
            help_value: None,
            desc: String::new(),
            hidden: false,
            show_help: false,
        }
    }

    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    pub fn help_value(mut self, placeholder: impl Into<String>) -> Self {
        self.help_value = Some(placeholder.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn show_help(mut self) -> Self {
        self.show_help = true;
        self
    }

    /// Fallback long name derived from the field identifier (`dry_run` → `dry-run`).
    pub fn derived_name(&self) -> String {
        self.field.replace('_', "-")
    }

    pub fn is_boolean(&self) -> bool {
        self.kind.is_bool()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }

    /// Does `--name` refer to this option?
    pub fn matches_long(&self, name: &str) -> bool {
        self.long.as_deref() == Some(name) || self.derived_name() == name
    }

    /// Identifier used in messages and for sorting help: the long name, else
    /// the short alias, else the derived name.
    pub fn key(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => self.derived_name(),
        }
    }

    /// The option as a user would type it, e.g. `--count` or `-c`.
    pub fn flag(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => format!("--{}", self.derived_name()),
        }
    }
}

/// How many positional tokens a positional descriptor takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// The next unconsumed token.
    Single,

    /// Every remaining token.
    List,
}

/// Static metadata for one declared positional argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalSpec {
    pub name: String,
    pub desc: String,
    pub kind: ValueKind,
    pub arity: Arity,
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl PositionalSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: String::new(),
            kind: ValueKind::Text,
            arity: Arity::Single,
            required: false,
            default_value: None,
        }
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }
}

/// Command-level metadata used by the registry and help output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub desc: String,

    /// Longer text printed under the title in command help.
    pub doc: String,

    /// Group in the command list; `None` uses the registry default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    pub footer: String,
    pub experimental: bool,
    pub deprecated: bool,
    pub hidden: bool,
}

/// Type-erased snapshot of a command's full declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandSpec {
    #[serde(flatten)]
    pub info: CommandInfo,
    pub options: Vec<OptionSpec>,
    pub positionals: Vec<PositionalSpec>,

    /// Whether unconsumed occurrences are routed to a catch-all handler.
    pub catch_all: bool,
}

impl CommandSpec {
    /// Options shown in help, in declaration order.
    pub fn visible_options(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter().filter(|opt| !opt.hidden)
    }
}

// ============================================================================
// Typed Descriptors
// ============================================================================

/// Assigns one coerced value to a field of `T`. A value of the wrong variant
/// is handed back so the binder can report it.
pub type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), Value> + Send + Sync>;

/// Receives occurrences no option descriptor claimed.
pub type CatchAll<T> = Box<dyn Fn(&mut T, &str, Option<&str>) + Send + Sync>;

/// One declared option with its setter.
pub struct OptionDescriptor<T> {
    pub spec: OptionSpec,
    setter: Setter<T>,
}

impl<T> OptionDescriptor<T> {
    pub fn new(spec: OptionSpec, setter: Setter<T>) -> Self {
        Self { spec, setter }
    }

    pub(crate) fn assign(&self, target: &mut T, value: Value) -> Result<(), Value> {
        (self.setter)(target, value)
    }
}

/// One declared positional with its setter.
pub struct PositionalDescriptor<T> {
    pub spec: PositionalSpec,
    setter: Setter<T>,
}

impl<T> PositionalDescriptor<T> {
    pub fn new(spec: PositionalSpec, setter: Setter<T>) -> Self {
        Self { spec, setter }
    }

    pub(crate) fn assign(&self, target: &mut T, value: Value) -> Result<(), Value> {
        (self.setter)(target, value)
    }
}

/// Full declaration of a command whose arguments bind onto a `T`.
pub struct CommandDescriptor<T> {
    info: CommandInfo,
    options: Vec<OptionDescriptor<T>>,
    positionals: Vec<PositionalDescriptor<T>>,
    catch_all: Option<CatchAll<T>>,
}

impl<T: 'static> CommandDescriptor<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: CommandInfo {
                name: name.into(),
                ..CommandInfo::default()
            },
            options: Vec::new(),
            positionals: Vec::new(),
            catch_all: None,
        }
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.info.desc = desc.into();
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.info.doc = doc.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.info.category = Some(category.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.info.footer = footer.into();
        self
    }

    pub fn experimental(mut self) -> Self {
        self.info.experimental = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.info.deprecated = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.info.hidden = true;
        self
    }

    /// Declare an option bound to the field `accessor` points at.
    ///
    /// The option's kind comes from the field type; `Vec<_>` fields accept
    /// multiple occurrences.
    pub fn option<F>(mut self, spec: OptionSpec, accessor: fn(&mut T) -> &mut F) -> Self
    where
        F: Bindable + 'static,
    {
        let mut spec = spec.kind(F::KIND);
        spec.multiple |= F::MULTIPLE;
        let setter: Setter<T> =
            Box::new(move |target: &mut T, value: Value| F::assign(accessor(target), value));
        self.options.push(OptionDescriptor::new(spec, setter));
        self
    }

    /// Declare an option with a hand-written setter. The spec's kind is kept
    /// as given, which allows [`ValueKind::Unsupported`].
    pub fn option_with<S>(mut self, spec: OptionSpec, setter: S) -> Self
    where
        S: Fn(&mut T, Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        self.options.push(OptionDescriptor::new(spec, Box::new(setter)));
        self
    }

    /// Declare a positional bound to the field `accessor` points at.
    /// `Vec<_>` fields take every remaining positional token.
    pub fn positional<F>(mut self, spec: PositionalSpec, accessor: fn(&mut T) -> &mut F) -> Self
    where
        F: Bindable + 'static,
    {
        let arity = if F::MULTIPLE { Arity::List } else { Arity::Single };
        let spec = spec.kind(F::KIND).arity(arity);
        let setter: Setter<T> =
            Box::new(move |target: &mut T, value: Value| F::assign(accessor(target), value));
        self.positionals.push(PositionalDescriptor::new(spec, setter));
        self
    }

    /// Route unconsumed occurrences to `handler` instead of reporting them.
    pub fn catch_all<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut T, &str, Option<&str>) + Send + Sync + 'static,
    {
        self.catch_all = Some(Box::new(handler));
        self
    }
}

impl<T> CommandDescriptor<T> {
    pub fn info(&self) -> &CommandInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn options(&self) -> &[OptionDescriptor<T>] {
        &self.options
    }

    pub fn positionals(&self) -> &[PositionalDescriptor<T>] {
        &self.positionals
    }

    pub(crate) fn catch_all_handler(&self) -> Option<&CatchAll<T>> {
        self.catch_all.as_ref()
    }

    /// Type-erased snapshot for help rendering and manifests.
    pub fn spec(&self) -> CommandSpec {
        CommandSpec {
            info: self.info.clone(),
            options: self.options.iter().map(|o| o.spec.clone()).collect(),
            positionals: self.positionals.iter().map(|p| p.spec.clone()).collect(),
            catch_all: self.catch_all.is_some(),
        }
    }
}
