//! Usage text and command list rendering.
//!
//! Both renderers work from type-erased [`CommandSpec`] snapshots so they can
//! run without a command value.

use crate::descriptor::{CommandSpec, OptionSpec};
use crate::registry::RegistryConfig;
use std::collections::BTreeMap;

const MIN_COLUMN: usize = 4;

/// Render the list of available commands grouped by category.
///
/// Deprecated and hidden commands are omitted. Experimental commands are
/// marked with `*`.
pub fn render_command_list<'a, I>(commands: I, config: &RegistryConfig) -> String
where
    I: IntoIterator<Item = &'a CommandSpec>,
{
    let listed: Vec<&CommandSpec> = commands
        .into_iter()
        .filter(|spec| !spec.info.deprecated && !spec.info.hidden)
        .collect();

    let width = listed
        .iter()
        .map(|spec| spec.info.name.len() + usize::from(spec.info.experimental))
        .fold(MIN_COLUMN, usize::max);

    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for spec in &listed {
        let info = &spec.info;
        let category = info.category.as_deref().unwrap_or(config.default_category.as_str());
        let label = if info.experimental {
            format!("{}*", info.name)
        } else {
            info.name.clone()
        };
        let line = if info.desc.is_empty() {
            format!("  {label}")
        } else {
            format!("  {label:<width$} - {}", info.desc)
        };
        groups.entry(category).or_default().push(line);
    }

    let order: Vec<&str> = match &config.category_order {
        Some(order) => order.iter().map(String::as_str).collect(),
        None => groups.keys().copied().collect(),
    };

    let mut lines = Vec::new();
    if let Some(header) = &config.help_header {
        lines.push(header.clone());
        lines.push(String::new());
    }
    if let Some(usage) = &config.default_usage {
        lines.push(usage.clone());
        lines.push(String::new());
    }
    lines.push("Available commands:".to_string());

    for category in order {
        lines.push(format!("[{category}]"));
        if let Some(entries) = groups.get_mut(category) {
            entries.sort();
            lines.append(entries);
        }
        lines.push(String::new());
    }

    if listed.iter().any(|spec| spec.info.experimental) {
        lines.push("* = experimental command".to_string());
        lines.push(String::new());
    }
    if let Some(footer) = &config.help_footer {
        lines.push(footer.clone());
    }

    finish(lines)
}

/// Render the help screen for one command.
pub fn render_command_help(spec: &CommandSpec, config: &RegistryConfig) -> String {
    let visible: Vec<&OptionSpec> = spec.visible_options().collect();
    let mut required: Vec<&OptionSpec> = visible.iter().copied().filter(|o| o.required).collect();
    let mut optional: Vec<&OptionSpec> = visible.iter().copied().filter(|o| !o.required).collect();
    required.sort_by_key(|o| o.key());
    optional.sort_by_key(|o| o.key());

    let width = visible.iter().map(|o| row_size(o)).fold(MIN_COLUMN, usize::max);
    let any_short = visible.iter().any(|o| o.short.is_some());

    let mut lines = Vec::new();
    if let Some(header) = &config.help_header {
        lines.push(header.clone());
        lines.push(String::new());
    }

    let info = &spec.info;
    if info.desc.is_empty() {
        lines.push(info.name.clone());
    } else {
        lines.push(format!("{} - {}", info.name, info.desc));
    }
    if !info.doc.is_empty() {
        lines.push(info.doc.clone());
    }
    lines.push(String::new());
    lines.push(usage_line(spec, config, !optional.is_empty()));

    for (title, group) in [("Required options:", &required), ("Options:", &optional)] {
        if group.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(title.to_string());
        lines.extend(group.iter().map(|o| option_row(o, width, any_short)));
    }

    if !info.footer.is_empty() {
        lines.push(String::new());
        lines.push(info.footer.clone());
    }
    if let Some(footer) = &config.help_footer {
        lines.push(String::new());
        lines.push(footer.clone());
    }

    finish(lines)
}

fn usage_line(spec: &CommandSpec, config: &RegistryConfig, has_optional: bool) -> String {
    let mut usage = String::from("Usage:");
    if let Some(prog) = &config.prog_name {
        usage.push(' ');
        usage.push_str(prog);
    }
    usage.push(' ');
    usage.push_str(&spec.info.name);
    if has_optional {
        usage.push_str(" [options]");
    }
    for positional in &spec.positionals {
        if positional.required {
            usage.push_str(&format!(" {}", positional.name));
        } else {
            usage.push_str(&format!(" {{{}}}", positional.name));
        }
    }
    usage
}

fn long_label(opt: &OptionSpec) -> Option<String> {
    match (&opt.long, opt.short) {
        (Some(long), _) => Some(long.clone()),
        (None, Some(_)) => None,
        (None, None) => Some(opt.derived_name()),
    }
}

fn placeholder(opt: &OptionSpec) -> Option<String> {
    if opt.is_boolean() {
        return None;
    }
    opt.help_value
        .clone()
        .or_else(|| opt.kind.placeholder().map(str::to_string))
}

/// Width of the name and placeholder part of a row, used for alignment.
fn row_size(opt: &OptionSpec) -> usize {
    let name = long_label(opt).map_or(1, |long| long.len());
    name + placeholder(opt).map_or(0, |p| p.len() + 1)
}

fn option_row(opt: &OptionSpec, width: usize, any_short: bool) -> String {
    let long = long_label(opt);

    let mut row = String::from("  ");
    match opt.short {
        Some(short) => {
            row.push('-');
            row.push(short);
            if long.is_some() {
                row.push(' ');
            }
        }
        None if any_short => row.push_str("   "),
        None => {}
    }
    if let Some(long) = &long {
        row.push_str("--");
        row.push_str(long);
    }
    if let Some(value) = placeholder(opt) {
        row.push(' ');
        row.push_str(&value);
    }
    if long.is_none() {
        row.push_str("    ");
    }

    let pad = width.saturating_sub(row_size(opt));
    row.push_str(&" ".repeat(pad));
    row.push_str("  : ");
    row.push_str(&opt.desc);

    let default = opt.default_text.as_ref().or(opt.default_value.as_ref());
    if let Some(default) = default {
        row.push_str(&format!(" (default: {default})"));
    }
    row
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
