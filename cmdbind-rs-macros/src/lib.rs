use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitChar, LitStr};

/// Derives `cmdbind::Describe` for a struct with named fields or a unit struct.
///
/// # Usage
///
/// ```ignore
/// #[derive(Default, Describe)]
/// #[command(name = "grep", desc = "Search files", category = "Text")]
/// struct Grep {
///     #[arg(short = 'i', desc = "Ignore case")]
///     ignore_case: bool,
///
///     #[arg(long = "max-count", short = 'm', help_value = "NUM")]
///     max_count: Option<i64>,
///
///     #[arg(positional, name = "PATTERN", required)]
///     pattern: String,
///
///     #[arg(positional, name = "FILE")]
///     files: Vec<String>,
///
///     #[arg(catch_all)]
///     rest: Vec<(String, Option<String>)>,
/// }
/// ```
///
/// This will generate:
///
/// ```ignore
/// impl cmdbind::Describe for Grep {
///     fn describe() -> cmdbind::CommandDescriptor<Self> {
///         cmdbind::CommandDescriptor::new("grep")
///             .desc("Search files")
///             .category("Text")
///             .option(cmdbind::OptionSpec::new("ignore_case").short('i').desc("Ignore case"),
///                     |target: &mut Self| &mut target.ignore_case)
///             // ...
///     }
/// }
/// ```
///
/// Fields without `#[arg]` are not bound. The command name defaults to the
/// lowercased struct name and a positional name to the uppercased field name.
#[proc_macro_derive(Describe, attributes(command, arg))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct CommandAttrs {
    name: Option<LitStr>,
    desc: Option<LitStr>,
    doc: Option<LitStr>,
    category: Option<LitStr>,
    footer: Option<LitStr>,
    experimental: bool,
    deprecated: bool,
    hidden: bool,
}

#[derive(Default)]
struct ArgAttrs {
    positional: bool,
    catch_all: bool,
    long: Option<LitStr>,
    short: Option<LitChar>,
    name: Option<LitStr>,
    desc: Option<LitStr>,
    default: Option<LitStr>,
    default_text: Option<LitStr>,
    help_value: Option<LitStr>,
    required: bool,
    multiple: bool,
    hidden: bool,
    show_help: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let fields: Vec<&syn::Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Describe requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Describe can only be derived for structs",
            ))
        }
    };

    let command = parse_command_attrs(&input.attrs)?;
    let name = command
        .name
        .as_ref()
        .map(LitStr::value)
        .unwrap_or_else(|| ident.unraw().to_string().to_lowercase());

    let mut chain = quote! { ::cmdbind::CommandDescriptor::<Self>::new(#name) };
    for (method, value) in [
        ("desc", &command.desc),
        ("doc", &command.doc),
        ("category", &command.category),
        ("footer", &command.footer),
    ] {
        if let Some(value) = value {
            let method = syn::Ident::new(method, proc_macro2::Span::call_site());
            chain = quote! { #chain.#method(#value) };
        }
    }
    if command.experimental {
        chain = quote! { #chain.experimental() };
    }
    if command.deprecated {
        chain = quote! { #chain.deprecated() };
    }
    if command.hidden {
        chain = quote! { #chain.hidden() };
    }

    let mut catch_all_seen = false;
    for field in fields {
        let Some(attrs) = parse_arg_attrs(&field.attrs)? else {
            continue;
        };
        let Some(field_ident) = &field.ident else {
            continue;
        };

        if attrs.catch_all {
            if catch_all_seen {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "only one #[arg(catch_all)] field is allowed",
                ));
            }
            catch_all_seen = true;
            chain = quote! {
                #chain.catch_all(|target: &mut Self, key: &str, value: ::core::option::Option<&str>| {
                    target.#field_ident.push((key.to_string(), value.map(str::to_string)));
                })
            };
        } else if attrs.positional {
            let spec = positional_spec(field_ident, &attrs);
            chain = quote! {
                #chain.positional(#spec, |target: &mut Self| &mut target.#field_ident)
            };
        } else {
            let spec = option_spec(field_ident, &attrs);
            chain = quote! {
                #chain.option(#spec, |target: &mut Self| &mut target.#field_ident)
            };
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::cmdbind::Describe for #ident #ty_generics #where_clause {
            fn describe() -> ::cmdbind::CommandDescriptor<Self> {
                #chain
            }
        }
    })
}

fn option_spec(field: &syn::Ident, attrs: &ArgAttrs) -> TokenStream2 {
    let field_name = field.unraw().to_string();
    let mut spec = quote! { ::cmdbind::OptionSpec::new(#field_name) };

    if let Some(long) = &attrs.long {
        spec = quote! { #spec.long(#long) };
    }
    if let Some(short) = &attrs.short {
        spec = quote! { #spec.short(#short) };
    }
    for (method, value) in [
        ("desc", &attrs.desc),
        ("default", &attrs.default),
        ("default_text", &attrs.default_text),
        ("help_value", &attrs.help_value),
    ] {
        if let Some(value) = value {
            let method = syn::Ident::new(method, proc_macro2::Span::call_site());
            spec = quote! { #spec.#method(#value) };
        }
    }
    for (method, set) in [
        ("required", attrs.required),
        ("multiple", attrs.multiple),
        ("hidden", attrs.hidden),
        ("show_help", attrs.show_help),
    ] {
        if set {
            let method = syn::Ident::new(method, proc_macro2::Span::call_site());
            spec = quote! { #spec.#method() };
        }
    }
    spec
}

fn positional_spec(field: &syn::Ident, attrs: &ArgAttrs) -> TokenStream2 {
    let name = attrs
        .name
        .as_ref()
        .map(LitStr::value)
        .unwrap_or_else(|| field.unraw().to_string().to_uppercase());
    let mut spec = quote! { ::cmdbind::PositionalSpec::new(#name) };

    if let Some(desc) = &attrs.desc {
        spec = quote! { #spec.desc(#desc) };
    }
    if let Some(default) = &attrs.default {
        spec = quote! { #spec.default(#default) };
    }
    if attrs.required {
        spec = quote! { #spec.required() };
    }
    spec
}

fn parse_command_attrs(attrs: &[syn::Attribute]) -> syn::Result<CommandAttrs> {
    let mut out = CommandAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("command")) {
        attr.parse_nested_meta(|meta| {
            let key = meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default();
            match key.as_str() {
                "name" => out.name = Some(meta.value()?.parse()?),
                "desc" => out.desc = Some(meta.value()?.parse()?),
                "doc" => out.doc = Some(meta.value()?.parse()?),
                "category" => out.category = Some(meta.value()?.parse()?),
                "footer" => out.footer = Some(meta.value()?.parse()?),
                "experimental" => out.experimental = true,
                "deprecated" => out.deprecated = true,
                "hidden" => out.hidden = true,
                _ => return Err(meta.error("unknown #[command] attribute")),
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// `None` when the field carries no `#[arg]` attribute.
fn parse_arg_attrs(attrs: &[syn::Attribute]) -> syn::Result<Option<ArgAttrs>> {
    let mut found = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("arg")) {
        let out: &mut ArgAttrs = found.get_or_insert_with(ArgAttrs::default);
        attr.parse_nested_meta(|meta| {
            let key = meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default();
            match key.as_str() {
                "positional" => out.positional = true,
                "catch_all" => out.catch_all = true,
                "long" => out.long = Some(meta.value()?.parse()?),
                "short" => out.short = Some(meta.value()?.parse()?),
                "name" => out.name = Some(meta.value()?.parse()?),
                "desc" => out.desc = Some(meta.value()?.parse()?),
                "default" => out.default = Some(meta.value()?.parse()?),
                "default_text" => out.default_text = Some(meta.value()?.parse()?),
                "help_value" => out.help_value = Some(meta.value()?.parse()?),
                "required" => out.required = true,
                "multiple" => out.multiple = true,
                "hidden" => out.hidden = true,
                "show_help" => out.show_help = true,
                _ => return Err(meta.error("unknown #[arg] attribute")),
            }
            Ok(())
        })?;

        if out.positional && out.catch_all {
            return Err(syn::Error::new_spanned(
                attr,
                "an argument cannot be both positional and catch_all",
            ));
        }
        if out.positional && (out.long.is_some() || out.short.is_some()) {
            return Err(syn::Error::new_spanned(
                attr,
                "positional arguments take `name`, not `long` or `short`",
            ));
        }
        if !out.positional && out.name.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "`name` is only valid on positional arguments; use `long` for options",
            ));
        }
    }
    Ok(found)
}
