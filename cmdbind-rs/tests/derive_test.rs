//! Integration tests for `#[derive(Describe)]`.

use cmdbind::{parse_args, ArgError, Arity, Describe, MissingArgument, ValueKind};

#[derive(Debug, Default, Describe)]
#[command(name = "bar", desc = "Bar description")]
struct Bar {
    #[arg(long = "str", desc = "String option")]
    s: Option<String>,

    #[arg(short = 'i', desc = "int option w/ default", default = "42")]
    i: i32,

    #[arg(short = 'v', desc = "boolean option")]
    verbose: bool,

    #[arg(short = 'f', desc = "default boolean option")]
    should_be_false: bool,

    #[arg(long = "int", desc = "Integer option")]
    int_obj: Option<i32>,

    #[arg(positional)]
    arg: Option<String>,

    not_an_argument: u8,
}

#[test]
fn test_bar_binds_like_the_reference_command() {
    let (bar, report) = parse_args::<Bar, _>(&["--str", "bar", "--int", "2", "bar"], 0).unwrap();
    assert_eq!(bar.s.as_deref(), Some("bar"));
    assert_eq!(bar.i, 42);
    assert_eq!(bar.int_obj, Some(2));
    assert!(!bar.verbose);
    assert!(!bar.should_be_false);
    assert_eq!(bar.arg.as_deref(), Some("bar"));
    assert_eq!(bar.not_an_argument, 0);
    assert!(report.unrouted.is_empty());
}

#[test]
fn test_descriptor_metadata_from_attributes() {
    let descriptor = Bar::describe();
    assert_eq!(descriptor.name(), "bar");
    assert_eq!(descriptor.info().desc, "Bar description");

    let spec = descriptor.spec();
    let fields: Vec<_> = spec.options.iter().map(|o| o.field.as_str()).collect();
    assert_eq!(fields, vec!["s", "i", "verbose", "should_be_false", "int_obj"]);

    assert_eq!(spec.options[1].short, Some('i'));
    assert_eq!(spec.options[1].default_value.as_deref(), Some("42"));
    assert_eq!(spec.options[1].kind, ValueKind::Int32);
    assert_eq!(spec.options[2].kind, ValueKind::Bool);

    assert_eq!(spec.positionals.len(), 1);
    assert_eq!(spec.positionals[0].name, "ARG");
    assert_eq!(spec.positionals[0].arity, Arity::Single);
}

#[test]
fn test_cluster_and_start_offset() {
    let (bar, _) = parse_args::<Bar, _>(&["bar", "-vfi", "0x10"], 1).unwrap();
    assert!(bar.verbose);
    assert!(bar.should_be_false);
    assert_eq!(bar.i, 16);
    assert!(bar.arg.is_none());
}

#[test]
fn test_unknown_option_fails_before_binding() {
    let err = parse_args::<Bar, _>(&["--bogus"], 0).unwrap_err();
    assert_eq!(err, ArgError::UnknownArgument("--bogus".into()));
}

#[derive(Debug, Default, Describe)]
#[command(category = "Files", experimental)]
struct Mirror {
    #[arg(long = "dry-run")]
    dry_run: bool,

    #[arg(required, desc = "Destination directory")]
    dest_dir: String,

    #[arg(long = "exclude", short = 'x')]
    excludes: Vec<String>,

    #[arg(long = "level", multiple)]
    levels: Vec<i64>,

    #[arg(positional, name = "SOURCE", required)]
    source: String,

    #[arg(positional, name = "MORE")]
    more: Vec<String>,

    #[arg(catch_all)]
    extra: Vec<(String, Option<String>)>,
}

#[test]
fn test_defaults_for_command_name_and_derived_option_names() {
    let spec = Mirror::describe().spec();
    assert_eq!(spec.info.name, "mirror");
    assert_eq!(spec.info.category.as_deref(), Some("Files"));
    assert!(spec.info.experimental);
    assert!(spec.catch_all);

    let (mirror, _) = parse_args::<Mirror, _>(&["--dest-dir", "/tmp", "a.txt"], 0).unwrap();
    assert_eq!(mirror.dest_dir, "/tmp");
    assert_eq!(mirror.source, "a.txt");
    assert!(mirror.more.is_empty());
}

#[test]
fn test_vec_fields_collect_every_occurrence() {
    let args = [
        "-x", "*.o", "--exclude", "*.a", "--level", "-1", "--level", "2", "--dest-dir", "out",
        "one", "two", "three",
    ];
    let (mirror, _) = parse_args::<Mirror, _>(&args, 0).unwrap();
    assert_eq!(mirror.excludes, vec!["*.o"]);
    assert_eq!(mirror.levels, vec![-1, 2]);
    assert_eq!(mirror.source, "one");
    assert_eq!(mirror.more, vec!["two", "three"]);
}

#[test]
fn test_catch_all_receives_unclaimed_occurrences() {
    let (mirror, report) =
        parse_args::<Mirror, _>(&["--exclude", "a", "--dest-dir", "d", "src"], 0).unwrap();
    assert_eq!(mirror.excludes, vec!["a"]);
    assert!(mirror.extra.is_empty());
    assert!(report.unrouted.is_empty());

    // `-x` is claimed first, so the long-name occurrence is left over.
    let (mirror, _) =
        parse_args::<Mirror, _>(&["-x", "a", "--exclude", "b", "--dest-dir", "d", "src"], 0)
            .unwrap();
    assert_eq!(mirror.excludes, vec!["a"]);
    assert_eq!(mirror.extra, vec![("exclude".to_string(), Some("b".to_string()))]);
}

#[test]
fn test_all_missing_arguments_are_reported() {
    let err = parse_args::<Mirror, _>(&[] as &[&str], 0).unwrap_err();
    assert_eq!(
        err,
        ArgError::MissingArguments(vec![
            MissingArgument::option("dest-dir"),
            MissingArgument::positional("SOURCE"),
        ])
    );
}
