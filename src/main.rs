use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};
use std::path::PathBuf;

use balangkas::{
    api::{self, BalangkasError, BuildOptions, ConflictMode},
    EntryKind, RenameOutcome,
};

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("build")
                .about("Creates the project layout under a root, asking before replacing existing entries")
                .arg(
                    Arg::new("root")
                        .help("Project root; created if missing, a blank value removes the layout")
                        .required(true),
                )
                .arg(layout_arg())
                .arg(
                    Arg::new("on-conflict")
                        .long("on-conflict")
                        .help("How to treat entries that already exist")
                        .value_parser(["ask", "overwrite", "skip"])
                        .default_value("ask"),
                )
                .arg(
                    Arg::new("author")
                        .long("author")
                        .help("Name written to logs/LayoutCreation.txt"),
                )
                .arg(
                    Arg::new("foreground")
                        .long("foreground")
                        .help("Build on the main thread instead of a worker thread")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Prints the directory tree under a root")
                .arg(Arg::new("root").help("Project root").required(true)),
        )
        .subcommand(
            Command::new("layout")
                .about("Previews the directories and files a build would create")
                .arg(layout_arg())
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Label for the root of the preview")
                        .default_value("<root>"),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Adds a directory or an empty file inside a parent directory")
                .arg(Arg::new("parent").help("Parent directory").required(true))
                .arg(
                    Arg::new("target")
                        .help("Name relative to the parent, or a path inside it")
                        .required(true),
                )
                .arg(
                    Arg::new("dir")
                        .short('d')
                        .long("dir")
                        .help("Add a directory instead of a file")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("rename")
                .about("Renames a file or directory in place, never replacing an existing one")
                .arg(Arg::new("path").help("Entry to rename").required(true))
                .arg(Arg::new("new-name").help("New name; prompted for when omitted")),
        )
        .subcommand_required(true)
        .get_matches();

    init_logger(matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("build", args)) => handle_build(args),
        Some(("tree", args)) => handle_tree(args),
        Some(("layout", args)) => handle_layout(args),
        Some(("add", args)) => handle_add(args),
        Some(("rename", args)) => handle_rename(args),
        _ => unreachable!(),
    };

    result.map_err(miette::Report::new)
}

fn layout_arg() -> Arg {
    Arg::new("layout")
        .short('l')
        .long("layout")
        .help("TOML layout file; the built-in layout is used when omitted")
        .value_parser(value_parser!(PathBuf))
}

fn init_logger(is_verbose: bool) {
    let level = if is_verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn handle_build(args: &ArgMatches) -> Result<(), BalangkasError> {
    let root = args.get_one::<String>("root").expect("root required");

    let on_conflict = match args.get_one::<String>("on-conflict").map(String::as_str) {
        Some("overwrite") => ConflictMode::Overwrite,
        Some("skip") => ConflictMode::Skip,
        _ => ConflictMode::Ask,
    };

    let options = BuildOptions {
        layout: args.get_one::<PathBuf>("layout").cloned(),
        author: args.get_one::<String>("author").cloned(),
        on_conflict,
        foreground: args.get_flag("foreground"),
    };

    if let Some(report) = api::build_layout(root, &options)? {
        api::print_report(&report);
        println!("\n{}", api::show_tree(root)?);
    }

    Ok(())
}

fn handle_tree(args: &ArgMatches) -> Result<(), BalangkasError> {
    let root = args.get_one::<String>("root").expect("root required");

    println!("{}", api::show_tree(root)?);

    Ok(())
}

fn handle_layout(args: &ArgMatches) -> Result<(), BalangkasError> {
    let name = args.get_one::<String>("name").expect("name has a default");

    api::show_layout(args.get_one::<PathBuf>("layout").map(PathBuf::as_path), name)
}

fn handle_add(args: &ArgMatches) -> Result<(), BalangkasError> {
    let parent = args.get_one::<String>("parent").expect("parent required");
    let target = args.get_one::<String>("target").expect("target required");

    let kind = if args.get_flag("dir") {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    let (path, outcome) = api::add_entry(parent, target, kind)?;

    api::print_outcome(&path, &outcome);

    Ok(())
}

fn handle_rename(args: &ArgMatches) -> Result<(), BalangkasError> {
    let path = args.get_one::<String>("path").expect("path required");
    let new_name = args.get_one::<String>("new-name").map(String::as_str);

    match api::rename_entry(path, new_name)? {
        RenameOutcome::Renamed(new_path) => println!("renamed {} -> {}", path, new_path.display()),
        RenameOutcome::Unchanged => println!("{} unchanged", path),
    }

    Ok(())
}
