//! Command-line interface for fiber-spy
//! Instruments markup modules and shows which source locations produced each rendered node.
//!
//! Usage:
//!   fiber-spy instrument `<path>`                                   - Print the instrumented module
//!   fiber-spy inspect `<path>` [--component `<name>`] [--props `<json>`] [--format `<format>`]
//!                                                                 - Render an export and print its structure
//!   fiber-spy tokens `<path>`                                       - Print the token stream as JSON
//!
//! Every command accepts `--config <file>` to layer a configuration file over the defaults.

use clap::{Arg, ArgMatches, Command};
use fiber_spy::spy::formats::FormatRegistry;
use fiber_spy::spy::pipeline::{compile_file, inspect_source, read_source};
use fiber_spy::spy::runtime::Value;
use fiber_spy::spy::syntax::tokenize_with_spans;
use fiber_spy_config::{Loader, SpyConfig};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fiber_spy=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let path_arg = || {
        Arg::new("path")
            .help("Path to the markup module")
            .required(true)
            .index(1)
    };

    let matches = Command::new("fiber-spy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Map rendered markup trees back to the source that produced them")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("instrument")
                .about("Print the instrumented module")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Render an export and print the reconstructed structure")
                .arg(path_arg())
                .arg(
                    Arg::new("component")
                        .long("component")
                        .help("Export to render (default from configuration)"),
                )
                .arg(
                    Arg::new("props")
                        .long("props")
                        .help("Props passed to the export, as a JSON object")
                        .default_value("{}"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format: treeviz, json or yaml (default from configuration)"),
                ),
        )
        .subcommand(
            Command::new("tokens")
                .about("Print the token stream as JSON")
                .arg(path_arg()),
        )
        .get_matches();

    let Some((command, sub)) = matches.subcommand() else {
        unreachable!("a subcommand is required");
    };
    // `--config` is global, so every subcommand sees it
    let config = load_config(sub.get_one::<String>("config"));

    match command {
        "instrument" => handle_instrument_command(&config, sub),
        "inspect" => handle_inspect_command(&config, sub),
        "tokens" => handle_tokens_command(sub),
        other => unreachable!("unknown subcommand {}", other),
    }
}

fn load_config(path: Option<&String>) -> SpyConfig {
    let mut loader = Loader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    })
}

fn path_of(matches: &ArgMatches) -> &Path {
    Path::new(
        matches
            .get_one::<String>("path")
            .expect("path is a required argument"),
    )
}

/// Handle the instrument command
fn handle_instrument_command(config: &SpyConfig, matches: &ArgMatches) {
    let compiled = compile_file(path_of(matches), &config.instrument.to_options()).unwrap_or_else(|e| {
        eprintln!("Instrumentation error: {}", e);
        std::process::exit(1);
    });
    print!("{}", compiled.code);
}

/// Handle the inspect command
fn handle_inspect_command(config: &SpyConfig, matches: &ArgMatches) {
    let path = path_of(matches);
    let component = matches
        .get_one::<String>("component")
        .unwrap_or(&config.inspect.component);
    let format = matches
        .get_one::<String>("format")
        .unwrap_or(&config.inspect.format);
    let props = matches
        .get_one::<String>("props")
        .expect("props has a default value");

    let registry = FormatRegistry::with_defaults();
    if !registry.has(format) {
        eprintln!("Format '{}' not supported", format);
        eprintln!("Available formats: {}", registry.list_formats().join(", "));
        std::process::exit(1);
    }

    let props: serde_json::Value = serde_json::from_str(props).unwrap_or_else(|e| {
        eprintln!("Invalid --props JSON: {}", e);
        std::process::exit(1);
    });

    let source = read_source(path).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    let inspection = inspect_source(
        &source,
        &path.to_string_lossy(),
        component,
        Value::from_json(&props),
        &config.instrument.to_options(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Inspection error: {}", e);
        std::process::exit(1);
    });

    let output = registry
        .serialize(&inspection.structures, &inspection.document, format)
        .unwrap_or_else(|e| {
            eprintln!("Error formatting structure: {}", e);
            std::process::exit(1);
        });
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
}

/// Handle the tokens command
fn handle_tokens_command(matches: &ArgMatches) {
    let source = read_source(path_of(matches)).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    let tokens = tokenize_with_spans(&source);
    let json = serde_json::to_string_pretty(&tokens).unwrap_or_else(|e| {
        eprintln!("Error formatting tokens: {}", e);
        std::process::exit(1);
    });
    println!("{}", json);
}
