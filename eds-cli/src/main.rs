// Command-line interface for eds
//
// This binary converts electrical-installation files between the EDS container
// and the authored YAML tree, and offers a few inspect views of a container.
//
// Converting:
//
// The source format is auto-detected from the file extension and can be overridden with --from.
// The target defaults to yaml for .eds inputs and to eds for everything else.
// Usage:
//  eds <input> [--to <format>] [--from <format>] [-o <file>]          - Convert between formats (default)
//  eds convert <input> [--to <format>] [--from <format>] [-o <file>]  - Same as above (explicit)
//  eds inspect <path> [<transform>]      - Execute a transform (defaults to "records-treeviz")
//  eds schema                            - Show the type-defaults schema in use
//  eds --list-transforms                 - List available transforms
//
// The output path defaults to the input path with the target's extension; `-o -` writes to stdout.
//
// Extra Parameters:
//
// Format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix and passes the parameters to the format/transform.
// Example:
//  eds huis.eds --extra-metadata false
//  eds inspect huis.eds --extra-props

use clap::{Arg, ArgAction, Command, ValueHint};
use eds_babel::publish::{self, PublishArtifact, PublishSpec};
use eds_babel::transforms::{self, DEFAULT_TRANSFORM};
use eds_babel::{FormatRegistry, TypeDefaults};
use eds_config::{EdsConfig, Loader};
use log::{debug, LevelFilter};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

const SUBCOMMANDS: &[&str] = &["inspect", "convert", "schema", "help"];

/// Parameters consumed while parsing; every other extra goes to the serializer.
const PARSE_PARAMS: &[&str] = &["asset-dir"];

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            let has_value = args.get(i + 1).is_some_and(|next| !next.starts_with('-'));

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("eds")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert electrical-installation files between EDS and YAML")
        .long_about(
            "eds converts installation designs between the EDS container used by the\n\
            editor and a hand-editable YAML tree.\n\n\
            Commands:\n  \
            - convert: Transform between formats (eds, yaml, json, treeviz)\n  \
            - inspect: View a container's payload, record tree or cross-references\n  \
            - schema:  Show the type defaults in use\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to pass format-specific options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            eds huis.eds                       # Write huis.yaml next to the input\n  \
            eds huis.yaml                      # Write huis.eds next to the input\n  \
            eds huis.eds --to json -o -        # Print the decoded payload\n  \
            eds inspect huis.eds refs-list     # List A.1, A.2, ... references",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-transforms")
                .long("list-transforms")
                .help("List available transforms")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to an eds.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("schema-path")
                .long("schema")
                .value_name("PATH")
                .help("Type-defaults schema to use instead of the configured one")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (error, warn, info, debug, trace); RUST_LOG is used otherwise")
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect the contents of an installation file")
                .long_about(
                    "View the structure of an installation file.\n\n\
                    Transforms:\n  \
                    - records-treeviz: Record list drawn as a tree (default)\n  \
                    - refs-list:       Cross-references with their record ids\n  \
                    - payload-json:    Decoded container payload\n\n\
                    Extra Parameters:\n  \
                    --extra-props      List every property under its record (records-treeviz)\n\n\
                    Examples:\n  \
                    eds inspect huis.eds                  # Tree visualization (default)\n  \
                    eds inspect huis.eds refs-list        # Cross-references\n  \
                    eds inspect huis.yaml payload-json    # Payload the YAML compiles to",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the installation file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("transform")
                        .help("Transform to apply. Defaults to 'records-treeviz'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            transforms::AVAILABLE_TRANSFORMS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between formats (default command)")
                .long_about(
                    "Convert installation files between formats.\n\n\
                    Supported formats:\n  \
                    - eds:     EDS container (.eds)\n  \
                    - yaml:    Authored tree (.yaml, .yml)\n  \
                    - json:    Decoded container payload (.json)\n  \
                    - treeviz: Record tree, output only (.tree)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    The output goes next to the input unless -o is given; -o - writes to stdout.\n\n\
                    Examples:\n  \
                    eds convert huis.eds                     # huis.eds -> huis.yaml\n  \
                    eds convert huis.yaml -o nieuw.eds       # Explicit output file\n  \
                    eds convert huis.eds --to json -o -      # Payload to stdout",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (yaml for .eds inputs, eds otherwise)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path, or '-' for stdout")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(Command::new("schema").about("Show the schema version and element types"))
}

fn main() {
    // Try to parse args. If no subcommand is provided, inject "convert"
    let args: Vec<String> = std::env::args().collect();
    let (cleaned_args, extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !SUBCOMMANDS.contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);
                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    init_logger(matches.get_one::<String>("log-level").map(String::as_str));

    if matches.get_flag("list-transforms") {
        handle_list_transforms_command();
        return;
    }

    let config = load_cli_config(
        matches.get_one::<String>("config").map(String::as_str),
        matches.get_one::<String>("schema-path").map(String::as_str),
    );
    let schema = Arc::new(load_schema(&config));
    let registry = FormatRegistry::with_schema(schema.clone(), config.export.include_metadata);

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => {
            let Some(path) = sub_matches.get_one::<String>("path") else {
                exit_with("path is required");
            };
            let transform = sub_matches
                .get_one::<String>("transform")
                .map(String::as_str)
                .unwrap_or(DEFAULT_TRANSFORM);
            handle_inspect_command(&registry, path, transform, &extra_params);
        }
        Some(("convert", sub_matches)) => {
            let Some(input) = sub_matches.get_one::<String>("input") else {
                exit_with("input is required");
            };
            let from = match sub_matches.get_one::<String>("from") {
                Some(f) => f.to_string(),
                None => registry
                    .detect_format_from_filename(input)
                    .unwrap_or_else(|| {
                        exit_with(format!(
                            "Could not detect format from filename '{input}'; specify --from explicitly"
                        ))
                    }),
            };
            let to = sub_matches
                .get_one::<String>("to")
                .cloned()
                .unwrap_or_else(|| default_target(&from).to_string());
            let output = sub_matches.get_one::<String>("output").map(String::as_str);
            handle_convert_command(&registry, &config, input, &from, &to, output, &extra_params);
        }
        Some(("schema", _)) => handle_schema_command(&schema),
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn exit_with(err: impl Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

fn init_logger(level: Option<&str>) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(raw) = level {
        let level = LevelFilter::from_str(raw).unwrap_or_else(|_| {
            eprintln!("Invalid log level: {raw}. Using 'warn' instead.");
            LevelFilter::Warn
        });
        builder.filter_level(level);
    }
    builder.init();
}

fn default_target(from: &str) -> &'static str {
    if from == "eds" {
        "yaml"
    } else {
        "eds"
    }
}

/// Input path with the extension of the target format.
fn default_output_path(registry: &FormatRegistry, input: &str, to: &str) -> PathBuf {
    let extension = registry
        .get(to)
        .ok()
        .and_then(|format| format.file_extensions().first().copied())
        .unwrap_or(to);
    Path::new(input).with_extension(extension)
}

/// Directory a file's relative references are resolved against.
fn directory_of(path: &Path) -> String {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
        _ => ".".to_string(),
    }
}

/// Split extras into parse-time and serialize-time options.
fn split_params(extra_params: &HashMap<String, String>) -> (HashMap<String, String>, HashMap<String, String>) {
    extra_params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(key, _)| PARSE_PARAMS.contains(&key.as_str()))
}

/// Parse options for `from`, filling in where yaml finds its image assets.
fn parse_options(
    from: &str,
    input: &str,
    mut options: HashMap<String, String>,
) -> HashMap<String, String> {
    if from == "yaml" {
        options
            .entry("asset-dir".to_string())
            .or_insert_with(|| directory_of(Path::new(input)));
    }
    options
}

/// Handle the inspect command
fn handle_inspect_command(
    registry: &FormatRegistry,
    path: &str,
    transform: &str,
    extra_params: &HashMap<String, String>,
) {
    let from = registry
        .detect_format_from_filename(path)
        .unwrap_or_else(|| "eds".to_string());
    let (parse_params, params) = split_params(extra_params);
    let options = parse_options(&from, path, parse_params);

    let doc = publish::load(registry, Path::new(path), &from, &options)
        .unwrap_or_else(|e| exit_with(e));
    let output =
        transforms::execute_transform(&doc, transform, &params).unwrap_or_else(|e| exit_with(e));

    print!("{output}");
}

/// Handle the convert command
fn handle_convert_command(
    registry: &FormatRegistry,
    config: &EdsConfig,
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
) {
    // Validate formats exist
    if let Err(e) = registry.get(from) {
        exit_with(e);
    }
    if let Err(e) = registry.get(to) {
        exit_with(e);
    }

    let (parse_params, mut format_options) = split_params(extra_params);
    let options = parse_options(from, input, parse_params);
    let doc = publish::load(registry, Path::new(input), from, &options)
        .unwrap_or_else(|e| exit_with(e));

    let output_path = match output {
        Some("-") => None,
        Some(path) => Some(PathBuf::from(path)),
        None => Some(default_output_path(registry, input, to)),
    };

    if to == "yaml" && config.export.extract_images {
        if let Some(path) = &output_path {
            format_options
                .entry("image-dir".to_string())
                .or_insert_with(|| directory_of(path));
        }
    }
    debug!("converting {input} from {from} to {to} with {format_options:?}");

    let mut spec = PublishSpec::new(&doc, to);
    spec.options = format_options;
    if let Some(path) = &output_path {
        spec = spec.with_output_path(path);
    }

    match publish::publish(registry, spec).unwrap_or_else(|e| exit_with(e)) {
        PublishArtifact::File(path) => println!("Converted {input} -> {}", path.display()),
        PublishArtifact::InMemory(text) => print!("{text}"),
    }
}

/// Handle the schema command
fn handle_schema_command(schema: &TypeDefaults) {
    println!("Schema version {}\n", schema.version());
    println!("Element types:");
    for name in schema.type_names() {
        println!("  {name} ({} defaults)", schema.defaults_for(name).len());
    }
}

/// Handle the list-transforms command
fn handle_list_transforms_command() {
    println!("Available transforms:\n");
    println!("  payload-json     - Decoded container payload as JSON");
    println!("  records-treeviz  - Record list drawn as a tree");
    println!("  refs-list        - Cross-references (<ref> <id> <type>)\n");

    println!("Conversion formats:");
    match FormatRegistry::with_defaults() {
        Ok(registry) => {
            for format_name in registry.list_formats() {
                println!("  {format_name}");
            }
        }
        Err(e) => exit_with(e),
    }
}

fn load_cli_config(explicit_path: Option<&str>, schema_override: Option<&str>) -> EdsConfig {
    let loader = Loader::new().with_optional_file("eds.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };
    let loader = match schema_override {
        Some(path) => loader
            .set_override("schema.path", path)
            .unwrap_or_else(|err| exit_with(format!("Failed to apply --schema: {err}"))),
        None => loader,
    };

    loader
        .build()
        .unwrap_or_else(|err| exit_with(format!("Failed to load configuration: {err}")))
}

fn load_schema(config: &EdsConfig) -> TypeDefaults {
    let schema = match config.schema.external_path() {
        Some(path) => TypeDefaults::load(path),
        None => TypeDefaults::builtin(),
    };
    schema.unwrap_or_else(|e| exit_with(e))
}
