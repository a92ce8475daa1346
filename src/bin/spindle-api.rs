//! Spindle API CLI
//!
//! Command-line interface for dumping stored records to resource
//! documents and loading payloads back into stored records.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use spindle_api::{load_input_auto, Context, LoadError, Mapper, ResourceType};

#[derive(Parser)]
#[command(name = "spindle-api")]
#[command(about = "Map scraping project records to and from JSON:API documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump a stored record to a resource document
    Dump {
        /// Record source: file path or URL (http:// or https://)
        record: String,

        /// Resource type (e.g. spiders, samples, annotations)
        #[arg(long, short = 't')]
        r#type: String,

        /// Ancestor context entry, repeatable (e.g. -c project_id=shop)
        #[arg(long = "context", short = 'c', value_name = "KEY=VALUE")]
        context: Vec<String>,

        /// Treat the input as a list of records
        #[arg(long)]
        many: bool,

        /// Suppress relationships, emit plain attributes only
        #[arg(long)]
        skip_relationships: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load a resource payload back into a stored record
    Load {
        /// Payload source: file path or URL (http:// or https://)
        payload: String,

        /// Resource type (e.g. spiders, samples, annotations)
        #[arg(long, short = 't')]
        r#type: String,

        /// Skip relationship folding
        #[arg(long)]
        skip_relationships: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dump {
            record,
            r#type,
            context,
            many,
            skip_relationships,
            pretty,
            output,
        } => run_dump(DumpArgs {
            record,
            resource_type: r#type,
            context,
            many,
            skip_relationships,
            pretty,
            output,
        }),

        Commands::Load {
            payload,
            r#type,
            skip_relationships,
            pretty,
            output,
        } => run_load(&payload, &r#type, skip_relationships, pretty, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct DumpArgs {
    record: String,
    resource_type: String,
    context: Vec<String>,
    many: bool,
    skip_relationships: bool,
    pretty: bool,
    output: Option<PathBuf>,
}

fn run_dump(args: DumpArgs) -> Result<(), u8> {
    let mapper = mapper_for(&args.resource_type)?.skip_relationships(args.skip_relationships);
    let mut context = parse_context(&args.context)?;

    let input = load_input_auto(&args.record).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let document = if args.many {
        let Some(records) = input.as_array() else {
            eprintln!("Error: --many expects the input to be a JSON array");
            return Err(2);
        };
        mapper.dump_many(records, &mut context)
    } else {
        mapper.dump(&input, &mut context)
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    emit(&document, args.pretty, args.output)
}

fn run_load(
    payload_source: &str,
    resource_type: &str,
    skip_relationships: bool,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let mapper = mapper_for(resource_type)?.skip_relationships(skip_relationships);

    let payload = load_input_auto(payload_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let record = match mapper.load(&payload) {
        Ok(record) => record,
        Err(LoadError::Invalid { errors }) => {
            eprintln!("Validation failed:");
            for error in errors {
                eprintln!("  {}", error);
            }
            return Err(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(e.exit_code() as u8);
        }
    };

    emit(&record.into(), pretty, output)
}

fn mapper_for(resource_type: &str) -> Result<Mapper, u8> {
    match ResourceType::parse(resource_type) {
        Some(kind) => Ok(Mapper::new(kind)),
        None => {
            eprintln!("Error: unknown resource type \"{}\"", resource_type);
            Err(2)
        }
    }
}

fn parse_context(entries: &[String]) -> Result<Context, u8> {
    let mut context = Context::new();
    for entry in entries {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => context.set(key, value),
            _ => {
                eprintln!("Error: invalid context entry \"{}\": expected KEY=VALUE", entry);
                return Err(2);
            }
        }
    }
    Ok(context)
}

fn emit(value: &serde_json::Value, pretty: bool, output: Option<PathBuf>) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
