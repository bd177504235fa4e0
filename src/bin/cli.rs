//! linestore CLI
//!
//! Encode, decode, index and query newline-delimited record files.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use linestore::codec::escape::TERMINATOR;
use linestore::{
    codec_for, Collection, Config, FieldKind, MatchMode, Result, SchemaCodec, StoreError,
    Strategy,
};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// linestore CLI
#[derive(Parser, Debug)]
#[command(name = "linestore")]
#[command(about = "Record codec and field index for newline-delimited files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Codec selection shared by every subcommand
#[derive(Args, Debug, Clone)]
struct CodecArgs {
    /// Framing strategy (framed, tagged, plain)
    #[arg(short, long, default_value = "framed")]
    strategy: String,

    /// Use the native binary encoding
    #[arg(short, long)]
    binary: bool,

    /// Compress records
    #[arg(short, long)]
    compress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode JSON lines into stored lines
    Encode {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Decode stored lines back into JSON lines
    Decode {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,

        /// Skip undecodable lines instead of failing
        #[arg(long)]
        lenient: bool,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Index a stored file and print the line numbers matching a query
    Query {
        /// Stored file
        input: PathBuf,

        /// Criteria as a JSON object, e.g. '{"age": {">": 28}}'
        criteria: String,

        /// Indexed field as name:kind (kind = number or string)
        #[arg(short, long = "field", required = true)]
        fields: Vec<String>,

        /// Match any criterion instead of all
        #[arg(long)]
        any: bool,

        #[command(flatten)]
        codec: CodecArgs,
    },

    /// Detect a schema from the first JSON line and print positional rows
    Schema {
        /// Input file of JSON lines (stdin when omitted)
        input: Option<PathBuf>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linestore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match command {
        Commands::Encode { input, codec } => {
            let codec = codec_for(&codec_config(&codec)?.codec)?;
            for line in read_lines(input)? {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                let record: Value = serde_json::from_slice(&line)
                    .map_err(|e| StoreError::Json(e.to_string()))?;
                out.write_all(&codec.encode(&record)?)?;
            }
        }
        Commands::Decode {
            input,
            lenient,
            codec,
        } => {
            let codec = codec_for(&codec_config(&codec)?.codec)?;
            for (n, line) in read_lines(input)?.enumerate() {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                let record = if lenient {
                    match codec.safe_decode(&line) {
                        Some(record) => record,
                        None => {
                            tracing::warn!("Skipping undecodable line {}", n);
                            continue;
                        }
                    }
                } else {
                    codec.decode(&line)?
                };
                writeln!(out, "{}", record)?;
            }
        }
        Commands::Query {
            input,
            criteria,
            fields,
            any,
            codec,
        } => {
            let mut config = codec_config(&codec)?;
            for spec in &fields {
                let (name, kind) = parse_field(spec)?;
                config.indexes.push((name, kind));
            }

            let mut collection = Collection::open(config)?;
            let loaded = collection.load(BufReader::new(File::open(&input)?))?;
            tracing::info!("Indexed {} records from {}", loaded, input.display());

            let criteria: Value = serde_json::from_str(&criteria)
                .map_err(|e| StoreError::InvalidInput(format!("Bad criteria JSON: {}", e)))?;
            let mode = if any { MatchMode::Any } else { MatchMode::All };

            for line in collection.find_lines(&criteria, mode)? {
                writeln!(out, "{}", line)?;
            }
        }
        Commands::Schema { input } => {
            let mut schema = SchemaCodec::new();
            for line in read_lines(input)? {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                let record: Value = serde_json::from_slice(&line)
                    .map_err(|e| StoreError::Json(e.to_string()))?;

                if schema.schema().is_empty() {
                    schema.auto_detect_schema(&record)?;
                    writeln!(out, "{}", serde_json::json!(schema.schema().fields()))?;
                }

                match schema.object_to_array(&record) {
                    Some(row) => writeln!(out, "{}", SchemaCodec::row_to_value(&row))?,
                    None => writeln!(out, "{}", record)?,
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn codec_config(args: &CodecArgs) -> Result<Config> {
    let strategy: Strategy = args.strategy.parse()?;
    Ok(Config::builder()
        .strategy(strategy)
        .native_binary(args.binary)
        .compress(args.compress)
        .build())
}

/// "age:number" → ("age", Numeric)
fn parse_field(spec: &str) -> Result<(String, FieldKind)> {
    match spec.split_once(':') {
        Some((name, kind)) => Ok((name.to_string(), kind.parse()?)),
        None => Ok((spec.to_string(), FieldKind::Text)),
    }
}

fn read_lines(input: Option<PathBuf>) -> Result<Box<dyn Iterator<Item = io::Result<Vec<u8>>>>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    Ok(Box::new(reader.split(TERMINATOR)))
}
