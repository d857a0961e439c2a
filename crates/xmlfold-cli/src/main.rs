use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use xmlfold::{EncodeOptions, ParserConfig};

#[derive(Debug, Parser)]
#[command(
    name = "xmlfold",
    version,
    about = "Decode untrusted XML payloads and encode structures back to XML"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode XML and print the structure as JSON
    Decode {
        #[command(flatten)]
        io: IoArgs,
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Decode XML and encode it again with the given formatting
    Reencode {
        #[command(flatten)]
        io: IoArgs,
        /// Emit the <?xml ...?> declaration
        #[arg(short, long)]
        declaration: bool,
        /// Pretty-print with indentation
        #[arg(short, long)]
        indent: bool,
        /// Root element name
        #[arg(long, default_value = "xml")]
        root: String,
        /// Element name for sequence entries
        #[arg(long, default_value = xmlfold::DEFAULT_LABEL)]
        item: String,
    },
}

#[derive(Debug, Args)]
struct IoArgs {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Maximum element nesting depth (0 means unlimited)
    #[arg(long, default_value_t = ParserConfig::default().max_depth)]
    max_depth: u16,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match Cli::parse().command {
        Command::Decode { io, pretty } => {
            let data = read_and_decode(&io)?;
            let json = if pretty {
                serde_json::to_string_pretty(&data)?
            } else {
                serde_json::to_string(&data)?
            };
            write_output(&io.output, json.as_bytes())
        }
        Command::Reencode {
            io,
            declaration,
            indent,
            root,
            item,
        } => {
            let data = read_and_decode(&io)?;
            let options = EncodeOptions::default()
                .headless(!declaration)
                .indent(indent)
                .root(root)
                .item(item);
            let xml = xmlfold::encode(&data, &options);
            write_output(&io.output, xml.as_bytes())
        }
    }
}

fn read_and_decode(io: &IoArgs) -> Result<xmlfold::Mapping> {
    let input = read_input(&io.input)?;
    debug!(bytes = input.len(), "read input");
    let data = xmlfold::try_decode_with_config(&input, ParserConfig::new(io.max_depth))
        .context("input is not a well-formed xml document")?;
    info!(fields = data.len(), "decoded document");
    Ok(data)
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            stdout.write_all(b"\n").context("failed to write stdout")?;
            Ok(())
        }
    }
}
