//! Command line entry point for object store documents.
//!
//! # Responsibility
//! - Inspect component XML files and print a deterministic summary.
//! - Rewrite component XML in canonical form.
//! - Keep all component semantics in `objstore_core`.

mod document;

use clap::{Parser, Subcommand};
use document::Document;
use log::{error, info};
use objstore_core::{
    init_logging_from_config, ConfigError, LoggingError, StoreConfig, XmlElement, XmlError,
    XmlFormat,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "objstore_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect and normalize object store component XML")]
struct Cli {
    /// JSON store config; enables file logging when it names a log directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the core library version.
    Version,
    /// Parse a component document and print a summary.
    Inspect {
        file: PathBuf,
        /// Print the parsed component as JSON instead.
        #[arg(long)]
        json: bool,
    },
    /// Parse a component document and print it in canonical form.
    Normalize {
        file: PathBuf,
        /// Spaces per nesting level; 0 writes a single line.
        #[arg(long)]
        indent: Option<usize>,
        /// Omit the `<?xml ...?>` declaration.
        #[arg(long)]
        no_declaration: bool,
    },
}

#[derive(Debug)]
enum CliError {
    Io { path: PathBuf, source: std::io::Error },
    Xml { path: PathBuf, source: XmlError },
    Config(ConfigError),
    Logging(LoggingError),
    Json(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read `{}`: {source}", path.display()),
            Self::Xml { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "cannot encode JSON: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Xml { source, .. } => Some(source),
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path).map_err(CliError::Config)?,
        None => StoreConfig::default(),
    };
    if config.logging.dir.is_some() {
        init_logging_from_config(&config.logging).map_err(CliError::Logging)?;
    }

    match cli.command {
        Command::Version => {
            println!("objstore_core version={}", objstore_core::core_version());
        }
        Command::Inspect { file, json } => {
            println!("{}", inspect(&file, json)?);
            info!(
                "event=cli_inspect module=cli status=ok file={}",
                file.display()
            );
        }
        Command::Normalize {
            file,
            indent,
            no_declaration,
        } => {
            let mut format = config.xml;
            if let Some(indent) = indent {
                format.indent = indent;
            }
            if no_declaration {
                format.declaration = false;
            }
            println!("{}", normalize(&file, &format)?);
            info!(
                "event=cli_normalize module=cli status=ok file={} indent={}",
                file.display(),
                format.indent
            );
        }
    }
    Ok(())
}

/// Summary lines, or pretty JSON when `json` is set.
fn inspect(path: &Path, json: bool) -> Result<String, CliError> {
    let document = read_document(path)?;
    if json {
        serde_json::to_string_pretty(&document).map_err(CliError::Json)
    } else {
        Ok(document.summary().join("\n"))
    }
}

fn normalize(path: &Path, format: &XmlFormat) -> Result<String, CliError> {
    read_document(path)?
        .to_xml()
        .to_xml_string(format)
        .map_err(|source| CliError::Xml {
            path: path.to_path_buf(),
            source,
        })
}

fn read_document(path: &Path) -> Result<Document, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    XmlElement::parse(&raw)
        .and_then(|element| Document::read(&element))
        .map_err(|source| CliError::Xml {
            path: path.to_path_buf(),
            source,
        })
}
