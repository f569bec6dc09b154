//! odsgen Command-Line Tool
//!
//! Compiles an entity graph document into a relational schema.

mod error;
mod formatter;

use clap::{Parser, ValueEnum};
use error::CliError;
use formatter::OutputFormat;
use odsgen_model::EntityGraph;
use odsgen_relational::config::DEFAULT_MAX_IDENTITY_DEPTH;
use odsgen_relational::{compile, CompileConfig, Dialect};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "odsgen_cli=info,odsgen_relational=info";

/// odsgen relational schema compiler
#[derive(Parser, Debug)]
#[command(name = "odsgen")]
#[command(version, about = "Compile an entity graph into a relational schema")]
pub struct Args {
    /// Entity graph document (JSON)
    pub input: PathBuf,

    /// Write the output here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "json", value_enum)]
    pub format: OutputFormat,

    /// Dialect for default-constraint expressions
    #[arg(long, default_value = "sql-server", value_enum)]
    pub dialect: DialectArg,

    /// Namespace receiving the shared Descriptor table
    #[arg(long)]
    pub descriptor_namespace: Option<String>,

    /// Identity propagation depth limit
    #[arg(long, default_value_t = DEFAULT_MAX_IDENTITY_DEPTH)]
    pub max_depth: usize,

    /// Also write a binary schema snapshot to this path
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Print the schema fingerprint to stderr
    #[arg(long)]
    pub fingerprint: bool,
}

/// Dialect choices on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    /// Microsoft SQL Server
    SqlServer,
    /// PostgreSQL
    Postgresql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::SqlServer => Dialect::SqlServer,
            DialectArg::Postgresql => Dialect::PostgreSql,
        }
    }
}

impl Args {
    /// Compile settings selected by the flags.
    pub fn compile_config(&self) -> CompileConfig {
        let config = CompileConfig::new()
            .with_dialect(self.dialect.into())
            .with_max_identity_depth(self.max_depth);
        match &self.descriptor_namespace {
            Some(namespace) => config.with_base_descriptor_namespace(namespace),
            None => config,
        }
    }
}

/// Formatted output of one run.
#[derive(Debug)]
pub struct Rendered {
    /// Formatted schema.
    pub body: String,
    /// Schema fingerprint, when requested.
    pub fingerprint: Option<String>,
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(rendered) => {
            if let Some(fingerprint) = rendered.fingerprint {
                eprintln!("fingerprint: {}", fingerprint);
            }
            if args.output.is_none() {
                println!("{}", rendered.body);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load, compile and render; writes the output and snapshot files when requested.
fn run(args: &Args) -> Result<Rendered, CliError> {
    let json = std::fs::read_to_string(&args.input).map_err(|e| CliError::io(&args.input, e))?;
    let graph = EntityGraph::from_json(&json)?;
    info!(
        input = %args.input.display(),
        entities = graph.len(),
        "loaded entity graph"
    );

    let formatter = formatter::create_formatter(args.format);
    let schema = compile(&graph, &args.compile_config())
        .map_err(|errors| CliError::Compile(formatter.format_errors(&errors)))?;

    let body = formatter.format_schema(&schema)?;
    if let Some(path) = &args.output {
        std::fs::write(path, &body).map_err(|e| CliError::io(path, e))?;
        info!(output = %path.display(), tables = schema.table_count(), "wrote schema");
    }
    if let Some(path) = &args.snapshot {
        std::fs::write(path, schema.to_bytes()?).map_err(|e| CliError::io(path, e))?;
        info!(snapshot = %path.display(), "wrote schema snapshot");
    }

    let fingerprint = if args.fingerprint {
        Some(schema.fingerprint()?)
    } else {
        None
    };
    Ok(Rendered { body, fingerprint })
}
