//! Output formatters for compiled schemas and compile errors.

use crate::error::CliError;
use clap::ValueEnum;
use comfy_table::Table as ComfyTable;
use odsgen_relational::{CompileErrors, RelationalSchema, Table};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full schema as JSON
    Json,
    /// One row per table
    Summary,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

/// Renders compile results.
pub trait Formatter {
    /// Format a compiled schema.
    fn format_schema(&self, schema: &RelationalSchema) -> Result<String, CliError>;

    /// Format the errors of a failed compile.
    fn format_errors(&self, errors: &CompileErrors) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Summary => Box::new(SummaryFormatter),
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_schema(&self, schema: &RelationalSchema) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(schema)?)
    }

    fn format_errors(&self, errors: &CompileErrors) -> String {
        let errors: Vec<serde_json::Value> = errors
            .errors()
            .iter()
            .map(|e| {
                serde_json::json!({
                    "kind": format!("{:?}", e.kind),
                    "path": e.path,
                    "message": e.message,
                })
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::json!({ "errors": errors }))
            .unwrap_or_else(|_| "{}".to_string())
    }
}

/// Table summary formatter using comfy-table.
pub struct SummaryFormatter;

impl Formatter for SummaryFormatter {
    fn format_schema(&self, schema: &RelationalSchema) -> Result<String, CliError> {
        let mut table = ComfyTable::new();
        table.set_header(vec![
            "Namespace",
            "Table",
            "Kind",
            "Columns",
            "Primary Key",
            "Foreign Keys",
        ]);

        for t in schema.tables() {
            table.add_row(vec![
                t.namespace.clone(),
                t.name.clone(),
                format!("{:?}", t.kind),
                t.columns.len().to_string(),
                t.primary_key.join(", "),
                foreign_key_targets(t),
            ]);
        }

        Ok(format!(
            "{}\n{} table(s) in {} namespace(s)",
            table,
            schema.table_count(),
            schema.namespaces.len()
        ))
    }

    fn format_errors(&self, errors: &CompileErrors) -> String {
        let mut output = errors.format_report();
        output.push_str(&format!("{} error(s)", errors.len()));
        output
    }
}

fn foreign_key_targets(table: &Table) -> String {
    table
        .foreign_keys
        .iter()
        .map(|fk| {
            let marker = match (fk.cascade_on_delete, fk.cascade_on_update) {
                (true, true) => " (cascade, update cascade)",
                (true, false) => " (cascade)",
                (false, true) => " (update cascade)",
                (false, false) => "",
            };
            format!("{}.{}{}", fk.target_namespace, fk.target_table, marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
