//! `qms audit` command - recent changes from the audit log

use miette::Result;

use crate::cli::helpers::{open_repo, print_structured, resolve_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::AuditEntry;

#[derive(clap::Args, Debug)]
pub struct AuditArgs {
    /// Number of entries to show
    #[arg(long, short = 'n', default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("timestamp", "TIMESTAMP", 20),
    ColumnDef::new("action", "ACTION", 8),
    ColumnDef::new("table", "TABLE", 18),
    ColumnDef::new("entity", "ENTITY", 20),
    ColumnDef::new("changes", "CHANGES", 60),
];

pub fn run(args: AuditArgs, global: &GlobalOpts) -> Result<()> {
    let repo = open_repo(global)?;
    let entries = repo.recent_audit(args.limit)?;

    let format = resolve_format(args.format, resolve_format(global.format, OutputFormat::Tsv));
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&entries, format),
        _ => {
            if entries.is_empty() && format == OutputFormat::Tsv {
                println!("No audit entries found.");
                return Ok(());
            }
            let rows: Vec<TableRow> = entries.iter().map(table_row).collect();
            TableFormatter::new(COLUMNS, "audit entry")
                .without_summary()
                .output(&rows, format)
        }
    }
}

fn table_row(entry: &AuditEntry) -> TableRow {
    let changes = entry
        .changes
        .as_ref()
        .map(|c| c.to_string())
        .unwrap_or_default();
    TableRow::new(entry.id.to_string())
        .cell("timestamp", CellValue::DateTime(entry.timestamp))
        .cell("action", CellValue::Text(entry.action.to_string()))
        .cell("table", CellValue::Text(entry.entity_type.clone()))
        .cell("entity", CellValue::Id(entry.entity_id.clone()))
        .cell("changes", CellValue::opt_text(Some(&changes)))
}
