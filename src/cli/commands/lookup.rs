//! `qms employee|workcenter|part|customer|inspection` commands
//!
//! One subcommand set shared by all five lookup kinds. Which flags apply
//! depends on the kind: `--email` for employees, `--code` for workcenters
//! and customers, `--description` for part numbers and inspection items.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{open_repo, print_structured, resolve_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::reference::resolve_in;
use crate::entities::{
    Customer, Employee, InspectionItem, LookupEntity, LookupKind, LookupPatch, LookupRecord,
    NewLookup, PartNumber, Workcenter,
};
use crate::store::{RecordRepository, RepoError};

#[derive(Subcommand, Debug)]
pub enum LookupCommands {
    /// List active records
    List(ListArgs),

    /// Create a new record
    New(NewArgs),

    /// Show a record's details
    Show(ShowArgs),

    /// Change fields of a record
    Edit(EditArgs),

    /// Deactivate a record (soft delete)
    Delete(ShowArgs),

    /// Reactivate a deactivated record
    Restore(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in name, code, email and description (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Name (or part number)
    pub label: String,

    /// Unique code (workcenters, customers)
    #[arg(long, short = 'c')]
    pub code: Option<String>,

    /// Email address (employees)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Description (part numbers, inspection items)
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Id, code, email or exact name
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Id, code, email or exact name
    pub id: String,

    /// New name (or part number)
    #[arg(long)]
    pub name: Option<String>,

    /// New code
    #[arg(long, short = 'c')]
    pub code: Option<String>,

    /// New email
    #[arg(long, short = 'e', conflicts_with = "clear_email")]
    pub email: Option<String>,

    /// Remove the email address
    #[arg(long)]
    pub clear_email: bool,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

pub fn run(kind: LookupKind, cmd: LookupCommands, global: &GlobalOpts) -> Result<()> {
    let mut repo = open_repo(global)?;
    match cmd {
        LookupCommands::List(args) => run_list(repo.as_ref(), kind, args, global),
        LookupCommands::New(args) => run_new(repo.as_mut(), kind, args, global),
        LookupCommands::Show(args) => run_show(repo.as_ref(), kind, args, global),
        LookupCommands::Edit(args) => run_edit(repo.as_mut(), kind, args, global),
        LookupCommands::Delete(args) => run_delete(repo.as_mut(), kind, args, global),
        LookupCommands::Restore(args) => run_restore(repo.as_mut(), kind, args, global),
    }
}

fn run_list(
    repo: &dyn RecordRepository,
    kind: LookupKind,
    args: ListArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let mut records = repo.list_active(kind)?;

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        records.retain(|r| matches_search(r, &needle));
    }
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    if args.count {
        println!("{}", records.len());
        return Ok(());
    }

    let format = resolve_format(args.format, resolve_format(global.format, OutputFormat::Tsv));
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let values = records
                .into_iter()
                .map(typed_value)
                .collect::<Result<Vec<_>>>()?;
            print_structured(&values, format)
        }
        _ => {
            if records.is_empty() && format == OutputFormat::Tsv {
                println!("No {} records found.", kind.label());
                return Ok(());
            }
            let columns = list_columns(kind);
            let rows: Vec<TableRow> = records.iter().map(|r| table_row(kind, r)).collect();
            let formatter = TableFormatter::new(&columns, kind.label());
            if global.quiet {
                formatter.without_summary().output(&rows, format)
            } else {
                formatter.output(&rows, format)
            }
        }
    }
}

fn run_new(
    repo: &mut dyn RecordRepository,
    kind: LookupKind,
    args: NewArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let new = build_new(kind, args)?;
    let created = repo.create_lookup(kind, &new)?;

    if global.quiet {
        println!("{}", created.id);
        return Ok(());
    }
    println!(
        "{} Created {} {}",
        style("✓").green(),
        kind.label(),
        style(&created.id).cyan()
    );
    match created.secondary.as_deref() {
        Some(secondary) => println!(
            "   {} | {}",
            style(&created.label).white(),
            style(secondary).yellow()
        ),
        None => println!("   {}", style(&created.label).white()),
    }
    Ok(())
}

fn run_show(
    repo: &dyn RecordRepository,
    kind: LookupKind,
    args: ShowArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let id = resolve_id(repo, kind, &args.id)?;
    let record = repo
        .fetch_lookup(kind, &id)?
        .ok_or_else(|| RepoError::not_found(kind.table(), &id))?;

    let format = resolve_format(global.format, OutputFormat::Yaml);
    match format {
        OutputFormat::Id => {
            println!("{}", record.id);
            Ok(())
        }
        _ => print_structured(&typed_value(record)?, format),
    }
}

fn run_edit(
    repo: &mut dyn RecordRepository,
    kind: LookupKind,
    args: EditArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let id = resolve_id(repo, kind, &args.id)?;
    let patch = build_patch(kind, &args)?;
    if patch.is_empty() {
        return Err(miette::miette!(
            "Nothing to change. Pass at least one field flag (see --help)"
        ));
    }

    let updated = repo.update_lookup(kind, &id, &patch)?;
    if !global.quiet {
        println!(
            "{} Updated {} {}",
            style("✓").green(),
            kind.label(),
            style(&updated.id).cyan()
        );
    }
    Ok(())
}

fn run_delete(
    repo: &mut dyn RecordRepository,
    kind: LookupKind,
    args: ShowArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let id = resolve_id(repo, kind, &args.id)?;
    repo.soft_delete_lookup(kind, &id)?;
    if !global.quiet {
        println!(
            "{} Deactivated {} {}",
            style("✓").green(),
            kind.label(),
            style(&id).cyan()
        );
    }
    Ok(())
}

fn run_restore(
    repo: &mut dyn RecordRepository,
    kind: LookupKind,
    args: ShowArgs,
    global: &GlobalOpts,
) -> Result<()> {
    // Inactive rows are not in the active list, so only exact ids work here
    let patch = LookupPatch {
        is_active: Some(true),
        ..Default::default()
    };
    let restored = repo.update_lookup(kind, args.id.trim(), &patch)?;
    if !global.quiet {
        println!(
            "{} Restored {} {}",
            style("✓").green(),
            kind.label(),
            style(&restored.id).cyan()
        );
    }
    Ok(())
}

// Helper functions

/// Id, code/email or unique label among active rows; falls back to an
/// exact id lookup so inactive rows can still be shown
fn resolve_id(repo: &dyn RecordRepository, kind: LookupKind, input: &str) -> Result<String> {
    let active = repo.list_active(kind)?;
    if let Some(id) = resolve_in(&active, input) {
        return Ok(id);
    }
    let input = input.trim();
    if repo.fetch_lookup(kind, input)?.is_some() {
        return Ok(input.to_string());
    }
    Err(miette::miette!("No {} found matching '{}'", kind.label(), input))
}

fn build_new(kind: LookupKind, args: NewArgs) -> Result<NewLookup> {
    let secondary = secondary_arg(kind, args.code, args.email)?;
    if kind.secondary_required() && secondary.is_none() {
        return Err(miette::miette!("A {} requires --code", kind.label()));
    }
    if args.description.is_some() && !kind.has_description() {
        return Err(miette::miette!("A {} has no description", kind.label()));
    }
    Ok(NewLookup {
        label: args.label,
        secondary,
        description: args.description,
    })
}

fn build_patch(kind: LookupKind, args: &EditArgs) -> Result<LookupPatch> {
    let mut patch = LookupPatch {
        label: args.name.clone(),
        ..Default::default()
    };

    if args.clear_email {
        if kind != LookupKind::Employee {
            return Err(miette::miette!("A {} has no email", kind.label()));
        }
        patch.secondary = Some(None);
    } else if let Some(value) = secondary_arg(kind, args.code.clone(), args.email.clone())? {
        patch.secondary = Some(Some(value));
    }

    if let Some(ref description) = args.description {
        if !kind.has_description() {
            return Err(miette::miette!("A {} has no description", kind.label()));
        }
        patch.description = Some(Some(description.clone()));
    }
    Ok(patch)
}

/// Map `--code`/`--email` to the kind's secondary column
fn secondary_arg(
    kind: LookupKind,
    code: Option<String>,
    email: Option<String>,
) -> Result<Option<String>> {
    match (kind.secondary_column(), code, email) {
        (_, None, None) => Ok(None),
        (Some("code"), Some(code), None) => Ok(Some(code)),
        (Some("email"), None, Some(email)) => Ok(Some(email)),
        (Some("code"), _, Some(_)) => Err(miette::miette!("A {} has no email", kind.label())),
        (Some("email"), Some(_), _) => Err(miette::miette!("A {} has no code", kind.label())),
        _ => Err(miette::miette!(
            "A {} has neither code nor email",
            kind.label()
        )),
    }
}

fn matches_search(record: &LookupRecord, needle: &str) -> bool {
    [
        Some(record.label.as_str()),
        record.secondary.as_deref(),
        record.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Serialize a row through its kind's typed view so field names match the
/// stored columns
fn typed_value(record: LookupRecord) -> Result<serde_json::Value> {
    fn to_value<E: LookupEntity>(record: LookupRecord) -> Result<serde_json::Value> {
        serde_json::to_value(E::from_record(record)).into_diagnostic()
    }

    match record.kind {
        LookupKind::Employee => to_value::<Employee>(record),
        LookupKind::Workcenter => to_value::<Workcenter>(record),
        LookupKind::PartNumber => to_value::<PartNumber>(record),
        LookupKind::Customer => to_value::<Customer>(record),
        LookupKind::InspectionItem => to_value::<InspectionItem>(record),
    }
}

fn list_columns(kind: LookupKind) -> Vec<ColumnDef> {
    let mut columns = vec![ColumnDef::new("id", "ID", 20)];
    columns.push(match kind {
        LookupKind::PartNumber => ColumnDef::new("label", "PART NUMBER", 24),
        _ => ColumnDef::new("label", "NAME", 30),
    });
    match kind.secondary_column() {
        Some("email") => columns.push(ColumnDef::new("secondary", "EMAIL", 32)),
        Some(_) => columns.push(ColumnDef::new("secondary", "CODE", 14)),
        None => {}
    }
    if kind.has_description() {
        columns.push(ColumnDef::new("description", "DESCRIPTION", 40));
    }
    columns.push(ColumnDef::new("updated", "UPDATED", 20));
    columns
}

fn table_row(kind: LookupKind, record: &LookupRecord) -> TableRow {
    let mut row = TableRow::new(&record.id)
        .cell("id", CellValue::Id(record.id.clone()))
        .cell("label", CellValue::Text(record.label.clone()));
    if kind.secondary_column().is_some() {
        row = row.cell("secondary", CellValue::opt_text(record.secondary.as_deref()));
    }
    if kind.has_description() {
        row = row.cell(
            "description",
            CellValue::opt_text(record.description.as_deref()),
        );
    }
    row.cell("updated", CellValue::DateTime(record.updated_at))
}
