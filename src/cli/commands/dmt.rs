//! `qms dmt` command - DMT record management

use chrono::{Duration, NaiveDate, Utc};
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{
    open_repo, parse_bool, parse_date, print_structured, resolve_format, truncate_str,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{new_record_code, RecordCode, ReferenceData};
use crate::entities::{
    CarType, DmtPatch, DmtRecord, EnrichedDmtRecord, LookupKind, NewDmtRecord,
};
use crate::store::RecordRepository;

#[derive(Subcommand, Debug)]
pub enum DmtCommands {
    /// List active DMT records, newest first
    List(ListArgs),

    /// Create a new DMT record
    New(NewArgs),

    /// Show a DMT record with resolved names
    Show(ShowArgs),

    /// Change fields of a DMT record
    Edit(EditArgs),

    /// Mark a DMT record closed
    Close(CloseArgs),

    /// Deactivate a DMT record (soft delete)
    Delete(ShowArgs),

    /// Counts of active records
    Stats,
}

/// Status filter for list command
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StatusFilter {
    Open,
    Closed,
    #[default]
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by open/closed state
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Only records marked as returns
    #[arg(long)]
    pub returns: bool,

    /// Filter by CAR type (dmt, ndmt)
    #[arg(long)]
    pub car_type: Option<CarType>,

    /// Only records created in the last N days
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=36500))]
    pub days: Option<i64>,

    /// Search in id, description, shop order and serial number (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,

    /// Output format (csv exports every stored column)
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

/// Field flags shared by `new` and `edit`.
///
/// Lookup references accept an id, a code or email, or an exact name.
#[derive(clap::Args, Debug, Default)]
pub struct DmtFields {
    /// Defect description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Workcenter (id, code or name)
    #[arg(long, short = 'w')]
    pub workcenter: Option<String>,

    /// Part number (id or part number)
    #[arg(long, short = 'p')]
    pub part: Option<String>,

    /// Operation
    #[arg(long)]
    pub operation: Option<String>,

    /// Employee (id, email or name)
    #[arg(long, short = 'e')]
    pub employee: Option<String>,

    /// Quantity
    #[arg(long)]
    pub qty: Option<i64>,

    /// Customer (id, code or name)
    #[arg(long, short = 'c')]
    pub customer: Option<String>,

    /// Shop order
    #[arg(long)]
    pub shop_order: Option<String>,

    /// Serial number
    #[arg(long)]
    pub serial: Option<String>,

    /// Inspection item (id or name)
    #[arg(long, short = 'i')]
    pub inspection: Option<String>,

    /// Record date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Prepared by (employee id, email or name)
    #[arg(long)]
    pub prepared_by: Option<String>,

    /// CAR type (dmt, ndmt)
    #[arg(long)]
    pub car_type: Option<CarType>,

    /// CAR cycle number
    #[arg(long)]
    pub car_cycle: Option<i64>,

    /// CAR second cycle date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub second_cycle_date: Option<NaiveDate>,

    /// Disposition approved date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub disposition_date: Option<NaiveDate>,

    /// Disposition approved by (employee id, email or name)
    #[arg(long)]
    pub disposition_by: Option<String>,

    /// SDR number
    #[arg(long)]
    pub sdr_number: Option<String>,

    /// SDR approve date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub sdr_date: Option<NaiveDate>,

    /// DMT closed (yes/no)
    #[arg(long, value_parser = parse_bool)]
    pub closed: Option<bool>,

    /// CAR closed date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub closed_date: Option<NaiveDate>,

    /// Return (yes/no)
    #[arg(long = "return", value_parser = parse_bool)]
    pub is_return: Option<bool>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: DmtFields,

    /// Prompt for fields, choosing references from the active lists
    #[arg(long, short = 'I')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// DMT record id
    pub id: String,
}

/// Nullable fields `edit --clear` can reset
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ClearField {
    Workcenter,
    Part,
    Employee,
    Customer,
    Inspection,
    Date,
    PreparedBy,
    SecondCycleDate,
    DispositionDate,
    DispositionBy,
    SdrDate,
    ClosedDate,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// DMT record id
    pub id: String,

    #[command(flatten)]
    pub fields: DmtFields,

    /// Set a nullable field back to empty (repeatable)
    #[arg(long, value_delimiter = ',')]
    pub clear: Vec<ClearField>,
}

#[derive(clap::Args, Debug)]
pub struct CloseArgs {
    /// DMT record id
    pub id: String,

    /// CAR closed date (default: today)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

pub fn run(cmd: DmtCommands, global: &GlobalOpts) -> Result<()> {
    let mut repo = open_repo(global)?;
    match cmd {
        DmtCommands::List(args) => run_list(repo.as_ref(), args, global),
        DmtCommands::New(args) => run_new(repo.as_mut(), args, global),
        DmtCommands::Show(args) => run_show(repo.as_ref(), args, global),
        DmtCommands::Edit(args) => run_edit(repo.as_mut(), args, global),
        DmtCommands::Close(args) => run_close(repo.as_mut(), args, global),
        DmtCommands::Delete(args) => run_delete(repo.as_mut(), args, global),
        DmtCommands::Stats => run_stats(repo.as_ref()),
    }
}

fn run_list(repo: &dyn RecordRepository, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let records = repo.list_active_dmt()?;
    let records = filter_records(records, &args);

    if args.count {
        println!("{}", records.len());
        return Ok(());
    }

    let format = resolve_format(args.format, resolve_format(global.format, OutputFormat::Tsv));
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&records, format),
        OutputFormat::Csv => {
            let raw: Vec<&DmtRecord> = records.iter().map(|r| &r.record).collect();
            print!("{}", export_csv(&raw)?);
            Ok(())
        }
        _ => {
            if records.is_empty() && format == OutputFormat::Tsv {
                println!("No DMT records found.");
                return Ok(());
            }
            let rows: Vec<TableRow> = records.iter().map(table_row).collect();
            let formatter = TableFormatter::new(LIST_COLUMNS, "DMT record");
            if global.quiet {
                formatter.without_summary().output(&rows, format)
            } else {
                formatter.output(&rows, format)
            }
        }
    }
}

fn run_new(repo: &mut dyn RecordRepository, args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let refs = ReferenceData::load(repo)?;

    let new = if args.interactive {
        prompt_new(&refs, args.fields)?
    } else {
        build_new(&refs, args.fields)?
    };
    let created = repo.create_dmt(&new)?;

    if global.quiet {
        println!("{}", created.id);
        return Ok(());
    }
    println!(
        "{} Created DMT record {}",
        style("✓").green(),
        style(&created.id).cyan()
    );
    println!(
        "   {} | {}",
        style(created.car_type).yellow(),
        style(truncate_str(&created.defect_description, 60)).white()
    );
    Ok(())
}

fn run_show(repo: &dyn RecordRepository, args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let id = checked_id(&args.id);
    let record = repo
        .get_dmt(id)?
        .ok_or_else(|| miette::miette!("No active DMT record found matching '{}'", id))?;

    let format = resolve_format(global.format, OutputFormat::Yaml);
    match format {
        OutputFormat::Id => {
            println!("{}", record.id());
            Ok(())
        }
        _ => print_structured(&record, format),
    }
}

fn run_edit(repo: &mut dyn RecordRepository, args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let refs = ReferenceData::load(repo)?;
    let mut patch = build_patch(&refs, args.fields)?;
    apply_clears(&mut patch, &args.clear);

    if patch == DmtPatch::default() {
        return Err(miette::miette!(
            "Nothing to change. Pass at least one field flag (see --help)"
        ));
    }

    let updated = repo.update_dmt(checked_id(&args.id), &patch)?;
    if !global.quiet {
        println!(
            "{} Updated DMT record {}",
            style("✓").green(),
            style(&updated.id).cyan()
        );
    }
    Ok(())
}

fn run_close(repo: &mut dyn RecordRepository, args: CloseArgs, global: &GlobalOpts) -> Result<()> {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let patch = DmtPatch {
        dmt_closed: Some(true),
        car_closed_date: Some(Some(date)),
        ..Default::default()
    };
    let updated = repo.update_dmt(checked_id(&args.id), &patch)?;
    if !global.quiet {
        println!(
            "{} Closed DMT record {} on {}",
            style("✓").green(),
            style(&updated.id).cyan(),
            style(date).yellow()
        );
    }
    Ok(())
}

fn run_delete(repo: &mut dyn RecordRepository, args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let id = checked_id(&args.id);
    if repo.fetch_dmt(id)?.is_none() {
        return Err(miette::miette!("No DMT record found matching '{}'", id));
    }
    repo.soft_delete_dmt(id)?;
    if !global.quiet {
        println!(
            "{} Deactivated DMT record {}",
            style("✓").green(),
            style(id).cyan()
        );
    }
    Ok(())
}

fn run_stats(repo: &dyn RecordRepository) -> Result<()> {
    let records = repo.list_active_dmt()?;
    let stats = DmtStats::from_records(&records);

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Count"]);
    for (label, count) in stats.rows() {
        builder.push_record([label.to_string(), count.to_string()]);
    }
    println!("{}", builder.build().with(Style::markdown()));

    println!();
    let mut builder = Builder::default();
    builder.push_record(["Reference list", "Active"]);
    for kind in LookupKind::all() {
        let count = repo.list_active(*kind)?.len();
        builder.push_record([kind.table().to_string(), count.to_string()]);
    }
    println!("{}", builder.build().with(Style::markdown()));
    Ok(())
}

/// Counts over active DMT records
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DmtStats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub returns: usize,
    pub dmt: usize,
    pub ndmt: usize,
}

impl DmtStats {
    pub fn from_records(records: &[EnrichedDmtRecord]) -> Self {
        records.iter().fold(DmtStats::default(), |mut acc, r| {
            acc.total += 1;
            if r.record.dmt_closed {
                acc.closed += 1;
            } else {
                acc.open += 1;
            }
            if r.record.is_return {
                acc.returns += 1;
            }
            match r.record.car_type {
                CarType::Dmt => acc.dmt += 1,
                CarType::Ndmt => acc.ndmt += 1,
            }
            acc
        })
    }

    fn rows(&self) -> [(&'static str, usize); 6] {
        [
            ("Total", self.total),
            ("Open", self.open),
            ("Closed", self.closed),
            ("Returns", self.returns),
            ("CAR type dmt", self.dmt),
            ("CAR type ndmt", self.ndmt),
        ]
    }
}

// Helper functions

/// Trimmed id; hand-typed ids that are not record codes still pass through
fn checked_id(input: &str) -> &str {
    let id = input.trim();
    if let Err(e) = RecordCode::parse(id) {
        tracing::warn!(id, "{}", e);
    }
    id
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 20),
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("status", "STATUS", 8),
    ColumnDef::new("car", "CAR", 6),
    ColumnDef::new("workcenter", "WORKCENTER", 16),
    ColumnDef::new("part", "PART", 16),
    ColumnDef::new("employee", "EMPLOYEE", 18),
    ColumnDef::new("qty", "QTY", 6),
    ColumnDef::new("description", "DESCRIPTION", 40),
];

fn table_row(r: &EnrichedDmtRecord) -> TableRow {
    TableRow::new(r.id())
        .cell("id", CellValue::Id(r.id().to_string()))
        .cell("date", CellValue::Date(r.record.date))
        .cell("status", CellValue::Closed(r.record.dmt_closed))
        .cell("car", CellValue::Text(r.record.car_type.to_string()))
        .cell(
            "workcenter",
            CellValue::opt_text(r.workcenter.as_ref().map(|n| n.name.as_str())),
        )
        .cell(
            "part",
            CellValue::opt_text(r.part_number.as_ref().map(|p| p.part_number.as_str())),
        )
        .cell(
            "employee",
            CellValue::opt_text(r.employee.as_ref().map(|n| n.name.as_str())),
        )
        .cell("qty", CellValue::Number(r.record.qty))
        .cell(
            "description",
            CellValue::Text(r.record.defect_description.clone()),
        )
}

fn filter_records(records: Vec<EnrichedDmtRecord>, args: &ListArgs) -> Vec<EnrichedDmtRecord> {
    // A window reaching past the representable range keeps everything
    let since = args
        .days
        .and_then(Duration::try_days)
        .and_then(|d| Utc::now().checked_sub_signed(d));
    let needle = args.search.as_ref().map(|s| s.to_lowercase());

    let mut records: Vec<EnrichedDmtRecord> = records
        .into_iter()
        .filter(|r| match args.status {
            StatusFilter::Open => !r.record.dmt_closed,
            StatusFilter::Closed => r.record.dmt_closed,
            StatusFilter::All => true,
        })
        .filter(|r| !args.returns || r.record.is_return)
        .filter(|r| args.car_type.map_or(true, |t| r.record.car_type == t))
        .filter(|r| since.map_or(true, |s| r.record.created_at >= s))
        .filter(|r| needle.as_deref().map_or(true, |n| matches_search(&r.record, n)))
        .collect();

    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    records
}

fn matches_search(record: &DmtRecord, needle: &str) -> bool {
    [
        &record.id,
        &record.defect_description,
        &record.shop_order,
        &record.serial_number,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Every stored column, one row per record, header from the field names
fn export_csv(records: &[&DmtRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record).into_diagnostic()?;
    }
    let bytes = writer.into_inner().into_diagnostic()?;
    String::from_utf8(bytes).into_diagnostic()
}

fn resolve_ref(refs: &ReferenceData, kind: LookupKind, input: &str) -> Result<String> {
    refs.resolve(kind, input).ok_or_else(|| {
        miette::miette!(
            "No active {} matches '{}' (use an id, code/email, or exact name)",
            kind.label(),
            input
        )
    })
}

fn resolve_opt(
    refs: &ReferenceData,
    kind: LookupKind,
    input: Option<&str>,
) -> Result<Option<String>> {
    input.map(|s| resolve_ref(refs, kind, s)).transpose()
}

fn build_new(refs: &ReferenceData, fields: DmtFields) -> Result<NewDmtRecord> {
    let description = fields
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| miette::miette!("--description is required (or use -I)"))?
        .to_string();

    Ok(NewDmtRecord {
        workcenter_id: resolve_opt(refs, LookupKind::Workcenter, fields.workcenter.as_deref())?,
        part_number_id: resolve_opt(refs, LookupKind::PartNumber, fields.part.as_deref())?,
        employee_id: resolve_opt(refs, LookupKind::Employee, fields.employee.as_deref())?,
        customer_id: resolve_opt(refs, LookupKind::Customer, fields.customer.as_deref())?,
        inspection_item_id: resolve_opt(
            refs,
            LookupKind::InspectionItem,
            fields.inspection.as_deref(),
        )?,
        prepared_by_id: resolve_opt(refs, LookupKind::Employee, fields.prepared_by.as_deref())?,
        disposition_approved_by_id: resolve_opt(
            refs,
            LookupKind::Employee,
            fields.disposition_by.as_deref(),
        )?,
        operation: fields.operation,
        qty: fields.qty,
        shop_order: fields.shop_order,
        serial_number: fields.serial,
        date: fields.date,
        car_type: fields.car_type,
        car_cycle: fields.car_cycle,
        car_second_cycle_date: fields.second_cycle_date,
        disposition_approved_date: fields.disposition_date,
        sdr_number: fields.sdr_number,
        sdr_approve_date: fields.sdr_date,
        dmt_closed: fields.closed,
        car_closed_date: fields.closed_date,
        is_return: fields.is_return,
        ..NewDmtRecord::new(new_record_code(), description)
    })
}

fn build_patch(refs: &ReferenceData, fields: DmtFields) -> Result<DmtPatch> {
    let link = |kind, input: Option<&str>| -> Result<Option<Option<String>>> {
        Ok(resolve_opt(refs, kind, input)?.map(Some))
    };

    Ok(DmtPatch {
        workcenter_id: link(LookupKind::Workcenter, fields.workcenter.as_deref())?,
        part_number_id: link(LookupKind::PartNumber, fields.part.as_deref())?,
        employee_id: link(LookupKind::Employee, fields.employee.as_deref())?,
        customer_id: link(LookupKind::Customer, fields.customer.as_deref())?,
        inspection_item_id: link(LookupKind::InspectionItem, fields.inspection.as_deref())?,
        prepared_by_id: link(LookupKind::Employee, fields.prepared_by.as_deref())?,
        disposition_approved_by_id: link(LookupKind::Employee, fields.disposition_by.as_deref())?,
        operation: fields.operation,
        qty: fields.qty,
        shop_order: fields.shop_order,
        serial_number: fields.serial,
        date: fields.date.map(Some),
        defect_description: fields.description,
        car_type: fields.car_type,
        car_cycle: fields.car_cycle,
        car_second_cycle_date: fields.second_cycle_date.map(Some),
        disposition_approved_date: fields.disposition_date.map(Some),
        sdr_number: fields.sdr_number,
        sdr_approve_date: fields.sdr_date.map(Some),
        dmt_closed: fields.closed,
        car_closed_date: fields.closed_date.map(Some),
        is_return: fields.is_return,
        is_active: None,
    })
}

fn apply_clears(patch: &mut DmtPatch, clears: &[ClearField]) {
    for field in clears {
        match field {
            ClearField::Workcenter => patch.workcenter_id = Some(None),
            ClearField::Part => patch.part_number_id = Some(None),
            ClearField::Employee => patch.employee_id = Some(None),
            ClearField::Customer => patch.customer_id = Some(None),
            ClearField::Inspection => patch.inspection_item_id = Some(None),
            ClearField::Date => patch.date = Some(None),
            ClearField::PreparedBy => patch.prepared_by_id = Some(None),
            ClearField::SecondCycleDate => patch.car_second_cycle_date = Some(None),
            ClearField::DispositionDate => patch.disposition_approved_date = Some(None),
            ClearField::DispositionBy => patch.disposition_approved_by_id = Some(None),
            ClearField::SdrDate => patch.sdr_approve_date = Some(None),
            ClearField::ClosedDate => patch.car_closed_date = Some(None),
        }
    }
}

/// Interactive form: flags already given are kept, the rest are prompted
fn prompt_new(refs: &ReferenceData, mut fields: DmtFields) -> Result<NewDmtRecord> {
    use dialoguer::{theme::ColorfulTheme, Input, Select};
    let theme = ColorfulTheme::default();

    if fields.description.is_none() {
        let description: String = Input::with_theme(&theme)
            .with_prompt("Defect description")
            .interact_text()
            .into_diagnostic()?;
        fields.description = Some(description);
    }

    let pick = |kind: LookupKind, prompt: &str| -> Result<Option<String>> {
        let entries = refs.entries(kind);
        if entries.is_empty() {
            return Ok(None);
        }
        let mut items = vec!["(none)".to_string()];
        items.extend(entries.iter().map(|(_, label, secondary)| match secondary {
            Some(s) => format!("{} ({})", label, s),
            None => label.to_string(),
        }));
        let selection = Select::with_theme(&theme)
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact()
            .into_diagnostic()?;
        Ok(selection
            .checked_sub(1)
            .and_then(|i| entries.get(i))
            .map(|(id, _, _)| id.to_string()))
    };

    if fields.workcenter.is_none() {
        fields.workcenter = pick(LookupKind::Workcenter, "Workcenter")?;
    }
    if fields.part.is_none() {
        fields.part = pick(LookupKind::PartNumber, "Part number")?;
    }
    if fields.employee.is_none() {
        fields.employee = pick(LookupKind::Employee, "Employee")?;
    }
    if fields.customer.is_none() {
        fields.customer = pick(LookupKind::Customer, "Customer")?;
    }
    if fields.inspection.is_none() {
        fields.inspection = pick(LookupKind::InspectionItem, "Inspection item")?;
    }
    if fields.prepared_by.is_none() {
        fields.prepared_by = pick(LookupKind::Employee, "Prepared by")?;
    }

    if fields.car_type.is_none() {
        let types = [CarType::Dmt, CarType::Ndmt];
        let labels: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        let idx = Select::with_theme(&theme)
            .with_prompt("CAR type")
            .items(&labels)
            .default(0)
            .interact()
            .into_diagnostic()?;
        fields.car_type = types.get(idx).copied();
    }

    if fields.qty.is_none() {
        let qty: i64 = Input::with_theme(&theme)
            .with_prompt("Quantity")
            .default(0)
            .interact_text()
            .into_diagnostic()?;
        fields.qty = Some(qty);
    }

    build_new(refs, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{JoinedNames, NewLookup};
    use crate::store::{EmbeddedRepository, MemorySlot};

    fn repo_with_refs() -> EmbeddedRepository<MemorySlot> {
        let mut repo = EmbeddedRepository::open(MemorySlot::new()).unwrap();
        repo.ensure_schema().unwrap();
        repo.create_lookup(
            LookupKind::Employee,
            &NewLookup::employee("Jane Doe", Some("jane@example.com".into())),
        )
        .unwrap();
        repo.create_lookup(LookupKind::Workcenter, &NewLookup::workcenter("Lathe", "WC-01"))
            .unwrap();
        repo
    }

    fn list_args() -> ListArgs {
        ListArgs {
            status: StatusFilter::All,
            returns: false,
            car_type: None,
            days: None,
            search: None,
            limit: None,
            count: false,
            format: OutputFormat::Auto,
        }
    }

    #[test]
    fn test_build_new_resolves_references() {
        let repo = repo_with_refs();
        let refs = ReferenceData::load(&repo).unwrap();
        let fields = DmtFields {
            description: Some("Burr on edge".into()),
            employee: Some("jane doe".into()),
            workcenter: Some("wc-01".into()),
            qty: Some(3),
            ..Default::default()
        };

        let new = build_new(&refs, fields).unwrap();
        assert!(new.id.starts_with("DMT-"));
        assert_eq!(new.defect_description, "Burr on edge");
        assert_eq!(new.employee_id, refs.resolve(LookupKind::Employee, "jane@example.com"));
        assert!(new.workcenter_id.is_some());
        assert_eq!(new.qty, Some(3));
    }

    #[test]
    fn test_build_new_requires_description() {
        let repo = repo_with_refs();
        let refs = ReferenceData::load(&repo).unwrap();
        let fields = DmtFields {
            description: Some("   ".into()),
            ..Default::default()
        };
        assert!(build_new(&refs, fields).is_err());
    }

    #[test]
    fn test_unknown_reference_is_error() {
        let repo = repo_with_refs();
        let refs = ReferenceData::load(&repo).unwrap();
        let fields = DmtFields {
            description: Some("x".into()),
            customer: Some("Globex".into()),
            ..Default::default()
        };
        let err = build_new(&refs, fields).unwrap_err();
        assert!(err.to_string().contains("customer"));
    }

    #[test]
    fn test_patch_with_clears() {
        let repo = repo_with_refs();
        let refs = ReferenceData::load(&repo).unwrap();
        let fields = DmtFields {
            closed: Some(true),
            ..Default::default()
        };
        let mut patch = build_patch(&refs, fields).unwrap();
        apply_clears(&mut patch, &[ClearField::Employee, ClearField::ClosedDate]);

        assert_eq!(patch.dmt_closed, Some(true));
        assert_eq!(patch.employee_id, Some(None));
        assert_eq!(patch.car_closed_date, Some(None));
        assert_eq!(patch.workcenter_id, None);
    }

    #[test]
    fn test_filters_and_stats() {
        let mut repo = repo_with_refs();
        let mut open = NewDmtRecord::new(new_record_code(), "Scratch on housing");
        open.shop_order = Some("SO-77".into());
        repo.create_dmt(&open).unwrap();

        let mut closed = NewDmtRecord::new(new_record_code(), "Wrong thread");
        closed.dmt_closed = Some(true);
        closed.is_return = Some(true);
        closed.car_type = Some(CarType::Ndmt);
        repo.create_dmt(&closed).unwrap();

        let all = repo.list_active_dmt().unwrap();
        let stats = DmtStats::from_records(&all);
        assert_eq!(
            stats,
            DmtStats {
                total: 2,
                open: 1,
                closed: 1,
                returns: 1,
                dmt: 1,
                ndmt: 1
            }
        );

        let mut args = list_args();
        args.status = StatusFilter::Open;
        let open_only = filter_records(all.clone(), &args);
        assert_eq!(open_only.len(), 1);
        assert_eq!(open_only[0].record.defect_description, "Scratch on housing");

        let mut args = list_args();
        args.search = Some("so-77".into());
        assert_eq!(filter_records(all.clone(), &args).len(), 1);

        let mut args = list_args();
        args.car_type = Some(CarType::Ndmt);
        args.returns = true;
        assert_eq!(filter_records(all, &args).len(), 1);
    }

    #[test]
    fn test_days_window_out_of_range_keeps_everything() {
        let mut repo = repo_with_refs();
        repo.create_dmt(&NewDmtRecord::new(new_record_code(), "Burr"))
            .unwrap();
        let all = repo.list_active_dmt().unwrap();

        let mut args = list_args();
        args.days = Some(i64::MAX / 2);
        assert_eq!(filter_records(all.clone(), &args).len(), 1);

        args.days = Some(i64::MAX);
        assert_eq!(filter_records(all.clone(), &args).len(), 1);

        args.days = Some(1);
        assert_eq!(filter_records(all, &args).len(), 1);
    }

    #[test]
    fn test_export_csv_has_all_columns() {
        let mut repo = repo_with_refs();
        let created = repo
            .create_dmt(&NewDmtRecord::new("DMT-1-ABCDE", "Burr, sharp"))
            .unwrap();
        let view = EnrichedDmtRecord::from_parts(created, JoinedNames::default());

        let out = export_csv(&[&view.record]).unwrap();
        let mut lines = out.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,workcenter_id,part_number_id,operation"));
        assert!(header.contains("car_type"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("DMT-1-ABCDE,"));
        assert!(row.contains("\"Burr, sharp\""));
        assert!(row.contains(",dmt,"));
    }
}
