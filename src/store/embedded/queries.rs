//! SQL text and row mapping for the embedded backend

use rusqlite::{Row, Statement};

use crate::entities::{AuditAction, AuditEntry, CarType, DmtRecord, JoinedNames, LookupKind, LookupRecord};
use crate::store::coercion::bool_from_stored;
use crate::store::error::RepoError;

/// Select list producing the column order [`map_lookup`] expects
pub fn lookup_select(kind: LookupKind) -> String {
    let secondary = kind.secondary_column().unwrap_or("NULL");
    let description = if kind.has_description() {
        "description"
    } else {
        "NULL"
    };
    format!(
        "SELECT id, {label}, {secondary}, {description}, is_active, created_at, updated_at FROM {table}",
        label = kind.label_column(),
        table = kind.table(),
    )
}

pub fn map_lookup(kind: LookupKind, row: &Row<'_>) -> rusqlite::Result<LookupRecord> {
    Ok(LookupRecord {
        kind,
        id: row.get(0)?,
        label: row.get(1)?,
        secondary: row.get(2)?,
        description: row.get(3)?,
        is_active: bool_from_stored(row.get(4)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Raw `dmt_records` columns, in [`map_dmt`] order
pub const DMT_COLUMNS: &[&str] = &[
    "id",
    "workcenter_id",
    "part_number_id",
    "operation",
    "employee_id",
    "qty",
    "customer_id",
    "shop_order",
    "serial_number",
    "inspection_item_id",
    "date",
    "prepared_by_id",
    "defect_description",
    "car_type",
    "car_cycle",
    "car_second_cycle_date",
    "disposition_approved_date",
    "disposition_approved_by_id",
    "sdr_number",
    "sdr_approve_date",
    "dmt_closed",
    "car_closed_date",
    "is_return",
    "is_active",
    "created_at",
    "updated_at",
];

pub fn dmt_select() -> String {
    format!("SELECT {} FROM dmt_records", DMT_COLUMNS.join(", "))
}

/// Fact row plus one name per foreign key. Employees are joined three times
/// under distinct aliases.
pub fn enriched_dmt_select() -> String {
    let columns: Vec<String> = DMT_COLUMNS.iter().map(|c| format!("d.{c}")).collect();
    format!(
        "SELECT {},
                w.name, p.part_number, e.name, c.name, i.name, pb.name, da.name
         FROM dmt_records d
         LEFT JOIN workcenters w ON d.workcenter_id = w.id
         LEFT JOIN part_numbers p ON d.part_number_id = p.id
         LEFT JOIN employees e ON d.employee_id = e.id
         LEFT JOIN customers c ON d.customer_id = c.id
         LEFT JOIN inspection_items i ON d.inspection_item_id = i.id
         LEFT JOIN employees pb ON d.prepared_by_id = pb.id
         LEFT JOIN employees da ON d.disposition_approved_by_id = da.id",
        columns.join(", ")
    )
}

fn car_type_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<CarType> {
    let raw: String = row.get(idx)?;
    raw.parse::<CarType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

pub fn map_dmt(row: &Row<'_>) -> rusqlite::Result<DmtRecord> {
    Ok(DmtRecord {
        id: row.get(0)?,
        workcenter_id: row.get(1)?,
        part_number_id: row.get(2)?,
        operation: row.get(3)?,
        employee_id: row.get(4)?,
        qty: row.get(5)?,
        customer_id: row.get(6)?,
        shop_order: row.get(7)?,
        serial_number: row.get(8)?,
        inspection_item_id: row.get(9)?,
        date: row.get(10)?,
        prepared_by_id: row.get(11)?,
        defect_description: row.get(12)?,
        car_type: car_type_at(row, 13)?,
        car_cycle: row.get(14)?,
        car_second_cycle_date: row.get(15)?,
        disposition_approved_date: row.get(16)?,
        disposition_approved_by_id: row.get(17)?,
        sdr_number: row.get(18)?,
        sdr_approve_date: row.get(19)?,
        dmt_closed: bool_from_stored(row.get(20)?),
        car_closed_date: row.get(21)?,
        is_return: bool_from_stored(row.get(22)?),
        is_active: bool_from_stored(row.get(23)?),
        created_at: row.get(24)?,
        updated_at: row.get(25)?,
    })
}

/// Aliased name columns that follow the raw columns in [`enriched_dmt_select`]
pub fn map_joined_names(row: &Row<'_>) -> rusqlite::Result<JoinedNames> {
    let base = DMT_COLUMNS.len();
    Ok(JoinedNames {
        workcenter: row.get(base)?,
        part_number: row.get(base + 1)?,
        employee: row.get(base + 2)?,
        customer: row.get(base + 3)?,
        inspection_item: row.get(base + 4)?,
        prepared_by: row.get(base + 5)?,
        disposition_approved_by: row.get(base + 6)?,
    })
}

pub const AUDIT_SELECT: &str =
    "SELECT id, entity_type, entity_id, action, changes, timestamp FROM audit_log";

pub fn map_audit(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    let action: String = row.get(3)?;
    let action = action.parse::<AuditAction>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;
    let changes: Option<String> = row.get(4)?;
    let changes = changes
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(AuditEntry {
        id: row.get(0)?,
        entity_type: row.get(1)?,
        entity_id: row.get(2)?,
        action,
        changes,
        timestamp: row.get(5)?,
    })
}

/// Collect every row of a prepared statement through `map`
pub fn collect_rows<T, P, F>(stmt: &mut Statement<'_>, params: P, map: F) -> rusqlite::Result<Vec<T>>
where
    P: rusqlite::Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    stmt.query_map(params, map)?.collect()
}

/// Row-mapping failures become `Decode`; everything else maps as usual
pub fn decode_error(table: &str, err: rusqlite::Error) -> RepoError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => RepoError::decode(table, err),
        other => other.into(),
    }
}
