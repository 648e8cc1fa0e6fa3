//! Column assignments shared by both backends
//!
//! Creates and patches are flattened into `(column, FieldValue)` pairs once,
//! then each adapter binds them its own way: SQLite parameters for the
//! embedded engine, JSON bodies for the hosted service.

use chrono::NaiveDate;
use rusqlite::types::{Null, ToSqlOutput};
use rusqlite::ToSql;
use serde_json::{Map, Value};

use crate::entities::{DmtPatch, LookupKind, LookupPatch, NewDmtRecord, NewLookup};
use crate::store::coercion::bool_to_stored;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(i64),
    Bool(bool),
    Date(Option<NaiveDate>),
}

pub type Assignment = (&'static str, FieldValue);

impl FieldValue {
    /// Native JSON form used by the hosted backend (booleans stay booleans)
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(Some(s)) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Date(Some(d)) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Text(None) | FieldValue::Date(None) => Value::Null,
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Text(Some(s)) => ToSqlOutput::from(s.as_str()),
            FieldValue::Integer(i) => ToSqlOutput::from(*i),
            FieldValue::Bool(b) => ToSqlOutput::from(bool_to_stored(*b)),
            FieldValue::Date(Some(d)) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
            FieldValue::Text(None) | FieldValue::Date(None) => ToSqlOutput::from(Null),
        })
    }
}

/// Render assignments as a JSON object (request bodies and audit payloads)
pub fn assignments_to_json(assignments: &[Assignment]) -> Value {
    let map: Map<String, Value> = assignments
        .iter()
        .map(|(col, val)| (col.to_string(), val.to_json()))
        .collect();
    Value::Object(map)
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(Some(value.to_string()))
}

/// Columns written when creating a lookup row. Fields the kind does not have
/// are dropped; unset optional fields are left to the column default.
pub fn lookup_insert_assignments(kind: LookupKind, new: &NewLookup) -> Vec<Assignment> {
    let mut out = vec![(kind.label_column(), text(&new.label))];

    match (kind.secondary_column(), &new.secondary) {
        (Some(col), Some(value)) => out.push((col, text(value))),
        (None, Some(value)) => {
            tracing::warn!(kind = %kind, value = %value, "ignoring secondary field on kind without one");
        }
        _ => {}
    }

    if let Some(ref description) = new.description {
        if kind.has_description() {
            out.push(("description", text(description)));
        }
    }

    out
}

/// Columns written by a lookup patch (without `updated_at`)
pub fn lookup_patch_assignments(kind: LookupKind, patch: &LookupPatch) -> Vec<Assignment> {
    let mut out = Vec::new();

    if let Some(ref label) = patch.label {
        out.push((kind.label_column(), text(label)));
    }
    if let (Some(col), Some(value)) = (kind.secondary_column(), &patch.secondary) {
        out.push((col, FieldValue::Text(value.clone())));
    }
    if let Some(ref description) = patch.description {
        if kind.has_description() {
            out.push(("description", FieldValue::Text(description.clone())));
        }
    }
    if let Some(active) = patch.is_active {
        out.push(("is_active", FieldValue::Bool(active)));
    }

    out
}

macro_rules! push_some {
    ($out:ident, $src:expr, $col:ident, Text) => {
        if let Some(ref v) = $src.$col {
            $out.push((stringify!($col), FieldValue::Text(Some(v.clone()))));
        }
    };
    ($out:ident, $src:expr, $col:ident, OptText) => {
        if let Some(ref v) = $src.$col {
            $out.push((stringify!($col), FieldValue::Text(v.clone())));
        }
    };
    ($out:ident, $src:expr, $col:ident, Date) => {
        if let Some(v) = $src.$col {
            $out.push((stringify!($col), FieldValue::Date(Some(v))));
        }
    };
    ($out:ident, $src:expr, $col:ident, OptDate) => {
        if let Some(v) = $src.$col {
            $out.push((stringify!($col), FieldValue::Date(v)));
        }
    };
    ($out:ident, $src:expr, $col:ident, Integer) => {
        if let Some(v) = $src.$col {
            $out.push((stringify!($col), FieldValue::Integer(v)));
        }
    };
    ($out:ident, $src:expr, $col:ident, Bool) => {
        if let Some(v) = $src.$col {
            $out.push((stringify!($col), FieldValue::Bool(v)));
        }
    };
}

/// Columns written when creating a DMT record: `id` and
/// `defect_description` always, everything else only when set.
pub fn dmt_insert_assignments(new: &NewDmtRecord) -> Vec<Assignment> {
    let mut out = vec![
        ("id", text(&new.id)),
        ("defect_description", text(&new.defect_description)),
    ];

    push_some!(out, new, workcenter_id, Text);
    push_some!(out, new, part_number_id, Text);
    push_some!(out, new, operation, Text);
    push_some!(out, new, employee_id, Text);
    push_some!(out, new, qty, Integer);
    push_some!(out, new, customer_id, Text);
    push_some!(out, new, shop_order, Text);
    push_some!(out, new, serial_number, Text);
    push_some!(out, new, inspection_item_id, Text);
    push_some!(out, new, date, Date);
    push_some!(out, new, prepared_by_id, Text);
    if let Some(car_type) = new.car_type {
        out.push(("car_type", text(car_type.as_str())));
    }
    push_some!(out, new, car_cycle, Integer);
    push_some!(out, new, car_second_cycle_date, Date);
    push_some!(out, new, disposition_approved_date, Date);
    push_some!(out, new, disposition_approved_by_id, Text);
    push_some!(out, new, sdr_number, Text);
    push_some!(out, new, sdr_approve_date, Date);
    push_some!(out, new, dmt_closed, Bool);
    push_some!(out, new, car_closed_date, Date);
    push_some!(out, new, is_return, Bool);
    push_some!(out, new, is_active, Bool);

    out
}

/// Columns written by a DMT patch (without `updated_at`)
pub fn dmt_patch_assignments(patch: &DmtPatch) -> Vec<Assignment> {
    let mut out = Vec::new();

    push_some!(out, patch, workcenter_id, OptText);
    push_some!(out, patch, part_number_id, OptText);
    push_some!(out, patch, operation, Text);
    push_some!(out, patch, employee_id, OptText);
    push_some!(out, patch, qty, Integer);
    push_some!(out, patch, customer_id, OptText);
    push_some!(out, patch, shop_order, Text);
    push_some!(out, patch, serial_number, Text);
    push_some!(out, patch, inspection_item_id, OptText);
    push_some!(out, patch, date, OptDate);
    push_some!(out, patch, prepared_by_id, OptText);
    push_some!(out, patch, defect_description, Text);
    if let Some(car_type) = patch.car_type {
        out.push(("car_type", text(car_type.as_str())));
    }
    push_some!(out, patch, car_cycle, Integer);
    push_some!(out, patch, car_second_cycle_date, OptDate);
    push_some!(out, patch, disposition_approved_date, OptDate);
    push_some!(out, patch, disposition_approved_by_id, OptText);
    push_some!(out, patch, sdr_number, Text);
    push_some!(out, patch, sdr_approve_date, OptDate);
    push_some!(out, patch, dmt_closed, Bool);
    push_some!(out, patch, car_closed_date, OptDate);
    push_some!(out, patch, is_return, Bool);
    push_some!(out, patch, is_active, Bool);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CarType;

    fn columns(assignments: &[Assignment]) -> Vec<&'static str> {
        assignments.iter().map(|(c, _)| *c).collect()
    }

    #[test]
    fn test_minimal_dmt_insert_only_has_required_columns() {
        let new = NewDmtRecord::new("DMT-1-AAAAA", "Crack");
        assert_eq!(
            columns(&dmt_insert_assignments(&new)),
            vec!["id", "defect_description"]
        );
    }

    #[test]
    fn test_dmt_insert_includes_set_fields() {
        let mut new = NewDmtRecord::new("DMT-1-AAAAA", "Crack");
        new.qty = Some(4);
        new.car_type = Some(CarType::Ndmt);
        new.is_return = Some(true);

        let assignments = dmt_insert_assignments(&new);
        assert!(assignments.contains(&("qty", FieldValue::Integer(4))));
        assert!(assignments.contains(&("car_type", FieldValue::Text(Some("ndmt".into())))));
        assert!(assignments.contains(&("is_return", FieldValue::Bool(true))));
    }

    #[test]
    fn test_dmt_patch_can_clear_foreign_key() {
        let patch = DmtPatch {
            employee_id: Some(None),
            ..Default::default()
        };
        assert_eq!(
            dmt_patch_assignments(&patch),
            vec![("employee_id", FieldValue::Text(None))]
        );
    }

    #[test]
    fn test_lookup_insert_drops_fields_kind_lacks() {
        let new = NewLookup {
            label: "Torque check".into(),
            secondary: Some("X".into()),
            description: Some("desc".into()),
        };
        let assignments = lookup_insert_assignments(LookupKind::InspectionItem, &new);
        assert_eq!(columns(&assignments), vec!["name", "description"]);

        let assignments = lookup_insert_assignments(LookupKind::Workcenter, &new);
        assert_eq!(columns(&assignments), vec!["name", "code"]);
    }

    #[test]
    fn test_lookup_patch_uses_kind_columns() {
        let patch = LookupPatch {
            label: Some("PN-2".into()),
            is_active: Some(false),
            ..Default::default()
        };
        let assignments = lookup_patch_assignments(LookupKind::PartNumber, &patch);
        assert_eq!(columns(&assignments), vec!["part_number", "is_active"]);
    }

    #[test]
    fn test_json_keeps_native_booleans() {
        let json = assignments_to_json(&[
            ("dmt_closed", FieldValue::Bool(true)),
            ("date", FieldValue::Date(None)),
            ("qty", FieldValue::Integer(2)),
        ]);
        assert_eq!(json["dmt_closed"], Value::Bool(true));
        assert!(json["date"].is_null());
        assert_eq!(json["qty"], 2);
    }
}
