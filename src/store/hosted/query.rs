//! PostgREST request shapes and row decoding

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::entities::{LookupKind, LookupRecord};
use crate::store::error::{RepoError, Result};

use super::transport::RestRequest;

pub const DMT_TABLE: &str = "dmt_records";
pub const AUDIT_TABLE: &str = "audit_log";

/// Resource-embedding select for enriched DMT records. The three employee
/// references are disambiguated by foreign key constraint name.
pub const DMT_EMBED_SELECT: &str = concat!(
    "*,",
    "workcenter:workcenters(name),",
    "part_number:part_numbers(part_number),",
    "employee:employees!dmt_records_employee_id_fkey(name),",
    "customer:customers(name),",
    "inspection_item:inspection_items(name),",
    "prepared_by:employees!dmt_records_prepared_by_id_fkey(name),",
    "disposition_approved_by:employees!dmt_records_disposition_approved_by_id_fkey(name)"
);

pub fn eq(value: &str) -> String {
    format!("eq.{value}")
}

pub fn list_lookup(kind: LookupKind) -> RestRequest {
    RestRequest::get(kind.table())
        .param("select", "*")
        .param("is_active", "eq.true")
        .param("order", format!("{}.asc", kind.label_column()))
}

pub fn fetch_by_id(table: &str, id: &str) -> RestRequest {
    RestRequest::get(table)
        .param("select", "*")
        .param("id", eq(id))
}

pub fn list_dmt() -> RestRequest {
    RestRequest::get(DMT_TABLE)
        .param("select", DMT_EMBED_SELECT)
        .param("is_active", "eq.true")
        .param("order", "created_at.desc")
}

pub fn get_dmt(id: &str) -> RestRequest {
    RestRequest::get(DMT_TABLE)
        .param("select", DMT_EMBED_SELECT)
        .param("id", eq(id))
        .param("is_active", "eq.true")
}

pub fn recent_audit(limit: usize) -> RestRequest {
    RestRequest::get(AUDIT_TABLE)
        .param("select", "*")
        .param("order", "id.desc")
        .param("limit", limit.to_string())
}

/// Cheapest possible read proving a table exists and is reachable
pub fn probe(table: &str) -> RestRequest {
    RestRequest::get(table).param("select", "*").param("limit", "0")
}

/// Lookup row as the service returns it; columns a kind lacks are absent
#[derive(Debug, Deserialize)]
struct HostedLookupRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    part_number: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl HostedLookupRow {
    fn into_record(self, kind: LookupKind) -> LookupRecord {
        let label = match kind {
            LookupKind::PartNumber => self.part_number,
            _ => self.name,
        };
        let secondary = match kind.secondary_column() {
            Some("email") => self.email,
            Some(_) => self.code,
            None => None,
        };
        LookupRecord {
            kind,
            id: self.id,
            label: label.unwrap_or_default(),
            secondary,
            description: if kind.has_description() {
                self.description
            } else {
                None
            },
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Decode a JSON array body into typed rows
pub fn decode_rows<T: DeserializeOwned>(table: &str, body: &str) -> Result<Vec<T>> {
    serde_json::from_str(body).map_err(|e| RepoError::decode(table, e))
}

pub fn decode_lookups(kind: LookupKind, body: &str) -> Result<Vec<LookupRecord>> {
    let rows: Vec<HostedLookupRow> = decode_rows(kind.table(), body)?;
    Ok(rows.into_iter().map(|r| r.into_record(kind)).collect())
}

/// PostgREST error payload
#[derive(Debug, Default, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Postgres SQLSTATEs for unique, foreign key, not-null and check violations
const CONSTRAINT_CODES: &[&str] = &["23505", "23503", "23502", "23514"];

/// Classify a non-2xx response
pub fn error_for_status(status: u16, body: &str) -> RepoError {
    let parsed: ServiceError = serde_json::from_str(body).unwrap_or_default();
    let mut message = parsed
        .message
        .clone()
        .unwrap_or_else(|| format!("HTTP {status}: {}", body.trim()));
    if let Some(details) = parsed.details.as_deref() {
        message = format!("{message} ({details})");
    }

    if status >= 500 {
        return RepoError::BackendUnavailable { message };
    }
    match parsed.code.as_deref() {
        Some(code) if CONSTRAINT_CODES.contains(&code) => RepoError::ConstraintViolation { message },
        _ if status == 409 => RepoError::ConstraintViolation { message },
        _ => RepoError::Query { message },
    }
}
