//! Hosted backend: PostgREST-style REST service
//!
//! Booleans travel natively. Enrichment is requested declaratively through
//! resource embedding, so one GET returns the same shape the embedded
//! backend builds from its joins.

mod query;
mod transport;

pub use query::DMT_EMBED_SELECT;
pub use transport::{HttpTransport, Method, RestRequest, RestResponse, Transport};

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::entities::{
    AuditAction, AuditEntry, DmtPatch, DmtRecord, EnrichedDmtRecord, LookupKind, LookupPatch,
    LookupRecord, NewDmtRecord, NewLookup,
};
use crate::store::error::{RepoError, Result};
use crate::store::schema::TABLES;
use crate::store::value::{
    assignments_to_json, dmt_insert_assignments, dmt_patch_assignments,
    lookup_insert_assignments, lookup_patch_assignments, Assignment, FieldValue,
};
use crate::store::RecordRepository;

use query::{decode_lookups, decode_rows, error_for_status, AUDIT_TABLE, DMT_TABLE};

pub struct HostedRepository<T: Transport> {
    transport: T,
}

impl<T: Transport> HostedRepository<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send and return the body of a 2xx response
    fn call(&self, request: &RestRequest) -> Result<String> {
        let response = self.transport.send(request)?;
        if (200..300).contains(&response.status) {
            Ok(response.body)
        } else {
            debug!(status = response.status, table = %request.table, "hosted request failed");
            Err(error_for_status(response.status, &response.body))
        }
    }

    /// Patch body: the assignments plus a fresh `updated_at`
    fn patch_body(assignments: &[Assignment]) -> Value {
        let mut body = assignments_to_json(assignments);
        if let Value::Object(ref mut map) = body {
            map.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }
        body
    }

    /// Append an audit entry. The audited row is already committed by the
    /// time this runs, so a failed audit write is logged and not returned.
    fn audit(&self, table: &str, id: &str, action: AuditAction, changes: Option<Value>) {
        let body = json!({
            "entity_type": table,
            "entity_id": id,
            "action": action.as_str(),
            "changes": changes,
        });
        if let Err(e) = self.call(&RestRequest::post(AUDIT_TABLE, body)) {
            warn!(table, id, action = action.as_str(), error = %e, "audit write failed");
        }
    }

    fn first_lookup(kind: LookupKind, body: &str) -> Result<Option<LookupRecord>> {
        Ok(decode_lookups(kind, body)?.into_iter().next())
    }

    fn first_dmt(body: &str) -> Result<Option<DmtRecord>> {
        Ok(decode_rows::<DmtRecord>(DMT_TABLE, body)?.into_iter().next())
    }

    fn soft_delete(&mut self, table: &str, id: &str) -> Result<()> {
        let body = Self::patch_body(&[("is_active", FieldValue::Bool(false))]);
        let request = RestRequest::patch(table, body).param("id", query::eq(id));
        let rows: Vec<Value> = decode_rows(table, &self.call(&request)?)?;
        if rows.is_empty() {
            debug!(table, id, "soft delete matched no row");
            return Ok(());
        }
        self.audit(table, id, AuditAction::Delete, None);
        Ok(())
    }
}

impl<T: Transport> RecordRepository for HostedRepository<T> {
    fn backend_name(&self) -> &'static str {
        "hosted"
    }

    fn ensure_schema(&mut self) -> Result<()> {
        for table in TABLES {
            self.call(&query::probe(table)).map_err(|e| {
                RepoError::unavailable(format!(
                    "table {table} is not reachable ({e}); apply the DDL from `qms schema --hosted`"
                ))
            })?;
        }
        info!("hosted schema reachable");
        Ok(())
    }

    fn list_active(&self, kind: LookupKind) -> Result<Vec<LookupRecord>> {
        decode_lookups(kind, &self.call(&query::list_lookup(kind))?)
    }

    fn fetch_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<LookupRecord>> {
        Self::first_lookup(kind, &self.call(&query::fetch_by_id(kind.table(), id))?)
    }

    fn create_lookup(&mut self, kind: LookupKind, new: &NewLookup) -> Result<LookupRecord> {
        let assignments = lookup_insert_assignments(kind, new);
        let changes = assignments_to_json(&assignments);
        let body = self.call(&RestRequest::post(kind.table(), changes.clone()))?;
        let created = Self::first_lookup(kind, &body)?
            .ok_or_else(|| RepoError::decode(kind.table(), "insert returned no row"))?;
        self.audit(kind.table(), &created.id, AuditAction::Create, Some(changes));
        Ok(created)
    }

    fn update_lookup(
        &mut self,
        kind: LookupKind,
        id: &str,
        patch: &LookupPatch,
    ) -> Result<LookupRecord> {
        let assignments = lookup_patch_assignments(kind, patch);
        let request =
            RestRequest::patch(kind.table(), Self::patch_body(&assignments)).param("id", query::eq(id));
        let updated = Self::first_lookup(kind, &self.call(&request)?)?
            .ok_or_else(|| RepoError::not_found(kind.table(), id))?;
        self.audit(
            kind.table(),
            id,
            AuditAction::Update,
            Some(assignments_to_json(&assignments)),
        );
        Ok(updated)
    }

    fn soft_delete_lookup(&mut self, kind: LookupKind, id: &str) -> Result<()> {
        self.soft_delete(kind.table(), id)
    }

    fn list_active_dmt(&self) -> Result<Vec<EnrichedDmtRecord>> {
        decode_rows(DMT_TABLE, &self.call(&query::list_dmt())?)
    }

    fn get_dmt(&self, id: &str) -> Result<Option<EnrichedDmtRecord>> {
        let rows: Vec<EnrichedDmtRecord> = decode_rows(DMT_TABLE, &self.call(&query::get_dmt(id))?)?;
        Ok(rows.into_iter().next())
    }

    fn fetch_dmt(&self, id: &str) -> Result<Option<DmtRecord>> {
        Self::first_dmt(&self.call(&query::fetch_by_id(DMT_TABLE, id))?)
    }

    fn create_dmt(&mut self, new: &NewDmtRecord) -> Result<DmtRecord> {
        let changes = assignments_to_json(&dmt_insert_assignments(new));
        let body = self.call(&RestRequest::post(DMT_TABLE, changes.clone()))?;
        let created = Self::first_dmt(&body)?
            .ok_or_else(|| RepoError::decode(DMT_TABLE, "insert returned no row"))?;
        self.audit(DMT_TABLE, &created.id, AuditAction::Create, Some(changes));
        Ok(created)
    }

    fn update_dmt(&mut self, id: &str, patch: &DmtPatch) -> Result<DmtRecord> {
        let assignments = dmt_patch_assignments(patch);
        let request =
            RestRequest::patch(DMT_TABLE, Self::patch_body(&assignments)).param("id", query::eq(id));
        let updated = Self::first_dmt(&self.call(&request)?)?
            .ok_or_else(|| RepoError::not_found(DMT_TABLE, id))?;
        self.audit(
            DMT_TABLE,
            id,
            AuditAction::Update,
            Some(assignments_to_json(&assignments)),
        );
        Ok(updated)
    }

    fn soft_delete_dmt(&mut self, id: &str) -> Result<()> {
        self.soft_delete(DMT_TABLE, id)
    }

    fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        decode_rows(AUDIT_TABLE, &self.call(&query::recent_audit(limit))?)
    }
}
