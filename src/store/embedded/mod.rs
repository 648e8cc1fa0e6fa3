//! Embedded backend: in-memory SQLite persisted to a key-value slot
//!
//! The database lives entirely in memory. Every successful mutation exports
//! the native file image and writes it to the slot exactly once; reads never
//! touch the slot.

mod queries;
mod snapshot;

pub use snapshot::{FileSlot, KeyValueStore, MemorySlot, SNAPSHOT_KEY};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use crate::core::identity::new_opaque_id;
use crate::entities::{
    AuditAction, AuditEntry, DmtPatch, DmtRecord, EnrichedDmtRecord, LookupKind, LookupPatch,
    LookupRecord, NewDmtRecord, NewLookup,
};
use crate::store::error::{RepoError, Result};
use crate::store::schema::{EMBEDDED_DDL, SQLITE_NOW};
use crate::store::value::{
    assignments_to_json, dmt_insert_assignments, dmt_patch_assignments,
    lookup_insert_assignments, lookup_patch_assignments, Assignment, FieldValue,
};
use crate::store::RecordRepository;

use queries::{
    collect_rows, decode_error, dmt_select, enriched_dmt_select, lookup_select, map_audit,
    map_dmt, map_joined_names, map_lookup, AUDIT_SELECT,
};
use snapshot::{decode_image, encode_image, export_image, import_image};

const DMT_TABLE: &str = "dmt_records";

pub struct EmbeddedRepository<S: KeyValueStore> {
    conn: Connection,
    slot: S,
    key: String,
}

impl<S: KeyValueStore> EmbeddedRepository<S> {
    /// Open from the default slot key, restoring a stored snapshot if present
    pub fn open(slot: S) -> Result<Self> {
        Self::open_with_key(slot, SNAPSHOT_KEY)
    }

    pub fn open_with_key(slot: S, key: &str) -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(RepoError::unavailable)?;

        if let Some(text) = slot.get(key)? {
            let image = decode_image(&text)?;
            import_image(&mut conn, &image)?;
            debug!(bytes = image.len(), "restored embedded snapshot");
        }

        // Connection-level setting; has to follow the restore
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // Tables exist in memory right away; nothing is persisted until a write
        conn.execute_batch(EMBEDDED_DDL)?;

        Ok(Self {
            conn,
            slot,
            key: key.to_string(),
        })
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn into_slot(self) -> S {
        self.slot
    }

    fn persist(&mut self) -> Result<()> {
        let image = export_image(&self.conn)?;
        let text = encode_image(&image)?;
        self.slot.set(&self.key, text)?;
        debug!(bytes = image.len(), key = %self.key, "wrote embedded snapshot");
        Ok(())
    }

    fn insert(&self, table: &str, assignments: &[Assignment]) -> Result<()> {
        let columns: Vec<&str> = assignments.iter().map(|(col, _)| *col).collect();
        let placeholders: Vec<String> = (1..=assignments.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        debug!(sql = %sql, "insert");
        self.conn
            .execute(&sql, params_from_iter(assignments.iter().map(|(_, v)| v)))?;
        Ok(())
    }

    /// Apply assignments plus a fresh `updated_at`; returns rows changed
    fn update(&self, table: &str, id: &str, assignments: &[Assignment]) -> Result<usize> {
        let mut sets: Vec<String> = assignments
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{col} = ?{}", i + 1))
            .collect();
        sets.push(format!("updated_at = {SQLITE_NOW}"));
        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ?{}",
            sets.join(", "),
            assignments.len() + 1
        );
        debug!(sql = %sql, id = %id, "update");

        let mut values: Vec<FieldValue> = assignments.iter().map(|(_, v)| v.clone()).collect();
        values.push(FieldValue::Text(Some(id.to_string())));
        Ok(self.conn.execute(&sql, params_from_iter(values.iter()))?)
    }

    fn audit(
        &self,
        table: &str,
        id: &str,
        action: AuditAction,
        changes: Option<Value>,
    ) -> Result<()> {
        let changes = changes.map(|v| v.to_string());
        self.conn.execute(
            "INSERT INTO audit_log (entity_type, entity_id, action, changes) VALUES (?1, ?2, ?3, ?4)",
            params![table, id, action.as_str(), changes],
        )?;
        Ok(())
    }

    fn soft_delete(&mut self, table: &str, id: &str) -> Result<()> {
        let assignments = [("is_active", FieldValue::Bool(false))];
        if self.update(table, id, &assignments)? == 0 {
            debug!(table, id, "soft delete matched no row");
            return Ok(());
        }
        self.audit(table, id, AuditAction::Delete, None)?;
        self.persist()
    }
}

impl<S: KeyValueStore> RecordRepository for EmbeddedRepository<S> {
    fn backend_name(&self) -> &'static str {
        "embedded"
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(EMBEDDED_DDL)?;
        self.persist()?;
        info!("embedded schema ready");
        Ok(())
    }

    fn list_active(&self, kind: LookupKind) -> Result<Vec<LookupRecord>> {
        let sql = format!(
            "{} WHERE is_active = 1 ORDER BY {} COLLATE NOCASE ASC",
            lookup_select(kind),
            kind.label_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        collect_rows(&mut stmt, [], |row| map_lookup(kind, row))
            .map_err(|e| decode_error(kind.table(), e))
    }

    fn fetch_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<LookupRecord>> {
        let sql = format!("{} WHERE id = ?1", lookup_select(kind));
        self.conn
            .query_row(&sql, params![id], |row| map_lookup(kind, row))
            .optional()
            .map_err(|e| decode_error(kind.table(), e))
    }

    fn create_lookup(&mut self, kind: LookupKind, new: &NewLookup) -> Result<LookupRecord> {
        let id = new_opaque_id();
        let mut assignments = vec![("id", FieldValue::Text(Some(id.clone())))];
        assignments.extend(lookup_insert_assignments(kind, new));

        self.insert(kind.table(), &assignments)?;
        self.audit(
            kind.table(),
            &id,
            AuditAction::Create,
            Some(assignments_to_json(&assignments)),
        )?;
        self.persist()?;

        self.fetch_lookup(kind, &id)?
            .ok_or_else(|| RepoError::not_found(kind.table(), id))
    }

    fn update_lookup(
        &mut self,
        kind: LookupKind,
        id: &str,
        patch: &LookupPatch,
    ) -> Result<LookupRecord> {
        let assignments = lookup_patch_assignments(kind, patch);
        if self.update(kind.table(), id, &assignments)? == 0 {
            return Err(RepoError::not_found(kind.table(), id));
        }
        self.audit(
            kind.table(),
            id,
            AuditAction::Update,
            Some(assignments_to_json(&assignments)),
        )?;
        self.persist()?;

        self.fetch_lookup(kind, id)?
            .ok_or_else(|| RepoError::not_found(kind.table(), id))
    }

    fn soft_delete_lookup(&mut self, kind: LookupKind, id: &str) -> Result<()> {
        self.soft_delete(kind.table(), id)
    }

    fn list_active_dmt(&self) -> Result<Vec<EnrichedDmtRecord>> {
        let sql = format!(
            "{} WHERE d.is_active = 1 ORDER BY d.created_at DESC, d.rowid DESC",
            enriched_dmt_select()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        collect_rows(&mut stmt, [], |row| {
            Ok(EnrichedDmtRecord::from_parts(map_dmt(row)?, map_joined_names(row)?))
        })
        .map_err(|e| decode_error(DMT_TABLE, e))
    }

    fn get_dmt(&self, id: &str) -> Result<Option<EnrichedDmtRecord>> {
        let sql = format!(
            "{} WHERE d.id = ?1 AND d.is_active = 1",
            enriched_dmt_select()
        );
        self.conn
            .query_row(&sql, params![id], |row| {
                Ok(EnrichedDmtRecord::from_parts(map_dmt(row)?, map_joined_names(row)?))
            })
            .optional()
            .map_err(|e| decode_error(DMT_TABLE, e))
    }

    fn fetch_dmt(&self, id: &str) -> Result<Option<DmtRecord>> {
        let sql = format!("{} WHERE id = ?1", dmt_select());
        self.conn
            .query_row(&sql, params![id], map_dmt)
            .optional()
            .map_err(|e| decode_error(DMT_TABLE, e))
    }

    fn create_dmt(&mut self, new: &NewDmtRecord) -> Result<DmtRecord> {
        let assignments = dmt_insert_assignments(new);
        self.insert(DMT_TABLE, &assignments)?;
        self.audit(
            DMT_TABLE,
            &new.id,
            AuditAction::Create,
            Some(assignments_to_json(&assignments)),
        )?;
        self.persist()?;

        self.fetch_dmt(&new.id)?
            .ok_or_else(|| RepoError::not_found(DMT_TABLE, new.id.as_str()))
    }

    fn update_dmt(&mut self, id: &str, patch: &DmtPatch) -> Result<DmtRecord> {
        let assignments = dmt_patch_assignments(patch);
        if self.update(DMT_TABLE, id, &assignments)? == 0 {
            return Err(RepoError::not_found(DMT_TABLE, id));
        }
        self.audit(
            DMT_TABLE,
            id,
            AuditAction::Update,
            Some(assignments_to_json(&assignments)),
        )?;
        self.persist()?;

        self.fetch_dmt(id)?
            .ok_or_else(|| RepoError::not_found(DMT_TABLE, id))
    }

    fn soft_delete_dmt(&mut self, id: &str) -> Result<()> {
        self.soft_delete(DMT_TABLE, id)
    }

    fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let sql = format!("{AUDIT_SELECT} ORDER BY id DESC LIMIT ?1");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        collect_rows(&mut stmt, params![limit], map_audit)
            .map_err(|e| decode_error("audit_log", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CarType;
    use chrono::Utc;

    fn repo() -> EmbeddedRepository<MemorySlot> {
        let mut repo = EmbeddedRepository::open(MemorySlot::new()).unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    fn employee(repo: &mut EmbeddedRepository<MemorySlot>, name: &str) -> LookupRecord {
        repo.create_lookup(LookupKind::Employee, &NewLookup::employee(name, None))
            .unwrap()
    }

    #[test]
    fn test_create_then_list_contains_row_once() {
        let mut repo = repo();
        let created = repo
            .create_lookup(LookupKind::Workcenter, &NewLookup::workcenter("Lathe", "WC-01"))
            .unwrap();
        assert_eq!(created.id.len(), 32);
        assert!(created.is_active);
        assert_eq!(created.secondary.as_deref(), Some("WC-01"));

        let active = repo.list_active(LookupKind::Workcenter).unwrap();
        assert_eq!(active.iter().filter(|r| r.id == created.id).count(), 1);
    }

    #[test]
    fn test_lookup_list_ordered_by_label() {
        let mut repo = repo();
        for name in ["Zed", "Amy", "Mia"] {
            employee(&mut repo, name);
        }
        let names: Vec<String> = repo
            .list_active(LookupKind::Employee)
            .unwrap()
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(names, vec!["Amy", "Mia", "Zed"]);
    }

    #[test]
    fn test_lookup_list_order_ignores_case() {
        let mut repo = repo();
        for name in ["bob", "Carl", "alice"] {
            employee(&mut repo, name);
        }
        let names: Vec<String> = repo
            .list_active(LookupKind::Employee)
            .unwrap()
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "Carl"]);
    }

    #[test]
    fn test_part_number_description_defaults_empty() {
        let mut repo = repo();
        let part = repo
            .create_lookup(
                LookupKind::PartNumber,
                &NewLookup {
                    label: "PN-100".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(part.description.as_deref(), Some(""));
        assert_eq!(part.secondary, None);
    }

    #[test]
    fn test_soft_delete_hides_but_keeps_row() {
        let mut repo = repo();
        let jane = employee(&mut repo, "Jane Doe");

        repo.soft_delete_lookup(LookupKind::Employee, &jane.id).unwrap();
        assert!(repo.list_active(LookupKind::Employee).unwrap().is_empty());

        let fetched = repo
            .fetch_lookup(LookupKind::Employee, &jane.id)
            .unwrap()
            .unwrap();
        assert!(!fetched.is_active);

        // Idempotent, including unknown ids
        repo.soft_delete_lookup(LookupKind::Employee, &jane.id).unwrap();
        repo.soft_delete_lookup(LookupKind::Employee, "missing").unwrap();
    }

    #[test]
    fn test_duplicate_code_is_constraint_violation() {
        let mut repo = repo();
        let first = repo
            .create_lookup(LookupKind::Workcenter, &NewLookup::workcenter("Lathe", "WC-01"))
            .unwrap();
        let err = repo
            .create_lookup(LookupKind::Workcenter, &NewLookup::workcenter("Mill", "WC-01"))
            .unwrap_err();
        assert!(err.is_constraint_violation());

        let active = repo.list_active(LookupKind::Workcenter).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first.id);
    }

    #[test]
    fn test_uniqueness_survives_soft_delete() {
        let mut repo = repo();
        let first = repo
            .create_lookup(LookupKind::Customer, &NewLookup::customer("Acme", "C-1"))
            .unwrap();
        repo.soft_delete_lookup(LookupKind::Customer, &first.id).unwrap();
        let err = repo
            .create_lookup(LookupKind::Customer, &NewLookup::customer("Acme 2", "C-1"))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_missing_required_code_is_constraint_violation() {
        let mut repo = repo();
        let err = repo
            .create_lookup(
                LookupKind::Customer,
                &NewLookup {
                    label: "No code".into(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_empty_label_is_constraint_violation() {
        let mut repo = repo();
        let err = repo
            .create_lookup(LookupKind::Employee, &NewLookup::employee("", None))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_update_lookup_applies_patch() {
        let mut repo = repo();
        let jane = employee(&mut repo, "Jane");
        let patch = LookupPatch {
            label: Some("Jane Doe".into()),
            secondary: Some(Some("jane@example.com".into())),
            ..Default::default()
        };
        let updated = repo
            .update_lookup(LookupKind::Employee, &jane.id, &patch)
            .unwrap();
        assert_eq!(updated.label, "Jane Doe");
        assert_eq!(updated.secondary.as_deref(), Some("jane@example.com"));
        assert!(updated.updated_at >= jane.updated_at);
    }

    #[test]
    fn test_update_unknown_lookup_is_not_found() {
        let mut repo = repo();
        let err = repo
            .update_lookup(LookupKind::Employee, "nope", &LookupPatch::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_create_dmt_applies_defaults() {
        let mut repo = repo();
        let record = repo
            .create_dmt(&NewDmtRecord::new("DMT-TEST-00001", "Burr on edge"))
            .unwrap();

        assert_eq!(record.qty, 0);
        assert_eq!(record.car_type, CarType::Dmt);
        assert_eq!(record.car_cycle, 1);
        assert!(record.is_active);
        assert!(!record.dmt_closed);
        assert!(!record.is_return);
        assert_eq!(record.operation, "");
        assert_eq!(record.date, Some(Utc::now().date_naive()));
    }

    #[test]
    fn test_list_dmt_newest_first() {
        let mut repo = repo();
        for id in ["DMT-T1-AAAAA", "DMT-T2-AAAAA", "DMT-T3-AAAAA"] {
            repo.create_dmt(&NewDmtRecord::new(id, "defect")).unwrap();
        }
        let ids: Vec<String> = repo
            .list_active_dmt()
            .unwrap()
            .into_iter()
            .map(|r| r.record.id)
            .collect();
        assert_eq!(ids, vec!["DMT-T3-AAAAA", "DMT-T2-AAAAA", "DMT-T1-AAAAA"]);
    }

    #[test]
    fn test_dmt_enrichment_resolves_names() {
        let mut repo = repo();
        let jane = employee(&mut repo, "Jane Doe");
        let bob = employee(&mut repo, "Bob");

        let mut new = NewDmtRecord::new("DMT-E-00001", "Scratch");
        new.employee_id = Some(jane.id.clone());
        new.prepared_by_id = Some(bob.id.clone());
        repo.create_dmt(&new).unwrap();
        repo.create_dmt(&NewDmtRecord::new("DMT-E-00002", "Dent"))
            .unwrap();

        let view = repo.get_dmt("DMT-E-00001").unwrap().unwrap();
        assert_eq!(view.employee.as_ref().unwrap().name, "Jane Doe");
        assert_eq!(view.prepared_by.as_ref().unwrap().name, "Bob");
        assert!(view.disposition_approved_by.is_none());
        assert!(view.workcenter.is_none());

        let bare = repo.get_dmt("DMT-E-00002").unwrap().unwrap();
        assert!(bare.employee.is_none());
    }

    #[test]
    fn test_get_dmt_missing_or_inactive_is_none() {
        let mut repo = repo();
        assert!(repo.get_dmt("DMT-NOPE-00000").unwrap().is_none());

        repo.create_dmt(&NewDmtRecord::new("DMT-D-00001", "x")).unwrap();
        repo.soft_delete_dmt("DMT-D-00001").unwrap();
        assert!(repo.get_dmt("DMT-D-00001").unwrap().is_none());
        assert!(!repo.fetch_dmt("DMT-D-00001").unwrap().unwrap().is_active);
        assert!(repo.list_active_dmt().unwrap().is_empty());
    }

    #[test]
    fn test_dmt_unknown_foreign_key_is_constraint_violation() {
        let mut repo = repo();
        let mut new = NewDmtRecord::new("DMT-F-00001", "x");
        new.customer_id = Some("no-such-customer".into());
        let err = repo.create_dmt(&new).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_duplicate_dmt_id_is_constraint_violation() {
        let mut repo = repo();
        repo.create_dmt(&NewDmtRecord::new("DMT-X-00001", "a")).unwrap();
        let err = repo
            .create_dmt(&NewDmtRecord::new("DMT-X-00001", "b"))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_dmt_booleans_roundtrip() {
        let mut repo = repo();
        let mut new = NewDmtRecord::new("DMT-B-00001", "x");
        new.dmt_closed = Some(true);
        new.is_return = Some(true);
        let created = repo.create_dmt(&new).unwrap();
        assert!(created.dmt_closed && created.is_return);

        let patch = DmtPatch {
            dmt_closed: Some(false),
            car_type: Some(CarType::Ndmt),
            qty: Some(7),
            ..Default::default()
        };
        let updated = repo.update_dmt("DMT-B-00001", &patch).unwrap();
        assert!(!updated.dmt_closed);
        assert!(updated.is_return);
        assert_eq!(updated.car_type, CarType::Ndmt);
        assert_eq!(updated.qty, 7);

        let listed = repo.list_active_dmt().unwrap();
        assert!(!listed[0].record.dmt_closed);
        assert!(listed[0].record.is_return);
    }

    #[test]
    fn test_update_unknown_dmt_is_not_found() {
        let mut repo = repo();
        let err = repo
            .update_dmt("DMT-NONE-00000", &DmtPatch::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_car_type_is_decode_error() {
        let repo = repo();
        // Rows written before the CHECK existed can still carry other values
        repo.conn
            .execute_batch(
                "PRAGMA ignore_check_constraints = ON;
                 INSERT INTO dmt_records (id, defect_description, car_type) VALUES ('DMT-Q-1', 'x', 'zzz');
                 PRAGMA ignore_check_constraints = OFF;",
            )
            .unwrap();
        let err = repo.list_active_dmt().unwrap_err();
        assert!(matches!(err, RepoError::Decode { .. }));
    }

    #[test]
    fn test_reads_never_write_slot() {
        let mut repo = EmbeddedRepository::open(MemorySlot::new()).unwrap();
        assert_eq!(repo.slot().writes(), 0);

        repo.ensure_schema().unwrap();
        assert_eq!(repo.slot().writes(), 1);
        assert!(repo.slot().contains(SNAPSHOT_KEY));

        let jane = employee(&mut repo, "Jane");
        repo.create_dmt(&NewDmtRecord::new("DMT-R-00001", "x")).unwrap();
        assert_eq!(repo.slot().writes(), 3);

        repo.list_active(LookupKind::Employee).unwrap();
        repo.fetch_lookup(LookupKind::Employee, &jane.id).unwrap();
        repo.list_active_dmt().unwrap();
        repo.get_dmt("DMT-R-00001").unwrap();
        repo.fetch_dmt("DMT-R-00001").unwrap();
        repo.recent_audit(10).unwrap();
        assert_eq!(repo.slot().writes(), 3);

        repo.soft_delete_dmt("DMT-R-00001").unwrap();
        assert_eq!(repo.slot().writes(), 4);
    }

    #[test]
    fn test_ensure_schema_twice_is_harmless() {
        let mut repo = repo();
        employee(&mut repo, "Jane");
        repo.ensure_schema().unwrap();
        assert_eq!(repo.list_active(LookupKind::Employee).unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_restores_rows() {
        let mut repo = repo();
        let jane = employee(&mut repo, "Jane Doe");
        let mut new = NewDmtRecord::new("DMT-P-00001", "Porosity");
        new.employee_id = Some(jane.id.clone());
        repo.create_dmt(&new).unwrap();

        let reopened = EmbeddedRepository::open(repo.into_slot()).unwrap();
        let view = reopened.get_dmt("DMT-P-00001").unwrap().unwrap();
        assert_eq!(view.employee.unwrap().name, "Jane Doe");
        assert_eq!(reopened.list_active(LookupKind::Employee).unwrap().len(), 1);
    }

    #[test]
    fn test_foreign_keys_enforced_after_reopen() {
        let repo = repo();
        let mut reopened = EmbeddedRepository::open(repo.into_slot()).unwrap();
        let mut new = NewDmtRecord::new("DMT-K-00001", "x");
        new.workcenter_id = Some("ghost".into());
        assert!(reopened.create_dmt(&new).unwrap_err().is_constraint_violation());
    }

    #[test]
    fn test_corrupt_slot_is_backend_unavailable() {
        let mut slot = MemorySlot::new();
        slot.set(SNAPSHOT_KEY, "{not an array".into()).unwrap();
        let err = EmbeddedRepository::open(slot).err().unwrap();
        assert!(matches!(err, RepoError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_every_mutation_is_audited() {
        let mut repo = repo();
        let jane = employee(&mut repo, "Jane");
        repo.update_lookup(
            LookupKind::Employee,
            &jane.id,
            &LookupPatch {
                label: Some("Jane D".into()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.soft_delete_lookup(LookupKind::Employee, &jane.id).unwrap();

        let entries = repo.recent_audit(10).unwrap();
        let actions: Vec<AuditAction> = entries.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::Delete, AuditAction::Update, AuditAction::Create]
        );
        assert!(entries.iter().all(|e| e.entity_id == jane.id));
        assert_eq!(entries[1].changes.as_ref().unwrap()["name"], "Jane D");
    }
}
