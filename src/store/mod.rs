//! Record repository: persistence and query layer
//!
//! One [`RecordRepository`] trait with two interchangeable adapters:
//! - [`embedded::EmbeddedRepository`] - in-memory SQLite whose file image is
//!   persisted to a key-value slot after every mutation
//! - [`hosted::HostedRepository`] - a PostgREST-style REST service
//!
//! Both return identical shapes: flat rows for lookups, enriched views for
//! DMT records.

pub mod coercion;
pub mod embedded;
pub mod error;
pub mod hosted;
pub mod schema;
pub mod value;

pub use embedded::{EmbeddedRepository, FileSlot, KeyValueStore, MemorySlot, SNAPSHOT_KEY};
pub use error::{RepoError, Result};
pub use hosted::{HostedRepository, HttpTransport, Transport};

use crate::core::config::{BackendKind, Config};
use crate::entities::{
    AuditEntry, DmtPatch, DmtRecord, EnrichedDmtRecord, LookupKind, LookupPatch, LookupRecord,
    NewDmtRecord, NewLookup,
};

/// Typed CRUD over the five lookup tables and the DMT fact table.
///
/// Reads take `&self`; anything that may persist takes `&mut self`. Errors
/// propagate verbatim: no adapter retries or swallows a failure.
pub trait RecordRepository {
    /// Short backend identifier for display ("embedded" / "hosted")
    fn backend_name(&self) -> &'static str;

    /// Create any missing tables and indexes. Safe to call repeatedly.
    fn ensure_schema(&mut self) -> Result<()>;

    /// Active rows of one kind, ordered by label ascending
    fn list_active(&self, kind: LookupKind) -> Result<Vec<LookupRecord>>;

    /// Row by id, active or not
    fn fetch_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<LookupRecord>>;

    fn create_lookup(&mut self, kind: LookupKind, new: &NewLookup) -> Result<LookupRecord>;

    /// Apply a partial patch and refresh `updated_at`
    fn update_lookup(
        &mut self,
        kind: LookupKind,
        id: &str,
        patch: &LookupPatch,
    ) -> Result<LookupRecord>;

    /// Mark inactive. Already-inactive and unknown ids are not errors.
    fn soft_delete_lookup(&mut self, kind: LookupKind, id: &str) -> Result<()>;

    /// Active DMT records, newest first, enriched with lookup names
    fn list_active_dmt(&self) -> Result<Vec<EnrichedDmtRecord>>;

    /// Active DMT record by id, or `None`
    fn get_dmt(&self, id: &str) -> Result<Option<EnrichedDmtRecord>>;

    /// Raw DMT row by id, active or not
    fn fetch_dmt(&self, id: &str) -> Result<Option<DmtRecord>>;

    fn create_dmt(&mut self, new: &NewDmtRecord) -> Result<DmtRecord>;

    fn update_dmt(&mut self, id: &str, patch: &DmtPatch) -> Result<DmtRecord>;

    fn soft_delete_dmt(&mut self, id: &str) -> Result<()>;

    /// Most recent audit entries, newest first
    fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>>;
}

/// Build the repository selected by configuration.
///
/// The embedded adapter is ready to query immediately; call
/// [`RecordRepository::ensure_schema`] to persist an initial snapshot.
pub fn open_repository(config: &Config) -> Result<Box<dyn RecordRepository>> {
    match config.backend() {
        BackendKind::Embedded => {
            let path = config.storage_path();
            tracing::debug!(path = %path.display(), "opening embedded repository");
            let slot = FileSlot::new(path);
            let repo = EmbeddedRepository::open_with_key(slot, config.storage_key())?;
            Ok(Box::new(repo))
        }
        BackendKind::Hosted => {
            let url = config
                .hosted
                .url
                .as_deref()
                .ok_or_else(|| RepoError::unavailable("hosted.url is not configured"))?;
            let api_key = config.hosted.api_key.clone().unwrap_or_default();
            tracing::debug!(url = %url, "opening hosted repository");
            let transport = HttpTransport::new(url, api_key, config.hosted.timeout())?;
            Ok(Box::new(HostedRepository::new(transport)))
        }
    }
}
