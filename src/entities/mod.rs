//! Entity type definitions
//!
//! **Reference data (lookup entities):**
//! - [`Employee`], [`Workcenter`], [`PartNumber`], [`Customer`], [`InspectionItem`]
//!
//! **Fact entity:**
//! - [`DmtRecord`] - one defect / corrective action case, and its
//!   [`EnrichedDmtRecord`] display view
//!
//! **History:**
//! - [`AuditEntry`] - one row per create/update/delete

pub mod audit;
pub mod dmt;
pub mod lookup;

pub use audit::{AuditAction, AuditEntry};
pub use dmt::{
    CarType, DmtPatch, DmtRecord, EnrichedDmtRecord, JoinedNames, NameRef, NewDmtRecord,
    PartNumberRef,
};
pub use lookup::{
    Customer, Employee, InspectionItem, LookupEntity, LookupKind, LookupPatch, LookupRecord,
    NewLookup, PartNumber, Workcenter,
};
