//! Core module - identifiers, configuration, typed reference data

pub mod config;
pub mod identity;
pub mod reference;

pub use config::{BackendKind, Config, ConfigError, HostedConfig};
pub use identity::{new_opaque_id, new_record_code, IdParseError, RecordCode};
pub use reference::{ReferenceData, ReferenceProvider};
