//! Command implementations

pub mod audit;
pub mod completions;
pub mod config;
pub mod dmt;
pub mod init;
pub mod lookup;
pub mod schema;
