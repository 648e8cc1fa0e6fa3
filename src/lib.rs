//! QMS: DMT quality record tracker
//!
//! Defect / corrective action (DMT) records against five kinds of reference
//! data, stored either in an embedded SQLite image or on a hosted REST
//! service behind one repository trait.

pub mod cli;
pub mod core;
pub mod entities;
pub mod store;
