//! Audit logging
//!
//! Append-only JSONL log of every create/update/delete the services
//! perform, with before/after snapshots for updates.

pub mod entry;
pub mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
