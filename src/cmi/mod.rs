//! SCORM CMI data model: schema tables and the per-session store

pub mod schema;
pub mod store;

pub use schema::{Access, ElementDef, ValueKind, Violation};
pub use store::DataStore;
