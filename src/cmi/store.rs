//! Per-session CMI key/value table

use crate::cmi::schema;
use crate::core::types::ScormVersion;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Element path → value table for one SCORM version
///
/// Seeded from the schema on creation. Keys are only ever inserted or
/// overwritten; there is no removal.
#[derive(Debug, Clone, Serialize)]
pub struct DataStore {
    version: ScormVersion,
    values: BTreeMap<String, String>,
}

impl DataStore {
    pub fn new(version: ScormVersion) -> Self {
        let values = schema::elements(version)
            .iter()
            .filter(|def| !def.is_array_member())
            .filter_map(|def| def.default.map(|d| (def.path.to_string(), d.to_string())))
            .collect();
        Self { version, values }
    }

    pub fn version(&self) -> ScormVersion {
        self.version
    }

    /// Stored value, or `""` for anything never written
    pub fn get(&self, path: &str) -> &str {
        self.values.get(path).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    /// Insert or overwrite without any schema check
    pub fn set(&mut self, path: &str, value: &str) {
        self.values.insert(path.to_string(), value.to_string());
    }

    /// Seed the learner identity into the version's read-only fields
    pub fn seed_learner(&mut self, id: &str, name: &str) {
        let (id_key, name_key) = match self.version {
            ScormVersion::V12 => ("cmi.core.student_id", "cmi.core.student_name"),
            ScormVersion::V2004 => ("cmi.learner_id", "cmi.learner_name"),
        };
        self.set(id_key, id);
        self.set(name_key, name);
    }

    /// Number of populated records in an array such as `cmi.interactions`
    pub fn count(&self, array: &str) -> usize {
        let prefix = format!("{}.", array);
        self.values
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| {
                let rest = &k[prefix.len()..];
                let index = rest.split('.').next()?;
                index.parse::<usize>().ok()
            })
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_defaults() {
        let store = DataStore::new(ScormVersion::V12);
        assert_eq!(store.get("cmi.core.lesson_status"), "not attempted");
        assert_eq!(store.get("cmi.core.entry"), "ab-initio");
        assert!(!store.contains("cmi.objectives.n.id"));

        let store = DataStore::new(ScormVersion::V2004);
        assert_eq!(store.get("cmi.completion_status"), "unknown");
        assert_eq!(store.get("cmi._version"), "1.0");
        assert!(!store.contains("cmi.core.lesson_status"));
    }

    #[test]
    fn test_unseeded_read_is_empty() {
        let store = DataStore::new(ScormVersion::V12);
        assert_eq!(store.get("cmi.nothing.here"), "");
    }

    #[test]
    fn test_count_distinct_indices() {
        let mut store = DataStore::new(ScormVersion::V2004);
        assert_eq!(store.count("cmi.interactions"), 0);
        store.set("cmi.interactions.0.id", "q1");
        store.set("cmi.interactions.0.type", "choice");
        store.set("cmi.interactions.1.id", "q2");
        store.set("cmi.interactions_extra", "x");
        assert_eq!(store.count("cmi.interactions"), 2);
        assert_eq!(store.count("cmi.objectives"), 0);
    }

    #[test]
    fn test_seed_learner() {
        let mut store = DataStore::new(ScormVersion::V2004);
        store.seed_learner("u1", "Doe, Jane");
        assert_eq!(store.get("cmi.learner_id"), "u1");
        assert_eq!(store.get("cmi.learner_name"), "Doe, Jane");
    }
}
