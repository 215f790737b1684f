//! Bounded log of every API call, for operator debugging
//!
//! The logger only observes. Nothing it records feeds back into protocol
//! state or return values.

use crate::core::error::Result;
use crate::core::types::ScormVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

pub const DEFAULT_CAPACITY: usize = 100;

/// One recorded API invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogEntry {
    pub id: u64,
    pub protocol_version: ScormVersion,
    pub method: String,
    pub args: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Ring buffer of recent API calls
#[derive(Debug, Clone)]
pub struct CallLog {
    entries: VecDeque<CallLogEntry>,
    capacity: usize,
    next_id: u64,
}

impl CallLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    pub fn record(&mut self, version: ScormVersion, method: &str, args: &[&str]) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        if self.entries.len() >= self.capacity {
            self.entries.pop_front(); // Drop oldest
        }
        self.entries.push_back(CallLogEntry {
            id,
            protocol_version: version,
            method: method.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timestamp: Utc::now(),
        });
        id
    }

    pub fn entries(&self) -> impl Iterator<Item = &CallLogEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<CallLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Empty the buffer; ids keep increasing across clears
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.export_json()?)?;
        tracing::info!(path = %path.display(), entries = self.len(), "call log exported");
        Ok(())
    }
}

impl Default for CallLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_drops_oldest() {
        let mut log = CallLog::new(3);
        for i in 0..4 {
            log.record(ScormVersion::V12, "LMSGetValue", &[&format!("e{}", i)]);
        }
        assert_eq!(log.len(), 3);
        let first = log.entries().next().unwrap();
        assert_eq!(first.id, 2);
        assert_eq!(first.args, vec!["e1".to_string()]);
    }

    #[test]
    fn test_default_capacity() {
        let mut log = CallLog::default();
        for _ in 0..150 {
            log.record(ScormVersion::V2004, "GetLastError", &[]);
        }
        assert_eq!(log.len(), 100);
        assert_eq!(log.capacity(), 100);
    }

    #[test]
    fn test_clear_keeps_ids_monotonic() {
        let mut log = CallLog::new(5);
        log.record(ScormVersion::V12, "LMSInitialize", &[""]);
        log.clear();
        assert!(log.is_empty());
        let id = log.record(ScormVersion::V12, "LMSFinish", &[""]);
        assert_eq!(id, 2);
    }

    #[test]
    fn test_export_json_shape() {
        let mut log = CallLog::new(5);
        log.record(ScormVersion::V2004, "SetValue", &["cmi.location", "p2"]);
        let json = log.export_json().unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["protocolVersion"], "2004");
        assert_eq!(parsed[0]["method"], "SetValue");
        assert_eq!(parsed[0]["args"][1], "p2");
        assert!(parsed[0]["timestamp"].is_string());

        let back: Vec<CallLogEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log.to_vec());
    }
}
