//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a mounted player session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a content package as assigned by the host backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// SCORM runtime versions with their own API surface and data model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScormVersion {
    #[serde(rename = "1.2")]
    V12,
    #[serde(rename = "2004")]
    V2004,
}

impl ScormVersion {
    pub const ALL: [ScormVersion; 2] = [ScormVersion::V12, ScormVersion::V2004];

    /// Global key content searches for when discovering the API object
    pub fn api_key(self) -> &'static str {
        match self {
            ScormVersion::V12 => "API",
            ScormVersion::V2004 => "API_1484_11",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScormVersion::V12 => "1.2",
            ScormVersion::V2004 => "2004",
        }
    }
}

impl fmt::Display for ScormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Content protocol of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "1.2")]
    Scorm12,
    #[serde(rename = "2004")]
    Scorm2004,
    #[serde(rename = "cmi5")]
    Cmi5,
}

impl Protocol {
    pub fn scorm_version(self) -> Option<ScormVersion> {
        match self {
            Protocol::Scorm12 => Some(ScormVersion::V12),
            Protocol::Scorm2004 => Some(ScormVersion::V2004),
            Protocol::Cmi5 => None,
        }
    }
}

impl From<ScormVersion> for Protocol {
    fn from(v: ScormVersion) -> Self {
        match v {
            ScormVersion::V12 => Protocol::Scorm12,
            ScormVersion::V2004 => Protocol::Scorm2004,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Scorm12 => f.write_str("1.2"),
            Protocol::Scorm2004 => f.write_str("2004"),
            Protocol::Cmi5 => f.write_str("cmi5"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_keys() {
        assert_eq!(ScormVersion::V12.api_key(), "API");
        assert_eq!(ScormVersion::V2004.api_key(), "API_1484_11");
    }

    #[test]
    fn test_protocol_serializes_as_label() {
        let json = serde_json::to_string(&Protocol::Scorm2004).unwrap();
        assert_eq!(json, "\"2004\"");
        let back: Protocol = serde_json::from_str("\"cmi5\"").unwrap();
        assert_eq!(back, Protocol::Cmi5);
    }

    #[test]
    fn test_session_ids_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
