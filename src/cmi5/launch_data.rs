//! cmi5 documents exchanged around a launch

use crate::core::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// State document id the LMS seeds before content launches
pub const LAUNCH_DATA_STATE_ID: &str = "LMS.LaunchData";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchMode {
    #[default]
    Normal,
    Browse,
    Review,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOn {
    Passed,
    Completed,
    CompletedAndPassed,
    CompletedOrPassed,
    #[default]
    NotApplicable,
}

/// `LMS.LaunchData` state document the backend seeds for each registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchData {
    #[serde(default)]
    pub launch_mode: LaunchMode,
    #[serde(default)]
    pub launch_parameters: String,
    #[serde(default)]
    pub move_on: MoveOn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<f64>,
    #[serde(rename = "returnURL", default)]
    pub return_url: String,
}

impl Default for LaunchData {
    fn default() -> Self {
        Self {
            launch_mode: LaunchMode::Normal,
            launch_parameters: String::new(),
            move_on: MoveOn::NotApplicable,
            mastery_score: Some(0.8),
            return_url: String::new(),
        }
    }
}

impl LaunchData {
    /// Parse a state response body
    ///
    /// An empty body or the literal `undefined` means nothing was seeded
    /// and yields the defaults.
    pub fn parse(body: &str) -> Result<Self> {
        let body = body.trim();
        if body.is_empty() || body.eq_ignore_ascii_case("undefined") {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(body)?)
    }
}

/// Response of the cmi5 fetch endpoint
///
/// Backends disagree on the key name, so every known spelling is accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchTokenResponse {
    #[serde(rename = "auth-token")]
    auth_token_dash: Option<String>,
    #[serde(rename = "auth_token")]
    auth_token_snake: Option<String>,
    #[serde(rename = "authToken")]
    auth_token_camel: Option<String>,
    token: Option<String>,
    #[serde(rename = "error-code")]
    error_code: Option<String>,
    #[serde(rename = "error-text", alias = "error")]
    error_text: Option<String>,
}

impl FetchTokenResponse {
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// The token, or the error the endpoint reported
    pub fn into_token(self) -> Result<String> {
        if let Some(token) = self
            .auth_token_dash
            .or(self.auth_token_snake)
            .or(self.auth_token_camel)
            .or(self.token)
        {
            return Ok(token);
        }
        let reason = match (self.error_code, self.error_text) {
            (Some(code), Some(text)) => format!("{}: {}", code, text),
            (Some(code), None) => code,
            (None, Some(text)) => text,
            (None, None) => "no auth token in response".into(),
        };
        Err(BridgeError::LaunchInit(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_data_defaults_serialize() {
        let json = serde_json::to_value(LaunchData::default()).unwrap();
        assert_eq!(json["launchMode"], "Normal");
        assert_eq!(json["moveOn"], "NotApplicable");
        assert_eq!(json["masteryScore"], 0.8);
        assert_eq!(json["returnURL"], "");
    }

    #[test]
    fn test_launch_data_parses_backend_document() {
        let doc = r#"{
            "launchMode": "Review",
            "launchParameters": "",
            "moveOn": "CompletedAndPassed",
            "returnURL": "https://lms/close"
        }"#;
        let data: LaunchData = serde_json::from_str(doc).unwrap();
        assert_eq!(data.launch_mode, LaunchMode::Review);
        assert_eq!(data.mastery_score, None);
        assert_eq!(data.return_url, "https://lms/close");
    }

    #[test]
    fn test_launch_data_unseeded_bodies() {
        assert_eq!(LaunchData::parse("").unwrap(), LaunchData::default());
        assert_eq!(LaunchData::parse(" undefined ").unwrap(), LaunchData::default());

        let empty = LaunchData::parse("{}").unwrap();
        assert_eq!(empty.launch_mode, LaunchMode::Normal);
        assert_eq!(empty.move_on, MoveOn::NotApplicable);
        assert!(LaunchData::parse("not json").is_err());
    }

    #[test]
    fn test_token_key_variants() {
        for body in [
            r#"{"auth-token":"t1"}"#,
            r#"{"auth_token":"t1"}"#,
            r#"{"authToken":"t1"}"#,
            r#"{"token":"t1"}"#,
        ] {
            let token = FetchTokenResponse::parse(body).unwrap().into_token().unwrap();
            assert_eq!(token, "t1");
        }
    }

    #[test]
    fn test_token_error() {
        let resp = FetchTokenResponse::parse(r#"{"error":"Failed to generate token"}"#).unwrap();
        let err = resp.into_token().unwrap_err();
        assert!(err.to_string().contains("Failed to generate token"));
    }
}
