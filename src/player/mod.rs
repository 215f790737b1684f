//! Player shell: mounts one package and owns every task it starts

pub mod shell;

pub use shell::PlayerShell;

use serde::Serialize;

/// What the host should show for a mounted package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PlayerStatus {
    Loading,
    #[serde(rename_all = "camelCase")]
    Ready { launch_url: String },
    /// Blocking, human-readable failure
    Error { message: String },
    Closed,
}

impl PlayerStatus {
    pub fn launch_url(&self) -> Option<&str> {
        match self {
            PlayerStatus::Ready { launch_url } => Some(launch_url),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PlayerStatus::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_json() {
        let ready = PlayerStatus::Ready {
            launch_url: "/c/index.html".into(),
        };
        assert_eq!(
            serde_json::to_string(&ready).unwrap(),
            r#"{"status":"ready","launchUrl":"/c/index.html"}"#
        );
        assert_eq!(ready.launch_url(), Some("/c/index.html"));
        assert!(!PlayerStatus::Loading.is_error());
    }
}
