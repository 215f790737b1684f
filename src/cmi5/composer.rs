//! cmi5 launch negotiation
//!
//! The composer owns the `Idle -> Initializing -> Ready | Error` lifecycle.
//! A launch URL can only be built once the backend accepted the launch.

use crate::backend::{Backend, InitLaunchRequest};
use crate::cmi5::actor::Actor;
use crate::cmi5::launch::{resolve_registration, LaunchContext};
use crate::core::error::{BridgeError, Result};
use crate::core::types::PackageId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LaunchState {
    #[default]
    Idle,
    Initializing,
    Ready,
    /// Human-readable reason; shown to the learner as a blocking error
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Negotiated {
    package_id: PackageId,
    registration: String,
    actor: Actor,
}

#[derive(Debug, Default)]
pub struct LaunchComposer {
    state: LaunchState,
    negotiated: Option<Negotiated>,
}

impl LaunchComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LaunchState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LaunchState::Ready
    }

    /// Move to Initializing and produce the request to send
    ///
    /// Returns `None` unless the composer is idle; a failed launch is not
    /// retried.
    pub fn begin_init(
        &mut self,
        package_id: PackageId,
        registration: Option<&str>,
        actor: Actor,
    ) -> Option<InitLaunchRequest> {
        if self.state != LaunchState::Idle {
            tracing::debug!(state = ?self.state, "launch already negotiated");
            return None;
        }
        let registration = resolve_registration(&package_id, registration);
        self.negotiated = Some(Negotiated {
            package_id: package_id.clone(),
            registration: registration.clone(),
            actor: actor.clone(),
        });
        self.state = LaunchState::Initializing;
        Some(InitLaunchRequest {
            package_id,
            registration,
            actor,
        })
    }

    /// Record the backend's answer
    pub fn complete_init(&mut self, outcome: Result<()>) {
        if self.state != LaunchState::Initializing {
            return;
        }
        self.state = match outcome {
            Ok(()) => {
                let registration = self.negotiated.as_ref().map(|n| &n.registration);
                tracing::info!(?registration, "cmi5 launch ready");
                LaunchState::Ready
            }
            Err(e) => {
                tracing::error!(error = %e, "cmi5 launch initialization failed");
                LaunchState::Error(format!("Could not start the cmi5 session: {}", e))
            }
        };
    }

    /// Negotiate the launch with the backend
    pub async fn init<B: Backend>(
        &mut self,
        backend: &B,
        package_id: PackageId,
        registration: Option<&str>,
        actor: Actor,
    ) -> &LaunchState {
        if let Some(request) = self.begin_init(package_id, registration, actor) {
            let outcome = backend.init_launch(&request).await;
            self.complete_init(outcome);
        }
        &self.state
    }

    /// Launch context for the negotiated attempt
    pub fn context(&self, endpoint: &str) -> Result<LaunchContext> {
        match (&self.state, &self.negotiated) {
            (LaunchState::Ready, Some(n)) => Ok(LaunchContext::new(
                n.package_id.clone(),
                Some(&n.registration),
                n.actor.clone(),
                endpoint,
            )),
            (LaunchState::Error(reason), _) => Err(BridgeError::LaunchInit(reason.clone())),
            (state, _) => Err(BridgeError::LaunchInit(format!(
                "launch not ready (state {:?})",
                state
            ))),
        }
    }

    pub fn build_launch_url(&self, base: &str, endpoint: &str) -> Result<String> {
        self.context(endpoint)?.launch_url(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn actor() -> Actor {
        Actor::agent("A", "http://h", "a")
    }

    #[tokio::test]
    async fn test_init_success() {
        let backend = MemoryBackend::new();
        let mut composer = LaunchComposer::new();
        let state = composer.init(&backend, "p1".into(), Some("r1"), actor()).await;
        assert_eq!(*state, LaunchState::Ready);

        let sent = backend.launches();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].registration, "r1");
    }

    #[tokio::test]
    async fn test_init_failure_is_terminal() {
        let backend = MemoryBackend::new();
        backend.set_launch_failure(Some("HTTP 500"));
        let mut composer = LaunchComposer::new();
        composer.init(&backend, "p1".into(), None, actor()).await;

        match composer.state() {
            LaunchState::Error(msg) => assert!(msg.starts_with("Could not start the cmi5 session")),
            other => panic!("unexpected state {:?}", other),
        }

        // no retry
        backend.set_launch_failure(None);
        composer.init(&backend, "p1".into(), None, actor()).await;
        assert!(matches!(composer.state(), LaunchState::Error(_)));
        assert_eq!(backend.launches().len(), 1);
    }

    #[tokio::test]
    async fn test_undefined_registration_sent_as_package_id() {
        let backend = MemoryBackend::new();
        let mut composer = LaunchComposer::new();
        composer.init(&backend, "p1".into(), Some("undefined"), actor()).await;
        assert_eq!(backend.launches()[0].registration, "p1");

        let url = composer.build_launch_url("index.html", "http://h/api/lrs").unwrap();
        assert!(!url.contains("undefined"));
    }

    #[test]
    fn test_url_requires_ready() {
        let mut composer = LaunchComposer::new();
        assert!(composer.build_launch_url("index.html", "http://h").is_err());

        composer.begin_init("p1".into(), None, actor()).unwrap();
        assert!(composer.build_launch_url("index.html", "http://h").is_err());

        composer.complete_init(Ok(()));
        assert!(composer.build_launch_url("index.html", "http://h").is_ok());
    }

    #[test]
    fn test_begin_only_from_idle() {
        let mut composer = LaunchComposer::new();
        assert!(composer.begin_init("p1".into(), None, actor()).is_some());
        assert!(composer.begin_init("p1".into(), None, actor()).is_none());
    }
}
