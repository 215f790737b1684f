//! In-memory backend for offline sessions and tests

use crate::backend::{Backend, InitLaunchRequest, PackageMetadata, ProgressUpdate};
use crate::core::error::{BridgeError, Result};
use crate::core::types::PackageId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryState {
    launches: Vec<InitLaunchRequest>,
    progress: Vec<(PackageId, ProgressUpdate)>,
    metadata: HashMap<PackageId, PackageMetadata>,
    launch_failure: Option<String>,
    progress_failure: bool,
    delay: Option<Duration>,
}

/// Records every request and answers from preloaded data
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_metadata(&self, package_id: PackageId, metadata: PackageMetadata) {
        self.state.lock().metadata.insert(package_id, metadata);
    }

    /// Make every init-launch fail with `reason` (`None` restores success)
    pub fn set_launch_failure(&self, reason: Option<&str>) {
        self.state.lock().launch_failure = reason.map(str::to_string);
    }

    pub fn set_progress_failure(&self, fail: bool) {
        self.state.lock().progress_failure = fail;
    }

    /// Delay every response, to exercise in-flight cancellation
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().delay = delay;
    }

    pub fn launches(&self) -> Vec<InitLaunchRequest> {
        self.state.lock().launches.clone()
    }

    pub fn progress_updates(&self) -> Vec<(PackageId, ProgressUpdate)> {
        self.state.lock().progress.clone()
    }

    async fn pause(&self) {
        let delay = self.state.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Backend for MemoryBackend {
    async fn init_launch(&self, request: &InitLaunchRequest) -> Result<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.launches.push(request.clone());
        match &state.launch_failure {
            Some(reason) => Err(BridgeError::LaunchInit(reason.clone())),
            None => Ok(()),
        }
    }

    async fn save_progress(&self, package_id: &PackageId, update: ProgressUpdate) -> Result<()> {
        self.pause().await;
        let mut state = self.state.lock();
        if state.progress_failure {
            return Err(BridgeError::Http("HTTP 503 Service Unavailable".into()));
        }
        state.progress.push((package_id.clone(), update));
        Ok(())
    }

    async fn fetch_metadata(&self, package_id: &PackageId) -> Result<PackageMetadata> {
        self.pause().await;
        self.state
            .lock()
            .metadata
            .get(package_id)
            .cloned()
            .ok_or_else(|| {
                BridgeError::MetadataFetch(format!("HTTP 404: package {} not found", package_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmi5::actor::Actor;

    #[tokio::test]
    async fn test_records_launches() {
        let backend = MemoryBackend::new();
        let request = InitLaunchRequest {
            package_id: "p1".into(),
            registration: "r1".into(),
            actor: Actor::agent("A", "http://h", "a"),
        };
        backend.init_launch(&request).await.unwrap();
        assert_eq!(backend.launches(), vec![request]);
    }

    #[tokio::test]
    async fn test_launch_failure_still_recorded() {
        let backend = MemoryBackend::new();
        backend.set_launch_failure(Some("HTTP 500"));
        let request = InitLaunchRequest {
            package_id: "p1".into(),
            registration: "p1".into(),
            actor: Actor::agent("A", "http://h", "a"),
        };
        let err = backend.init_launch(&request).await.unwrap_err();
        assert!(matches!(err, BridgeError::LaunchInit(_)));
        assert_eq!(backend.launches().len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_lookup() {
        let backend = MemoryBackend::new();
        let meta = PackageMetadata {
            title: "Intro".into(),
            launch_url: Some("/c/index.html".into()),
            ..Default::default()
        };
        backend.insert_metadata("p1".into(), meta.clone());

        assert_eq!(backend.fetch_metadata(&"p1".into()).await.unwrap(), meta);
        assert!(matches!(
            backend.fetch_metadata(&"missing".into()).await,
            Err(BridgeError::MetadataFetch(_))
        ));
    }

    #[tokio::test]
    async fn test_progress_failure_not_recorded() {
        let backend = MemoryBackend::new();
        let update = ProgressUpdate {
            timestamp: 1,
            percentage: 50,
        };
        backend.save_progress(&"p1".into(), update).await.unwrap();
        backend.set_progress_failure(true);
        assert!(backend.save_progress(&"p1".into(), update).await.is_err());
        assert_eq!(backend.progress_updates().len(), 1);
    }
}
