//! Periodic progress persistence
//!
//! While content is running, the bridge reduces the CMI data to a 0-100
//! percentage and hands it to the backend. Failed saves are logged and
//! dropped; the next tick tries again with fresh data.

use crate::backend::{Backend, ProgressUpdate};
use crate::cmi::store::DataStore;
use crate::core::types::{PackageId, ScormVersion};
use crate::rte::session::Session;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Anything the bridge can sample progress from
pub trait ProgressSource: Send + Sync + 'static {
    /// Content is between Initialize and Terminate
    fn is_running(&self) -> bool;

    /// Current progress, `None` when content never initialized
    fn percentage(&self) -> Option<u8>;
}

impl ProgressSource for Session {
    fn is_running(&self) -> bool {
        Session::is_running(self)
    }

    fn percentage(&self) -> Option<u8> {
        self.active_store().map(|store| percentage(&store))
    }
}

/// Reduce a data store to a 0-100 percentage
pub fn percentage(store: &DataStore) -> u8 {
    match store.version() {
        ScormVersion::V12 => match store.get("cmi.core.lesson_status") {
            "completed" | "passed" | "failed" => 100,
            _ => 0,
        },
        ScormVersion::V2004 => {
            if store.get("cmi.completion_status") == "completed"
                || store.get("cmi.success_status") == "passed"
            {
                return 100;
            }
            store
                .get("cmi.progress_measure")
                .parse::<f64>()
                .ok()
                .filter(|m| m.is_finite())
                .map(|m| (m * 100.0).round().clamp(0.0, 100.0) as u8)
                .unwrap_or(0)
        }
    }
}

/// Sample `source` once and send it; returns the update when the save succeeded
pub async fn save_once<B, S>(
    backend: &B,
    source: &S,
    package_id: &PackageId,
) -> Option<ProgressUpdate>
where
    B: Backend,
    S: ProgressSource + ?Sized,
{
    let percentage = source.percentage()?;
    let update = ProgressUpdate {
        timestamp: Utc::now().timestamp_millis(),
        percentage,
    };
    match backend.save_progress(package_id, update).await {
        Ok(()) => {
            tracing::debug!(package = %package_id, percentage, "progress saved");
            Some(update)
        }
        Err(e) => {
            tracing::warn!(package = %package_id, error = %e, "progress save failed");
            None
        }
    }
}

/// Owns the periodic save task for one player
pub struct ProgressBridge<B: Backend, S: ProgressSource> {
    backend: Arc<B>,
    source: Arc<S>,
    package_id: PackageId,
    task: Option<JoinHandle<()>>,
    closed: bool,
}

impl<B: Backend, S: ProgressSource> ProgressBridge<B, S> {
    /// Start saving every `period`; the first save happens one period in
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(backend: Arc<B>, source: Arc<S>, package_id: PackageId, period: Duration) -> Self {
        let task = {
            let backend = Arc::clone(&backend);
            let source = Arc::clone(&source);
            let package_id = package_id.clone();
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    if source.is_running() {
                        save_once(backend.as_ref(), source.as_ref(), &package_id).await;
                    }
                }
            })
        };
        tracing::info!(
            package = %package_id,
            period_ms = period.as_millis() as u64,
            "progress bridge started"
        );
        Self {
            backend,
            source,
            package_id,
            task: Some(task),
            closed: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the periodic task without a final save
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Stop and flush once more; later calls do nothing
    pub async fn close(&mut self) -> Option<ProgressUpdate> {
        self.stop();
        if self.closed {
            return None;
        }
        self.closed = true;
        save_once(self.backend.as_ref(), self.source.as_ref(), &self.package_id).await
    }
}

impl<B: Backend, S: ProgressSource> Drop for ProgressBridge<B, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn running_2004(measure: &str) -> Session {
        let session = Session::new("p1".into());
        session.call(ScormVersion::V2004, "Initialize", &[""]);
        session.call(ScormVersion::V2004, "SetValue", &["cmi.progress_measure", measure]);
        session
    }

    #[test]
    fn test_percentage_12() {
        let mut store = DataStore::new(ScormVersion::V12);
        assert_eq!(percentage(&store), 0);
        store.set("cmi.core.lesson_status", "incomplete");
        assert_eq!(percentage(&store), 0);
        store.set("cmi.core.lesson_status", "passed");
        assert_eq!(percentage(&store), 100);
    }

    #[test]
    fn test_percentage_2004() {
        let mut store = DataStore::new(ScormVersion::V2004);
        assert_eq!(percentage(&store), 0);
        store.set("cmi.progress_measure", "0.456");
        assert_eq!(percentage(&store), 46);
        store.set("cmi.completion_status", "completed");
        assert_eq!(percentage(&store), 100);
    }

    #[test]
    fn test_uninitialized_session_has_no_percentage() {
        let session = Session::new("p1".into());
        assert_eq!(ProgressSource::percentage(&session), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_saves_while_running() {
        let backend = Arc::new(MemoryBackend::new());
        let session = Arc::new(running_2004("0.4"));
        let mut bridge = ProgressBridge::start(
            Arc::clone(&backend),
            Arc::clone(&session),
            "p1".into(),
            Duration::from_secs(5),
        );

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert!(backend.progress_updates().is_empty());

        tokio::time::sleep(Duration::from_millis(10_200)).await;
        let updates = backend.progress_updates();
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|(p, u)| p.as_str() == "p1" && u.percentage == 40));

        bridge.stop();
        assert!(!bridge.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_saves_after_terminate() {
        let backend = Arc::new(MemoryBackend::new());
        let session = Arc::new(running_2004("0.5"));
        session.call(ScormVersion::V2004, "Terminate", &[""]);
        let _bridge = ProgressBridge::start(
            Arc::clone(&backend),
            Arc::clone(&session),
            "p1".into(),
            Duration::from_secs(5),
        );

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(backend.progress_updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_keeps_ticking() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_progress_failure(true);
        let session = Arc::new(running_2004("0.2"));
        let bridge = ProgressBridge::start(
            Arc::clone(&backend),
            Arc::clone(&session),
            "p1".into(),
            Duration::from_secs(5),
        );

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert!(backend.progress_updates().is_empty());

        backend.set_progress_failure(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.progress_updates().len(), 1);
        assert!(bridge.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_once() {
        let backend = Arc::new(MemoryBackend::new());
        let session = Arc::new(running_2004("0.9"));
        let mut bridge = ProgressBridge::start(
            Arc::clone(&backend),
            Arc::clone(&session),
            "p1".into(),
            Duration::from_secs(5),
        );

        let update = bridge.close().await.unwrap();
        assert_eq!(update.percentage, 90);
        assert!(bridge.close().await.is_none());
        assert_eq!(backend.progress_updates().len(), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(backend.progress_updates().len(), 1);
    }
}
