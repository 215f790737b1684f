//! Publishes a session's API objects across the frame chain
//!
//! Content may look for the API before or after the host is ready, so the
//! manager publishes once on start and then again on a fixed interval until
//! stopped. Slots that already hold an object are never overwritten, and
//! teardown removes only what this manager wrote.

use crate::attach::registry::PublishedRegistry;
use crate::attach::target::{FrameChain, TargetHandle};
use crate::rte::api::{same_object, ApiObject};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Outcome of one publish pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Slots written during this pass
    pub published: usize,
    /// Slots already holding this manager's object
    pub already_ours: usize,
    /// Slots holding someone else's object
    pub occupied: usize,
    /// Targets skipped because access was refused
    pub unreachable: usize,
}

#[derive(Debug)]
struct Shared {
    targets: Vec<TargetHandle>,
    objects: Vec<ApiObject>,
    registry: PublishedRegistry,
    stopped: bool,
    passes: u64,
}

impl Shared {
    fn publish_pass(&mut self) -> PublishReport {
        let mut report = PublishReport::default();
        if self.stopped {
            return report;
        }
        self.passes += 1;

        for target in &self.targets {
            for object in &self.objects {
                let key = object.key();
                match target.publish_if_absent(key, object.clone()) {
                    Ok(None) => {
                        self.registry.record(target, key, object);
                        report.published += 1;
                        tracing::debug!(frame = target.name(), key, "api published");
                    }
                    Ok(Some(existing)) if same_object(&existing, object) => {
                        report.already_ours += 1
                    }
                    Ok(Some(_)) => report.occupied += 1,
                    Err(e) => {
                        tracing::debug!(
                            frame = target.name(),
                            key,
                            error = %e,
                            "frame unreachable, skipping"
                        );
                        report.unreachable += 1;
                        break;
                    }
                }
            }
        }
        report
    }
}

/// Scoped publisher; dropping it stops the poll and retracts
#[derive(Debug)]
pub struct AttachmentManager {
    shared: Arc<Mutex<Shared>>,
    task: Option<JoinHandle<()>>,
}

impl AttachmentManager {
    pub fn new(chain: &FrameChain, objects: Vec<ApiObject>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                targets: chain.candidates(),
                objects,
                registry: PublishedRegistry::new(),
                stopped: false,
                passes: 0,
            })),
            task: None,
        }
    }

    /// Run a single publish pass now
    pub fn publish_once(&self) -> PublishReport {
        self.shared.lock().publish_pass()
    }

    /// Publish immediately, then every `period` until [`stop`](Self::stop)
    ///
    /// Must be called from within a tokio runtime. Calling it again while a
    /// poll is running has no effect.
    pub fn start(&mut self, period: Duration) -> PublishReport {
        let report = self.publish_once();
        if self.task.is_some() || self.is_stopped() {
            return report;
        }

        let shared = Arc::clone(&self.shared);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut guard = shared.lock();
                if guard.stopped {
                    break;
                }
                guard.publish_pass();
            }
        }));
        tracing::info!(
            period_ms = period.as_millis() as u64,
            ?report,
            "attachment manager started"
        );
        report
    }

    /// Cancel the poll and retract this manager's objects
    ///
    /// Returns the number of slots cleared. Only the first call does
    /// anything.
    pub fn stop(&mut self) -> usize {
        let removed = {
            let mut shared = self.shared.lock();
            if shared.stopped {
                return 0;
            }
            // set under the lock so no pass can run after this point
            shared.stopped = true;
            shared.registry.retract_all()
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }
        tracing::info!(removed, "attachment manager stopped");
        removed
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().stopped
    }

    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Number of publish passes that actually ran
    pub fn passes(&self) -> u64 {
        self.shared.lock().passes
    }

    /// `(frame name, key)` for every slot this manager has written
    pub fn published(&self) -> Vec<(String, &'static str)> {
        self.shared
            .lock()
            .registry
            .iter()
            .map(|p| (p.target.name().to_string(), p.key))
            .collect()
    }
}

impl Drop for AttachmentManager {
    fn drop(&mut self) {
        self.stop();
    }
}
