//! Mount/unmount lifecycle for a single package
//!
//! SCORM packages get a session, an attachment manager publishing both API
//! surfaces, and a progress bridge. cmi5 packages get a launch negotiation
//! whose result is discarded if the player is gone by the time it arrives.

use crate::attach::manager::AttachmentManager;
use crate::attach::target::FrameChain;
use crate::backend::Backend;
use crate::cmi5::actor::Actor;
use crate::cmi5::composer::{LaunchComposer, LaunchState};
use crate::core::config::BridgeConfig;
use crate::core::types::PackageId;
use crate::player::PlayerStatus;
use crate::progress::ProgressBridge;
use crate::rte::api::surfaces;
use crate::rte::session::{Session, SessionInfo};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct PlayerShell<B: Backend> {
    package_id: PackageId,
    status: Arc<Mutex<PlayerStatus>>,
    session: Option<Session>,
    attachment: Option<AttachmentManager>,
    progress: Option<ProgressBridge<B, Session>>,
    launch: Option<JoinHandle<()>>,
}

impl<B: Backend> PlayerShell<B> {
    fn empty(package_id: PackageId) -> Self {
        Self {
            package_id,
            status: Arc::new(Mutex::new(PlayerStatus::Loading)),
            session: None,
            attachment: None,
            progress: None,
            launch: None,
        }
    }

    fn set_status(&self, status: PlayerStatus) {
        *self.status.lock() = status;
    }

    /// Mount a SCORM package
    ///
    /// Fetches the package metadata, then publishes the API objects on
    /// `chain` and starts saving progress. A metadata failure leaves the
    /// shell in a blocking error state with nothing running.
    pub async fn mount_scorm(
        config: Arc<BridgeConfig>,
        backend: Arc<B>,
        package_id: PackageId,
        chain: &FrameChain,
    ) -> Self {
        let mut shell = Self::empty(package_id);

        let launch_url = match backend
            .fetch_metadata(&shell.package_id)
            .await
            .and_then(|meta| meta.resolve_launch_url(&config.content_base))
        {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(
                    package = %shell.package_id,
                    error = %e,
                    "package could not be mounted"
                );
                shell.set_status(PlayerStatus::Error {
                    message: format!("Could not load the content package. {}", e),
                });
                return shell;
            }
        };

        let session = Session::from_config(shell.package_id.clone(), &config);
        let mut attachment = AttachmentManager::new(chain, surfaces(&session).to_vec());
        attachment.start(config.attach_interval());

        shell.progress = Some(ProgressBridge::start(
            backend,
            Arc::new(session.clone()),
            shell.package_id.clone(),
            config.progress_interval(),
        ));
        shell.attachment = Some(attachment);
        tracing::info!(
            package = %shell.package_id,
            session = %session.id(),
            %launch_url,
            "SCORM package mounted"
        );
        shell.session = Some(session);
        shell.set_status(PlayerStatus::Ready { launch_url });
        shell
    }

    /// Mount a cmi5 package
    ///
    /// The launch is negotiated in the background; [`settled`](Self::settled)
    /// waits for it. Must be called from within a tokio runtime. No progress
    /// bridge runs: cmi5 content reports to the LRS itself.
    pub fn mount_cmi5(
        config: Arc<BridgeConfig>,
        backend: Arc<B>,
        package_id: PackageId,
        launch_url: String,
        registration: Option<String>,
    ) -> Self {
        let mut shell = Self::empty(package_id.clone());
        let status = Arc::clone(&shell.status);

        shell.launch = Some(tokio::spawn(async move {
            let actor = Actor::from_learner(&config.learner);
            let mut composer = LaunchComposer::new();
            composer
                .init(backend.as_ref(), package_id.clone(), registration.as_deref(), actor)
                .await;

            let next = match composer.state() {
                LaunchState::Error(message) => PlayerStatus::Error {
                    message: message.clone(),
                },
                _ => match composer.build_launch_url(&launch_url, &config.lrs_endpoint) {
                    Ok(url) => PlayerStatus::Ready { launch_url: url },
                    Err(e) => PlayerStatus::Error { message: e.to_string() },
                },
            };

            let mut current = status.lock();
            if *current == PlayerStatus::Closed {
                tracing::debug!(
                    package = %package_id,
                    "launch response arrived after unmount, ignored"
                );
                return;
            }
            *current = next;
        }));
        shell
    }

    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    pub fn status(&self) -> PlayerStatus {
        self.status.lock().clone()
    }

    /// Wait for a pending cmi5 launch negotiation, then report the status
    pub async fn settled(&mut self) -> PlayerStatus {
        if let Some(task) = self.launch.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!(package = %self.package_id, error = %e, "launch task failed");
                }
            }
        }
        self.status()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn info(&self) -> Option<SessionInfo> {
        self.session.as_ref().map(Session::info)
    }

    pub fn attachment(&self) -> Option<&AttachmentManager> {
        self.attachment.as_ref()
    }

    /// Tear down everything this shell started
    ///
    /// Abandons any in-flight launch, stops the publish poll and retracts
    /// this session's API objects, then flushes progress one last time.
    /// Later calls do nothing.
    pub async fn unmount(&mut self) {
        {
            let mut status = self.status.lock();
            if *status == PlayerStatus::Closed {
                return;
            }
            *status = PlayerStatus::Closed;
        }

        if let Some(task) = self.launch.take() {
            task.abort();
        }
        if let Some(mut attachment) = self.attachment.take() {
            attachment.stop();
        }
        if let Some(mut progress) = self.progress.take() {
            progress.close().await;
        }
        tracing::info!(package = %self.package_id, "player unmounted");
    }
}

impl<B: Backend> Drop for PlayerShell<B> {
    // Synchronous teardown only; the final progress save needs `unmount`.
    fn drop(&mut self) {
        *self.status.lock() = PlayerStatus::Closed;
        if let Some(task) = self.launch.take() {
            task.abort();
        }
        if let Some(mut attachment) = self.attachment.take() {
            attachment.stop();
        }
        if let Some(mut progress) = self.progress.take() {
            progress.stop();
        }
    }
}
