//! Host backend collaborator interface
//!
//! The bridge never stores progress or statements itself. It calls out to
//! the host through [`Backend`]: launch negotiation, progress saves, and
//! package metadata.

pub mod client;
pub mod memory;

pub use client::HttpBackend;
pub use memory::MemoryBackend;

use crate::cmi5::actor::Actor;
use crate::core::error::{BridgeError, Result};
use crate::core::types::PackageId;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Body of `POST /cmi5/init-launch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitLaunchRequest {
    pub package_id: PackageId,
    pub registration: String,
    pub actor: Actor,
}

/// Body of a progress save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Unix time in milliseconds
    pub timestamp: i64,
    /// 0-100
    pub percentage: u8,
}

/// What the backend knows about an uploaded package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageMetadata {
    pub title: String,
    #[serde(alias = "url")]
    pub launch_url: Option<String>,
    pub launch_file: Option<String>,
    pub registration: Option<String>,
    pub package_id: Option<String>,
    pub directory_path: Option<String>,
}

impl PackageMetadata {
    /// Launch URL, preferring an explicit `launchUrl`
    ///
    /// Otherwise `content_base + directoryPath + launchFile`.
    pub fn resolve_launch_url(&self, content_base: &str) -> Result<String> {
        if let Some(url) = self.launch_url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }
        match (self.directory_path.as_deref(), self.launch_file.as_deref()) {
            (Some(dir), Some(file)) if !file.is_empty() => {
                Ok(format!("{}{}{}", content_base, dir, file))
            }
            _ => Err(BridgeError::MetadataFetch(format!(
                "package '{}' has no launch file",
                self.title
            ))),
        }
    }
}

pub trait Backend: Send + Sync + 'static {
    /// Negotiate a cmi5 launch; any non-success is a launch failure
    fn init_launch(&self, request: &InitLaunchRequest) -> impl Future<Output = Result<()>> + Send;

    fn save_progress(
        &self,
        package_id: &PackageId,
        update: ProgressUpdate,
    ) -> impl Future<Output = Result<()>> + Send;

    fn fetch_metadata(
        &self,
        package_id: &PackageId,
    ) -> impl Future<Output = Result<PackageMetadata>> + Send;
}
