//! HTTP implementation of the backend collaborator
//!
//! Thin reqwest wrapper. Endpoint paths come from [`BridgeConfig`]; every
//! request carries the bearer token when one is configured.

use crate::backend::{Backend, InitLaunchRequest, PackageMetadata, ProgressUpdate};
use crate::cmi5::launch::LaunchContext;
use crate::cmi5::launch_data::{FetchTokenResponse, LaunchData, LAUNCH_DATA_STATE_ID};
use crate::core::config::BridgeConfig;
use crate::core::error::{BridgeError, Result};
use crate::core::types::PackageId;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

const XAPI_VERSION: &str = "1.0.3";

/// Async client for the host backend
pub struct HttpBackend {
    client: Client,
    config: BridgeConfig,
}

impl HttpBackend {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }

    /// Create a client from the environment-aware config loader
    ///
    /// Optional: RTE_BRIDGE_API_BASE, RTE_BRIDGE_AUTH_TOKEN and the other
    /// `RTE_BRIDGE_*` overrides.
    pub fn from_env() -> Result<Self> {
        Self::new(BridgeConfig::load(None)?)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Body text of a failed response, for error messages
    async fn failure(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        }
    }

    /// Ask the cmi5 fetch endpoint for an auth token
    pub async fn fetch_auth_token(&self, fetch_url: &str) -> Result<String> {
        let response = self
            .client
            .post(fetch_url)
            .send()
            .await
            .map_err(|e| BridgeError::LaunchInit(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::LaunchInit(Self::failure(response).await));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::LaunchInit(e.to_string()))?;
        FetchTokenResponse::parse(&body)?.into_token()
    }

    /// Read the `LMS.LaunchData` state document with a fetched auth token
    ///
    /// A missing document yields the defaults the LMS would have seeded.
    pub async fn fetch_launch_data(
        &self,
        context: &LaunchContext,
        token: &str,
    ) -> Result<LaunchData> {
        let url = context.state_url(LAUNCH_DATA_STATE_ID)?;
        tracing::debug!(%url, "reading launch data");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Basic {}", token))
            .header("X-Experience-API-Version", XAPI_VERSION)
            .send()
            .await
            .map_err(|e| BridgeError::LaunchInit(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(
                registration = %context.registration,
                "launch data missing, using defaults"
            );
            return Ok(LaunchData::default());
        }
        if !response.status().is_success() {
            return Err(BridgeError::LaunchInit(Self::failure(response).await));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::LaunchInit(e.to_string()))?;
        LaunchData::parse(&body)
    }
}

impl Backend for HttpBackend {
    async fn init_launch(&self, request: &InitLaunchRequest) -> Result<()> {
        let url = self
            .config
            .endpoint_url(&self.config.init_launch_path, request.package_id.as_str());
        tracing::info!(%url, package = %request.package_id, "negotiating cmi5 launch");

        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| BridgeError::LaunchInit(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::LaunchInit(Self::failure(response).await));
        }
        Ok(())
    }

    async fn save_progress(&self, package_id: &PackageId, update: ProgressUpdate) -> Result<()> {
        let url = self
            .config
            .endpoint_url(&self.config.progress_path, package_id.as_str());

        let response = self
            .authorize(self.client.post(&url))
            .json(&update)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BridgeError::Http(Self::failure(response).await));
        }
        Ok(())
    }

    async fn fetch_metadata(&self, package_id: &PackageId) -> Result<PackageMetadata> {
        let url = self
            .config
            .endpoint_url(&self.config.metadata_path, package_id.as_str());

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| BridgeError::MetadataFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::MetadataFetch(Self::failure(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| BridgeError::MetadataFetch(e.to_string()))
    }
}
