//! cmi5 launch context and launch URL composition

use crate::cmi5::actor::Actor;
use crate::core::error::Result;
use crate::core::types::PackageId;
use serde::Serialize;
use url::form_urlencoded;

/// Registration value some upstream callers leak when the field is missing
const UNDEFINED_LITERAL: &str = "undefined";

/// Everything content needs to talk to the LRS for one attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchContext {
    pub package_id: PackageId,
    pub registration: String,
    pub activity_id: String,
    pub endpoint: String,
    pub fetch_url: String,
    pub actor: Actor,
}

/// Registration to use, falling back to the package id
///
/// A missing, empty, or literal `"undefined"` registration is replaced;
/// the literal never reaches the launch URL.
pub fn resolve_registration(package_id: &PackageId, registration: Option<&str>) -> String {
    match registration {
        Some(r) if !r.is_empty() && r != UNDEFINED_LITERAL => r.to_string(),
        other => {
            tracing::warn!(
                package = %package_id,
                registration = ?other,
                "registration missing or invalid, using package id"
            );
            package_id.to_string()
        }
    }
}

impl LaunchContext {
    pub fn new(
        package_id: PackageId,
        registration: Option<&str>,
        actor: Actor,
        endpoint: &str,
    ) -> Self {
        let registration = resolve_registration(&package_id, registration);
        Self {
            activity_id: package_id.to_string(),
            registration,
            endpoint: endpoint.to_string(),
            fetch_url: format!("{}/fetch", endpoint),
            actor,
            package_id,
        }
    }

    /// The normative launch parameters, in the order they are appended
    pub fn query_pairs(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            ("endpoint", self.endpoint.clone()),
            ("fetch", self.fetch_url.clone()),
            ("actor", self.actor.to_json()?),
            ("registration", self.registration.clone()),
            ("activityId", self.activity_id.clone()),
        ])
    }

    /// URL of an xAPI state document for this attempt's agent and registration
    pub fn state_url(&self, state_id: &str) -> Result<String> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("stateId", state_id)
            .append_pair("activityId", &self.activity_id)
            .append_pair("agent", &self.actor.to_json()?)
            .append_pair("registration", &self.registration)
            .finish();
        Ok(format!("{}/activities/state?{}", self.endpoint.trim_end_matches('/'), query))
    }

    /// Append the launch parameters to the package's launch URL
    ///
    /// Existing query parameters and any fragment are preserved. The base
    /// may be relative.
    pub fn launch_url(&self, base: &str) -> Result<String> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.query_pairs()? {
            query.append_pair(key, &value);
        }
        let query = query.finish();

        let (head, fragment) = match base.split_once('#') {
            Some((h, f)) => (h, Some(f)),
            None => (base, None),
        };
        let separator = match head.find('?') {
            None => "?",
            Some(_) if head.ends_with('?') || head.ends_with('&') => "",
            Some(_) => "&",
        };

        let mut url = format!("{}{}{}", head, separator, query);
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }
        Ok(url)
    }
}
