//! One mounted player's SCORM session
//!
//! Holds an adapter per version. Whichever Initialize variant content calls
//! first binds the session to that version; the other surface refuses to
//! initialize from then on.

use crate::calllog::{CallLog, CallLogEntry, DEFAULT_CAPACITY};
use crate::cmi::store::DataStore;
use crate::core::config::BridgeConfig;
use crate::core::error::Result;
use crate::core::types::{PackageId, Protocol, ScormVersion, SessionId};
use crate::rte::adapter::AdapterCore;
use crate::rte::api::Method;
use crate::rte::errors::GENERAL_EXCEPTION;
use crate::rte::state::RteState;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
struct SessionState {
    v12: AdapterCore,
    v2004: AdapterCore,
    active: Option<ScormVersion>,
    log: CallLog,
}

impl SessionState {
    fn adapter(&mut self, version: ScormVersion) -> &mut AdapterCore {
        match version {
            ScormVersion::V12 => &mut self.v12,
            ScormVersion::V2004 => &mut self.v2004,
        }
    }

    fn adapter_ref(&self, version: ScormVersion) -> &AdapterCore {
        match version {
            ScormVersion::V12 => &self.v12,
            ScormVersion::V2004 => &self.v2004,
        }
    }
}

/// Summary of a session, as reported to the player shell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub package_id: PackageId,
    pub protocol: Option<Protocol>,
    pub state: RteState,
    pub last_error_code: u16,
}

/// Cheaply cloneable handle shared by both API surfaces and the player
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    package_id: PackageId,
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(package_id: PackageId) -> Self {
        Self::with_capacity(package_id, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(package_id: PackageId, log_capacity: usize) -> Self {
        Self {
            id: SessionId::new(),
            package_id,
            inner: Arc::new(Mutex::new(SessionState {
                v12: AdapterCore::new(ScormVersion::V12),
                v2004: AdapterCore::new(ScormVersion::V2004),
                active: None,
                log: CallLog::new(log_capacity),
            })),
        }
    }

    /// Session seeded with the configured learner identity
    pub fn from_config(package_id: PackageId, config: &BridgeConfig) -> Self {
        let session = Self::with_capacity(package_id, config.call_log_capacity);
        {
            let mut state = session.inner.lock();
            for version in ScormVersion::ALL {
                state
                    .adapter(version)
                    .store_mut()
                    .seed_learner(&config.learner.id, &config.learner.name);
            }
        }
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    /// Route a call by normative method name to the version's adapter
    pub fn call(&self, version: ScormVersion, method: &str, args: &[&str]) -> String {
        let mut state = self.inner.lock();
        state.log.record(version, method, args);

        let arg = |i: usize| args.get(i).copied().unwrap_or("");
        let Some(m) = Method::from_name(version, method) else {
            state
                .adapter(version)
                .fail(GENERAL_EXCEPTION, format!("unknown method {}", method));
            tracing::warn!(session = %self.id, %version, method, "unknown API method");
            return String::new();
        };

        if m == Method::Initialize {
            if let Some(active) = state.active.filter(|a| *a != version) {
                state.adapter(version).fail(
                    GENERAL_EXCEPTION,
                    format!("session already running SCORM {}", active),
                );
                tracing::warn!(session = %self.id, %version, %active, "second protocol refused");
                return "false".into();
            }
        }

        let adapter = state.adapter(version);
        let result = match m {
            Method::Initialize => flag(adapter.initialize(arg(0))),
            Method::Terminate => flag(adapter.terminate(arg(0))),
            Method::GetValue => adapter.get_value(arg(0)),
            Method::SetValue => flag(adapter.set_value(arg(0), arg(1))),
            Method::Commit => flag(adapter.commit(arg(0))),
            Method::GetLastError => adapter.last_error().to_string(),
            Method::GetErrorString => adapter.error_string(arg(0)),
            Method::GetDiagnostic => adapter.diagnostic(arg(0)),
        };
        let error = adapter.last_error();

        if m == Method::Initialize && result == "true" {
            state.active = Some(version);
            tracing::info!(
                session = %self.id,
                package = %self.package_id,
                %version,
                "content initialized"
            );
        }

        tracing::debug!(session = %self.id, %version, method, ?args, %result, error, "api call");
        result
    }

    /// Version bound by the first successful Initialize
    pub fn active_version(&self) -> Option<ScormVersion> {
        self.inner.lock().active
    }

    pub fn state(&self) -> RteState {
        let state = self.inner.lock();
        state
            .active
            .map(|v| state.adapter_ref(v).state())
            .unwrap_or(RteState::NotInitialized)
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn info(&self) -> SessionInfo {
        let state = self.inner.lock();
        let adapter = state.active.map(|v| state.adapter_ref(v));
        SessionInfo {
            session_id: self.id,
            package_id: self.package_id.clone(),
            protocol: state.active.map(Protocol::from),
            state: adapter.map(|a| a.state()).unwrap_or_default(),
            last_error_code: adapter.map(|a| a.last_error()).unwrap_or(0),
        }
    }

    /// Copy of a version's data store
    pub fn store(&self, version: ScormVersion) -> DataStore {
        self.inner.lock().adapter_ref(version).store().clone()
    }

    /// Copy of the active version's data store
    pub fn active_store(&self) -> Option<DataStore> {
        let state = self.inner.lock();
        state.active.map(|v| state.adapter_ref(v).store().clone())
    }

    pub fn last_error(&self, version: ScormVersion) -> u16 {
        self.inner.lock().adapter_ref(version).last_error()
    }

    pub fn call_log(&self) -> Vec<CallLogEntry> {
        self.inner.lock().log.to_vec()
    }

    pub fn clear_call_log(&self) {
        self.inner.lock().log.clear();
    }

    pub fn export_call_log(&self) -> Result<String> {
        self.inner.lock().log.export_json()
    }

    pub fn export_call_log_to(&self, path: &Path) -> Result<()> {
        self.inner.lock().log.export_to_file(path)
    }
}

fn flag(ok: bool) -> String {
    if ok { "true" } else { "false" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_initialize_binds_version() {
        let session = Session::new("p1".into());
        assert_eq!(session.call(ScormVersion::V2004, "Initialize", &[""]), "true");
        assert_eq!(session.active_version(), Some(ScormVersion::V2004));

        assert_eq!(session.call(ScormVersion::V12, "LMSInitialize", &[""]), "false");
        assert_eq!(session.call(ScormVersion::V12, "LMSGetLastError", &[]), "101");
        assert_eq!(session.active_version(), Some(ScormVersion::V2004));
        assert_eq!(session.info().protocol, Some(Protocol::Scorm2004));
    }

    #[test]
    fn test_failed_initialize_does_not_bind() {
        let session = Session::new("p1".into());
        assert_eq!(session.call(ScormVersion::V12, "LMSInitialize", &["x"]), "false");
        assert_eq!(session.active_version(), None);
        assert_eq!(session.call(ScormVersion::V2004, "Initialize", &[""]), "true");
        assert_eq!(session.active_version(), Some(ScormVersion::V2004));
    }

    #[test]
    fn test_unknown_method() {
        let session = Session::new("p1".into());
        assert_eq!(session.call(ScormVersion::V12, "LMSDoSomething", &[]), "");
        assert_eq!(session.last_error(ScormVersion::V12), 101);
    }

    #[test]
    fn test_every_call_logged() {
        let session = Session::new("p1".into());
        session.call(ScormVersion::V12, "LMSInitialize", &[""]);
        session.call(ScormVersion::V12, "LMSSetValue", &["cmi.core.lesson_location", "3"]);
        session.call(ScormVersion::V12, "Bogus", &[]);
        let log = session.call_log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].method, "LMSSetValue");
        assert_eq!(log[1].args, vec!["cmi.core.lesson_location", "3"]);
        session.clear_call_log();
        assert!(session.call_log().is_empty());
    }

    #[test]
    fn test_from_config_seeds_learner() {
        let mut config = BridgeConfig::default();
        config.learner.id = "u-9".into();
        config.learner.name = "Doe, Jane".into();
        let session = Session::from_config("p1".into(), &config);
        session.call(ScormVersion::V12, "LMSInitialize", &[""]);
        assert_eq!(
            session.call(ScormVersion::V12, "LMSGetValue", &["cmi.core.student_id"]),
            "u-9"
        );
        assert_eq!(session.store(ScormVersion::V2004).get("cmi.learner_name"), "Doe, Jane");
    }
}
