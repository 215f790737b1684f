//! RTE adapter core for one SCORM version
//!
//! Owns the lifecycle state, the data store, and the last error. Every
//! method returns a plain value; failures are recorded as error codes so
//! content that only checks `GetLastError` keeps working.

use crate::cmi::schema::{self, Violation};
use crate::cmi::store::DataStore;
use crate::core::types::ScormVersion;
use crate::rte::errors::{self, NO_ERROR};
use crate::rte::state::{RteCall, RteState};

#[derive(Debug, Clone)]
pub struct AdapterCore {
    version: ScormVersion,
    state: RteState,
    store: DataStore,
    last_error: u16,
    /// Detail for the most recent failure, served by GetDiagnostic
    last_diagnostic: Option<String>,
    commits: u64,
}

impl AdapterCore {
    pub fn new(version: ScormVersion) -> Self {
        Self {
            version,
            state: RteState::NotInitialized,
            store: DataStore::new(version),
            last_error: NO_ERROR,
            last_diagnostic: None,
            commits: 0,
        }
    }

    pub fn version(&self) -> ScormVersion {
        self.version
    }

    pub fn state(&self) -> RteState {
        self.state
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Host-side seeding; bypasses state and schema checks
    pub fn store_mut(&mut self) -> &mut DataStore {
        &mut self.store
    }

    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    pub fn initialize(&mut self, param: &str) -> bool {
        self.lifecycle(RteCall::Initialize, param)
    }

    pub fn terminate(&mut self, param: &str) -> bool {
        self.lifecycle(RteCall::Terminate, param)
    }

    pub fn commit(&mut self, param: &str) -> bool {
        if !self.lifecycle(RteCall::Commit, param) {
            return false;
        }
        self.commits += 1;
        tracing::debug!(version = %self.version, commits = self.commits, "commit point");
        true
    }

    pub fn get_value(&mut self, element: &str) -> String {
        if !self.admit(RteCall::GetValue) {
            return String::new();
        }
        if element.is_empty() {
            self.fail(
                errors::argument_code(self.version, RteCall::GetValue),
                "GetValue requires an element name",
            );
            return String::new();
        }

        if let Some(def) = schema::lookup(self.version, element) {
            if !def.is_readable() {
                self.fail(
                    errors::write_only_code(self.version),
                    format!("{} is write only", element),
                );
                return String::new();
            }
            self.clear();
            if let Some(array) = element.strip_suffix("._count") {
                return self.store.count(array).to_string();
            }
            return self.store.get(element).to_string();
        }

        if let Some(code) = self.unsupported_keyword(element) {
            self.fail(code, format!("{} is not a valid keyword here", element));
            return String::new();
        }

        // Unknown elements read as empty without raising an error
        self.clear();
        self.store.get(element).to_string()
    }

    pub fn set_value(&mut self, element: &str, value: &str) -> bool {
        if !self.admit(RteCall::SetValue) {
            return false;
        }
        if element.is_empty() {
            self.fail(
                errors::argument_code(self.version, RteCall::SetValue),
                "SetValue requires an element name",
            );
            return false;
        }

        if let Err(violation) = self.check_write(element, value) {
            self.fail(
                errors::violation_code(self.version, violation),
                format!("{} rejected for {}: {:?}", value, element, violation),
            );
            tracing::debug!(version = %self.version, element, ?violation, "set refused");
            return false;
        }

        self.store.set(element, value);
        self.clear();
        true
    }

    pub fn last_error(&self) -> u16 {
        self.last_error
    }

    pub fn error_string(&self, code: &str) -> String {
        errors::error_string(self.version, code).to_string()
    }

    pub fn diagnostic(&self, code: &str) -> String {
        let asks_current = code.is_empty() || code.trim().parse::<u16>() == Ok(self.last_error);
        match (&self.last_diagnostic, asks_current) {
            (Some(detail), true) => detail.clone(),
            _ => errors::diagnostic(self.version, code).to_string(),
        }
    }

    /// Record an error raised outside the adapter, e.g. a protocol lock
    pub fn fail(&mut self, code: u16, detail: impl Into<String>) {
        self.last_error = code;
        self.last_diagnostic = Some(detail.into());
    }

    fn clear(&mut self) {
        self.last_error = NO_ERROR;
        self.last_diagnostic = None;
    }

    fn lifecycle(&mut self, call: RteCall, param: &str) -> bool {
        if !param.is_empty() {
            self.fail(
                errors::argument_code(self.version, call),
                format!("{:?} expects an empty string argument", call),
            );
            return false;
        }
        if !self.admit(call) {
            return false;
        }
        self.clear();
        true
    }

    /// Run the call through the transition table, recording any refusal
    fn admit(&mut self, call: RteCall) -> bool {
        match self.state.apply(call) {
            Ok(next) => {
                if next != self.state {
                    tracing::info!(
                        version = %self.version,
                        from = ?self.state,
                        to = ?next,
                        "rte transition"
                    );
                }
                self.state = next;
                true
            }
            Err(refusal) => {
                self.fail(
                    errors::refusal_code(self.version, call, refusal),
                    format!("{:?} refused: {:?}", call, refusal),
                );
                false
            }
        }
    }

    fn check_write(&self, element: &str, value: &str) -> Result<(), Violation> {
        if !schema::in_namespace(self.version, element) {
            return Err(Violation::Undefined);
        }

        match schema::lookup(self.version, element) {
            Some(def) if def.is_keyword() => return Err(Violation::Keyword),
            Some(def) if !def.is_writable() => return Err(Violation::ReadOnly),
            Some(def) => schema::check_value(&def.kind, value)?,
            None => {
                let leaf = element.rsplit('.').next().unwrap_or("");
                if leaf.starts_with('_') {
                    return Err(Violation::Keyword);
                }
            }
        }

        if let Some((array, index)) = schema::array_index(element) {
            if index > self.store.count(array) {
                return Err(Violation::IndexOutOfOrder);
            }
        }

        Ok(())
    }

    fn unsupported_keyword(&self, element: &str) -> Option<u16> {
        let code = match self.version {
            ScormVersion::V12 if element.ends_with("._children") => 202,
            ScormVersion::V12 if element.ends_with("._count") => 203,
            ScormVersion::V2004
                if element.ends_with("._children") || element.ends_with("._count") =>
            {
                301
            }
            _ => return None,
        };
        Some(code)
    }
}
