//! The two version-specific API surfaces content discovers
//!
//! `Scorm12Api` is published under `API` and `Scorm2004Api` under
//! `API_1484_11`. Both forward to the same [`Session`], which routes the call
//! to the adapter for that version and records it in the call log.

use crate::core::types::ScormVersion;
use crate::rte::session::Session;
use std::fmt;
use std::sync::Arc;

/// Version-neutral name of an API method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Initialize,
    Terminate,
    GetValue,
    SetValue,
    Commit,
    GetLastError,
    GetErrorString,
    GetDiagnostic,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Initialize,
        Method::Terminate,
        Method::GetValue,
        Method::SetValue,
        Method::Commit,
        Method::GetLastError,
        Method::GetErrorString,
        Method::GetDiagnostic,
    ];

    /// Normative method name on the given surface
    pub fn name(self, version: ScormVersion) -> &'static str {
        match (version, self) {
            (ScormVersion::V12, Method::Initialize) => "LMSInitialize",
            (ScormVersion::V12, Method::Terminate) => "LMSFinish",
            (ScormVersion::V12, Method::GetValue) => "LMSGetValue",
            (ScormVersion::V12, Method::SetValue) => "LMSSetValue",
            (ScormVersion::V12, Method::Commit) => "LMSCommit",
            (ScormVersion::V12, Method::GetLastError) => "LMSGetLastError",
            (ScormVersion::V12, Method::GetErrorString) => "LMSGetErrorString",
            (ScormVersion::V12, Method::GetDiagnostic) => "LMSGetDiagnostic",
            (ScormVersion::V2004, Method::Initialize) => "Initialize",
            (ScormVersion::V2004, Method::Terminate) => "Terminate",
            (ScormVersion::V2004, Method::GetValue) => "GetValue",
            (ScormVersion::V2004, Method::SetValue) => "SetValue",
            (ScormVersion::V2004, Method::Commit) => "Commit",
            (ScormVersion::V2004, Method::GetLastError) => "GetLastError",
            (ScormVersion::V2004, Method::GetErrorString) => "GetErrorString",
            (ScormVersion::V2004, Method::GetDiagnostic) => "GetDiagnostic",
        }
    }

    pub fn from_name(version: ScormVersion, name: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.name(version) == name)
    }
}

/// An API object that can be published into a frame slot
pub trait ApiSurface: Send + Sync + fmt::Debug {
    fn version(&self) -> ScormVersion;

    /// Call a method by its normative name, the way content does
    fn invoke(&self, method: &str, args: &[&str]) -> String;

    /// Global key this surface is published under
    fn key(&self) -> &'static str {
        self.version().api_key()
    }
}

/// Shared handle to a published API object; identity is the allocation
pub type ApiObject = Arc<dyn ApiSurface>;

/// Identity comparison between two published objects
pub fn same_object(a: &ApiObject, b: &ApiObject) -> bool {
    Arc::ptr_eq(a, b)
}

/// SCORM 1.2 surface (`API`)
#[derive(Debug, Clone)]
pub struct Scorm12Api {
    session: Session,
}

impl Scorm12Api {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    fn call(&self, method: Method, args: &[&str]) -> String {
        self.session
            .call(ScormVersion::V12, method.name(ScormVersion::V12), args)
    }

    pub fn lms_initialize(&self, param: &str) -> String {
        self.call(Method::Initialize, &[param])
    }

    pub fn lms_finish(&self, param: &str) -> String {
        self.call(Method::Terminate, &[param])
    }

    pub fn lms_get_value(&self, element: &str) -> String {
        self.call(Method::GetValue, &[element])
    }

    pub fn lms_set_value(&self, element: &str, value: &str) -> String {
        self.call(Method::SetValue, &[element, value])
    }

    pub fn lms_commit(&self, param: &str) -> String {
        self.call(Method::Commit, &[param])
    }

    pub fn lms_get_last_error(&self) -> String {
        self.call(Method::GetLastError, &[])
    }

    pub fn lms_get_error_string(&self, code: &str) -> String {
        self.call(Method::GetErrorString, &[code])
    }

    pub fn lms_get_diagnostic(&self, code: &str) -> String {
        self.call(Method::GetDiagnostic, &[code])
    }
}

impl ApiSurface for Scorm12Api {
    fn version(&self) -> ScormVersion {
        ScormVersion::V12
    }

    fn invoke(&self, method: &str, args: &[&str]) -> String {
        self.session.call(ScormVersion::V12, method, args)
    }
}

/// SCORM 2004 surface (`API_1484_11`)
#[derive(Debug, Clone)]
pub struct Scorm2004Api {
    session: Session,
}

impl Scorm2004Api {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    fn call(&self, method: Method, args: &[&str]) -> String {
        self.session
            .call(ScormVersion::V2004, method.name(ScormVersion::V2004), args)
    }

    pub fn initialize(&self, param: &str) -> String {
        self.call(Method::Initialize, &[param])
    }

    pub fn terminate(&self, param: &str) -> String {
        self.call(Method::Terminate, &[param])
    }

    pub fn get_value(&self, element: &str) -> String {
        self.call(Method::GetValue, &[element])
    }

    pub fn set_value(&self, element: &str, value: &str) -> String {
        self.call(Method::SetValue, &[element, value])
    }

    pub fn commit(&self, param: &str) -> String {
        self.call(Method::Commit, &[param])
    }

    pub fn get_last_error(&self) -> String {
        self.call(Method::GetLastError, &[])
    }

    pub fn get_error_string(&self, code: &str) -> String {
        self.call(Method::GetErrorString, &[code])
    }

    pub fn get_diagnostic(&self, code: &str) -> String {
        self.call(Method::GetDiagnostic, &[code])
    }
}

impl ApiSurface for Scorm2004Api {
    fn version(&self) -> ScormVersion {
        ScormVersion::V2004
    }

    fn invoke(&self, method: &str, args: &[&str]) -> String {
        self.session.call(ScormVersion::V2004, method, args)
    }
}

/// Build both surfaces for a session, as publishable objects
pub fn surfaces(session: &Session) -> [ApiObject; 2] {
    [
        Arc::new(Scorm12Api::new(session.clone())),
        Arc::new(Scorm2004Api::new(session.clone())),
    ]
}
