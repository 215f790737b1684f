//! Static SCORM error-code tables
//!
//! Codes are looked up per version; the adapter never raises, it records one
//! of these codes and returns a sentinel.

use crate::cmi::schema::Violation;
use crate::core::types::ScormVersion;
use crate::rte::state::{Refusal, RteCall};

pub const NO_ERROR: u16 = 0;
pub const GENERAL_EXCEPTION: u16 = 101;

/// `(code, error string, diagnostic)`
type Row = (u16, &'static str, &'static str);

static SCORM12_CODES: &[Row] = &[
    (0, "No error", "No error occurred"),
    (101, "General exception", "An unexpected condition prevented the call from completing"),
    (201, "Invalid argument error", "The argument passed to the call was not valid"),
    (202, "Element cannot have children", "_children was requested on an element without children"),
    (
        203,
        "Element not an array - cannot have count",
        "_count was requested on an element that is not an array",
    ),
    (301, "Not initialized", "LMSInitialize has not been called successfully"),
    (401, "Not implemented error", "The element is not supported by this LMS"),
    (402, "Invalid set value, element is a keyword", "Keyword elements cannot be set"),
    (403, "Element is read only", "The element cannot be written"),
    (404, "Element is write only", "The element cannot be read"),
    (405, "Incorrect Data Type", "The value does not match the element's data type"),
];

static SCORM2004_CODES: &[Row] = &[
    (0, "No Error", "No error occurred"),
    (101, "General Exception", "An unexpected condition prevented the call from completing"),
    (102, "General Initialization Failure", "Initialize could not complete"),
    (103, "Already Initialized", "Initialize was called after a successful Initialize"),
    (104, "Content Instance Terminated", "Initialize was called after Terminate"),
    (111, "General Termination Failure", "Terminate could not complete"),
    (112, "Termination Before Initialization", "Terminate was called before Initialize"),
    (113, "Termination After Termination", "Terminate was called after Terminate"),
    (122, "Retrieve Data Before Initialization", "GetValue was called before Initialize"),
    (123, "Retrieve Data After Termination", "GetValue was called after Terminate"),
    (132, "Store Data Before Initialization", "SetValue was called before Initialize"),
    (133, "Store Data After Termination", "SetValue was called after Terminate"),
    (142, "Commit Before Initialization", "Commit was called before Initialize"),
    (143, "Commit After Termination", "Commit was called after Terminate"),
    (201, "General Argument Error", "The argument passed to the call was not valid"),
    (301, "General Get Failure", "GetValue could not complete"),
    (351, "General Set Failure", "SetValue could not complete"),
    (391, "General Commit Failure", "Commit could not complete"),
    (401, "Undefined Data Model Element", "The element is not part of the data model"),
    (402, "Unimplemented Data Model Element", "The element is not supported by this LMS"),
    (403, "Data Model Element Value Not Initialized", "The element has no value yet"),
    (404, "Data Model Element Is Read Only", "The element cannot be written"),
    (405, "Data Model Element Is Write Only", "The element cannot be read"),
    (406, "Data Model Element Type Mismatch", "The value does not match the element's data type"),
    (407, "Data Model Element Value Out Of Range", "The value is outside the element's range"),
    (408, "Data Model Dependency Not Established", "A prerequisite element has not been set"),
];

fn table(version: ScormVersion) -> &'static [Row] {
    match version {
        ScormVersion::V12 => SCORM12_CODES,
        ScormVersion::V2004 => SCORM2004_CODES,
    }
}

fn row(version: ScormVersion, code: &str) -> Option<&'static Row> {
    let code: u16 = code.trim().parse().ok()?;
    table(version).iter().find(|(c, _, _)| *c == code)
}

/// Short description for `code`, `""` if the table has no such code
pub fn error_string(version: ScormVersion, code: &str) -> &'static str {
    row(version, code).map(|(_, s, _)| *s).unwrap_or("")
}

/// Longer description for `code`, `""` if the table has no such code
pub fn diagnostic(version: ScormVersion, code: &str) -> &'static str {
    row(version, code).map(|(_, _, d)| *d).unwrap_or("")
}

pub fn is_known(version: ScormVersion, code: u16) -> bool {
    table(version).iter().any(|(c, _, _)| *c == code)
}

/// Code for a call refused by the lifecycle state
pub fn refusal_code(version: ScormVersion, call: RteCall, refusal: Refusal) -> u16 {
    match version {
        ScormVersion::V12 => match refusal {
            Refusal::NotInitialized => 301,
            Refusal::AlreadyInitialized => GENERAL_EXCEPTION,
            // 1.2 has no "after termination" family
            Refusal::AlreadyTerminated => match call {
                RteCall::Initialize | RteCall::Terminate => GENERAL_EXCEPTION,
                _ => 301,
            },
        },
        ScormVersion::V2004 => match (call, refusal) {
            (RteCall::Initialize, Refusal::AlreadyInitialized) => 103,
            (RteCall::Initialize, _) => 104,
            (RteCall::Terminate, Refusal::NotInitialized) => 112,
            (RteCall::Terminate, _) => 113,
            (RteCall::GetValue, Refusal::NotInitialized) => 122,
            (RteCall::GetValue, _) => 123,
            (RteCall::SetValue, Refusal::NotInitialized) => 132,
            (RteCall::SetValue, _) => 133,
            (RteCall::Commit, Refusal::NotInitialized) => 142,
            (RteCall::Commit, _) => 143,
        },
    }
}

/// Code for a SetValue refused by the schema
pub fn violation_code(version: ScormVersion, violation: Violation) -> u16 {
    match version {
        ScormVersion::V12 => match violation {
            Violation::ReadOnly => 403,
            Violation::Keyword => 402,
            Violation::TypeMismatch | Violation::OutOfRange => 405,
            Violation::Undefined | Violation::IndexOutOfOrder => 201,
        },
        ScormVersion::V2004 => match violation {
            Violation::ReadOnly | Violation::Keyword => 404,
            Violation::TypeMismatch => 406,
            Violation::OutOfRange => 407,
            Violation::Undefined => 401,
            Violation::IndexOutOfOrder => 351,
        },
    }
}

/// Code for reading a write-only element
pub fn write_only_code(version: ScormVersion) -> u16 {
    match version {
        ScormVersion::V12 => 404,
        ScormVersion::V2004 => 405,
    }
}

/// Code for a malformed argument (non-empty Initialize parameter, blank element name)
pub fn argument_code(version: ScormVersion, call: RteCall) -> u16 {
    match (version, call) {
        (ScormVersion::V2004, RteCall::GetValue) => 301,
        (ScormVersion::V2004, RteCall::SetValue) => 351,
        _ => 201,
    }
}
