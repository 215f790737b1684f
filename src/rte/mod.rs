//! SCORM run-time environment: state machine, adapters, and API surfaces

pub mod adapter;
pub mod api;
pub mod errors;
pub mod session;
pub mod state;

pub use adapter::AdapterCore;
pub use api::{surfaces, ApiObject, ApiSurface, Method, Scorm12Api, Scorm2004Api};
pub use session::{Session, SessionInfo};
pub use state::{Refusal, RteCall, RteState};
