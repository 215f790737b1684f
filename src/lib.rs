//! RTE Bridge - SCORM 1.2 / SCORM 2004 / cmi5 runtime for hosted learning content

pub mod attach;
pub mod backend;
pub mod calllog;
pub mod cmi;
pub mod cmi5;
pub mod core;
pub mod player;
pub mod progress;
pub mod rte;
