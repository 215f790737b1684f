//! CMI data-model schema tables
//!
//! One table per SCORM version. Each row names an element path (array
//! indices written as `n`), its access mode, the kind of value it accepts,
//! and the value the store is seeded with.

use crate::core::types::ScormVersion;

/// Who may read or write an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Constraint applied to values at SetValue time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    /// Data-model keyword (`_children`, `_count`, `_version`)
    Keyword,
    Text { max_len: usize },
    Identifier { max_len: usize },
    Vocabulary(&'static [&'static str]),
    /// A vocabulary token or a decimal number (interaction results)
    VocabularyOrNumber(&'static [&'static str]),
    Decimal { min: Option<f64>, max: Option<f64>, blank_ok: bool },
    Integer { min: i64, max: i64 },
    /// SCORM 1.2 CMITimespan, `HHHH:MM:SS.SS`
    Timespan,
    /// SCORM 1.2 CMITime, `HH:MM:SS.SS`
    TimeOfDay,
    /// SCORM 2004 ISO 8601 duration, `P[nY][nM][nD][T[nH][nM][nS]]`
    Duration,
}

/// One row of a schema table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementDef {
    pub path: &'static str,
    pub access: Access,
    pub kind: ValueKind,
    /// Seeded value; `None` for array members and computed keywords
    pub default: Option<&'static str>,
}

impl ElementDef {
    pub fn is_readable(&self) -> bool {
        self.access != Access::WriteOnly
    }

    pub fn is_writable(&self) -> bool {
        self.access != Access::ReadOnly
    }

    pub fn is_keyword(&self) -> bool {
        self.kind == ValueKind::Keyword
    }

    /// Array member rows carry an `n` index segment
    pub fn is_array_member(&self) -> bool {
        self.path.split('.').any(|s| s == "n")
    }
}

/// Reason a SetValue was refused by the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    ReadOnly,
    Keyword,
    TypeMismatch,
    OutOfRange,
    /// Element lies outside the version's namespace
    Undefined,
    /// Array index skips past the next free slot
    IndexOutOfOrder,
}

const STATUS_12: &[&str] =
    &["passed", "completed", "failed", "incomplete", "browsed", "not attempted"];
const STATUS_12_WRITABLE: &[&str] = &["passed", "completed", "failed", "incomplete", "browsed"];
const EXIT_12: &[&str] = &["time-out", "suspend", "logout", ""];
const INTERACTION_TYPES_12: &[&str] = &[
    "true-false", "choice", "fill-in", "matching", "performance", "sequencing", "likert", "numeric",
];
const RESULTS_12: &[&str] = &["correct", "wrong", "unanticipated", "neutral"];

const COMPLETION_2004: &[&str] = &["completed", "incomplete", "not attempted", "unknown"];
const SUCCESS_2004: &[&str] = &["passed", "failed", "unknown"];
const EXIT_2004: &[&str] = &["time-out", "suspend", "logout", "normal", ""];
const INTERACTION_TYPES_2004: &[&str] = &[
    "true-false", "choice", "fill-in", "long-fill-in", "matching", "performance", "sequencing",
    "likert", "numeric", "other",
];
const RESULTS_2004: &[&str] = &["correct", "incorrect", "unanticipated", "neutral"];
const CAPTIONING_2004: &[&str] = &["-1", "0", "1"];
const NON_NEGATIVE: ValueKind = ValueKind::Decimal { min: Some(0.0), max: None, blank_ok: false };

const fn el(
    path: &'static str,
    access: Access,
    kind: ValueKind,
    default: Option<&'static str>,
) -> ElementDef {
    ElementDef { path, access, kind, default }
}

const fn ro(path: &'static str, default: &'static str) -> ElementDef {
    el(path, Access::ReadOnly, ValueKind::Text { max_len: 4096 }, Some(default))
}

const fn keyword(path: &'static str, default: Option<&'static str>) -> ElementDef {
    el(path, Access::ReadOnly, ValueKind::Keyword, default)
}

const SCORE_12: ValueKind = ValueKind::Decimal { min: Some(0.0), max: Some(100.0), blank_ok: true };
const REAL: ValueKind = ValueKind::Decimal { min: None, max: None, blank_ok: false };
const SCALED: ValueKind = ValueKind::Decimal { min: Some(-1.0), max: Some(1.0), blank_ok: false };
const UNIT: ValueKind = ValueKind::Decimal { min: Some(0.0), max: Some(1.0), blank_ok: false };

use Access::{ReadWrite as RW, WriteOnly as WO};

/// SCORM 1.2 data model
pub static SCORM12_ELEMENTS: &[ElementDef] = &[
    keyword(
        "cmi.core._children",
        Some(concat!(
            "student_id,student_name,lesson_location,credit,lesson_status,entry,",
            "score,total_time,lesson_mode,exit,session_time"
        )),
    ),
    ro("cmi.core.student_id", ""),
    ro("cmi.core.student_name", ""),
    el("cmi.core.lesson_location", RW, ValueKind::Text { max_len: 255 }, Some("")),
    ro("cmi.core.credit", "credit"),
    el(
        "cmi.core.lesson_status",
        RW,
        ValueKind::Vocabulary(STATUS_12_WRITABLE),
        Some("not attempted"),
    ),
    ro("cmi.core.entry", "ab-initio"),
    keyword("cmi.core.score._children", Some("raw,min,max")),
    el("cmi.core.score.raw", RW, SCORE_12, Some("")),
    el("cmi.core.score.min", RW, SCORE_12, Some("")),
    el("cmi.core.score.max", RW, SCORE_12, Some("")),
    ro("cmi.core.total_time", "0000:00:00"),
    ro("cmi.core.lesson_mode", "normal"),
    el("cmi.core.exit", WO, ValueKind::Vocabulary(EXIT_12), Some("")),
    el("cmi.core.session_time", WO, ValueKind::Timespan, Some("")),
    el("cmi.suspend_data", RW, ValueKind::Text { max_len: 4096 }, Some("")),
    ro("cmi.launch_data", ""),
    el("cmi.comments", RW, ValueKind::Text { max_len: 4096 }, Some("")),
    ro("cmi.comments_from_lms", ""),
    keyword("cmi.student_data._children", Some("mastery_score,max_time_allowed,time_limit_action")),
    ro("cmi.student_data.mastery_score", ""),
    ro("cmi.student_data.max_time_allowed", ""),
    ro("cmi.student_data.time_limit_action", ""),
    keyword("cmi.student_preference._children", Some("audio,language,speed,text")),
    el("cmi.student_preference.audio", RW, ValueKind::Integer { min: -1, max: 100 }, Some("0")),
    el("cmi.student_preference.language", RW, ValueKind::Text { max_len: 255 }, Some("")),
    el("cmi.student_preference.speed", RW, ValueKind::Integer { min: -100, max: 100 }, Some("0")),
    el("cmi.student_preference.text", RW, ValueKind::Integer { min: -1, max: 1 }, Some("0")),
    keyword("cmi.objectives._children", Some("id,score,status")),
    keyword("cmi.objectives._count", None),
    el("cmi.objectives.n.id", RW, ValueKind::Identifier { max_len: 255 }, None),
    el("cmi.objectives.n.score.raw", RW, SCORE_12, None),
    el("cmi.objectives.n.score.min", RW, SCORE_12, None),
    el("cmi.objectives.n.score.max", RW, SCORE_12, None),
    el("cmi.objectives.n.status", RW, ValueKind::Vocabulary(STATUS_12), None),
    keyword(
        "cmi.interactions._children",
        Some(concat!(
            "id,objectives,time,type,correct_responses,weighting,",
            "student_response,result,latency"
        )),
    ),
    keyword("cmi.interactions._count", None),
    el("cmi.interactions.n.id", WO, ValueKind::Identifier { max_len: 255 }, None),
    el("cmi.interactions.n.time", WO, ValueKind::TimeOfDay, None),
    el("cmi.interactions.n.type", WO, ValueKind::Vocabulary(INTERACTION_TYPES_12), None),
    el("cmi.interactions.n.weighting", WO, REAL, None),
    el("cmi.interactions.n.student_response", WO, ValueKind::Text { max_len: 255 }, None),
    el("cmi.interactions.n.result", WO, ValueKind::VocabularyOrNumber(RESULTS_12), None),
    el("cmi.interactions.n.latency", WO, ValueKind::Timespan, None),
];

/// SCORM 2004 (4th edition) data model
pub static SCORM2004_ELEMENTS: &[ElementDef] = &[
    keyword("cmi._version", Some("1.0")),
    ro("cmi.learner_id", ""),
    ro("cmi.learner_name", ""),
    el("cmi.location", RW, ValueKind::Text { max_len: 1000 }, Some("")),
    ro("cmi.credit", "credit"),
    el("cmi.completion_status", RW, ValueKind::Vocabulary(COMPLETION_2004), Some("unknown")),
    el("cmi.success_status", RW, ValueKind::Vocabulary(SUCCESS_2004), Some("unknown")),
    ro("cmi.entry", "ab-initio"),
    keyword("cmi.score._children", Some("scaled,raw,min,max")),
    el("cmi.score.scaled", RW, SCALED, Some("")),
    el("cmi.score.raw", RW, REAL, Some("")),
    el("cmi.score.min", RW, REAL, Some("")),
    el("cmi.score.max", RW, REAL, Some("")),
    el("cmi.progress_measure", RW, UNIT, Some("")),
    ro("cmi.total_time", "PT0H0M0S"),
    ro("cmi.mode", "normal"),
    el("cmi.exit", WO, ValueKind::Vocabulary(EXIT_2004), Some("")),
    el("cmi.session_time", WO, ValueKind::Duration, Some("")),
    el("cmi.suspend_data", RW, ValueKind::Text { max_len: 64000 }, Some("")),
    ro("cmi.launch_data", ""),
    ro("cmi.scaled_passing_score", ""),
    ro("cmi.completion_threshold", ""),
    ro("cmi.max_time_allowed", ""),
    ro("cmi.time_limit_action", "continue,no message"),
    keyword(
        "cmi.learner_preference._children",
        Some("audio_level,language,delivery_speed,audio_captioning"),
    ),
    el("cmi.learner_preference.audio_level", RW, NON_NEGATIVE, Some("1")),
    el("cmi.learner_preference.language", RW, ValueKind::Text { max_len: 250 }, Some("")),
    el("cmi.learner_preference.delivery_speed", RW, NON_NEGATIVE, Some("1")),
    el(
        "cmi.learner_preference.audio_captioning",
        RW,
        ValueKind::Vocabulary(CAPTIONING_2004),
        Some("0"),
    ),
    keyword("cmi.comments_from_learner._children", Some("comment,location,timestamp")),
    keyword("cmi.comments_from_learner._count", None),
    el("cmi.comments_from_learner.n.comment", RW, ValueKind::Text { max_len: 4000 }, None),
    el("cmi.comments_from_learner.n.location", RW, ValueKind::Text { max_len: 250 }, None),
    el("cmi.comments_from_learner.n.timestamp", RW, ValueKind::Text { max_len: 64 }, None),
    keyword("cmi.comments_from_lms._children", Some("comment,location,timestamp")),
    keyword("cmi.comments_from_lms._count", None),
    keyword(
        "cmi.objectives._children",
        Some("id,score,success_status,completion_status,progress_measure,description"),
    ),
    keyword("cmi.objectives._count", None),
    el("cmi.objectives.n.id", RW, ValueKind::Identifier { max_len: 4000 }, None),
    el("cmi.objectives.n.score.scaled", RW, SCALED, None),
    el("cmi.objectives.n.score.raw", RW, REAL, None),
    el("cmi.objectives.n.score.min", RW, REAL, None),
    el("cmi.objectives.n.score.max", RW, REAL, None),
    el("cmi.objectives.n.success_status", RW, ValueKind::Vocabulary(SUCCESS_2004), None),
    el("cmi.objectives.n.completion_status", RW, ValueKind::Vocabulary(COMPLETION_2004), None),
    el("cmi.objectives.n.progress_measure", RW, UNIT, None),
    el("cmi.objectives.n.description", RW, ValueKind::Text { max_len: 250 }, None),
    keyword(
        "cmi.interactions._children",
        Some(concat!(
            "id,type,objectives,timestamp,correct_responses,weighting,",
            "learner_response,result,latency,description"
        )),
    ),
    keyword("cmi.interactions._count", None),
    el("cmi.interactions.n.id", RW, ValueKind::Identifier { max_len: 4000 }, None),
    el("cmi.interactions.n.type", RW, ValueKind::Vocabulary(INTERACTION_TYPES_2004), None),
    el("cmi.interactions.n.timestamp", RW, ValueKind::Text { max_len: 64 }, None),
    el("cmi.interactions.n.weighting", RW, REAL, None),
    el("cmi.interactions.n.learner_response", RW, ValueKind::Text { max_len: 4000 }, None),
    el("cmi.interactions.n.result", RW, ValueKind::VocabularyOrNumber(RESULTS_2004), None),
    el("cmi.interactions.n.latency", RW, ValueKind::Duration, None),
    el("cmi.interactions.n.description", RW, ValueKind::Text { max_len: 250 }, None),
];

/// Schema table for a version
pub fn elements(version: ScormVersion) -> &'static [ElementDef] {
    match version {
        ScormVersion::V12 => SCORM12_ELEMENTS,
        ScormVersion::V2004 => SCORM2004_ELEMENTS,
    }
}

/// Replace numeric path segments with the `n` placeholder
pub fn normalize(path: &str) -> String {
    path.split('.')
        .map(|seg| {
            if !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()) {
                "n"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Find the schema row describing a concrete element path
pub fn lookup(version: ScormVersion, path: &str) -> Option<&'static ElementDef> {
    let normalized = normalize(path);
    elements(version).iter().find(|def| def.path == normalized)
}

/// Whether a path belongs to the version's namespace at all
pub fn in_namespace(version: ScormVersion, path: &str) -> bool {
    match version {
        ScormVersion::V12 => path.starts_with("cmi."),
        ScormVersion::V2004 => {
            (path.starts_with("cmi.") && !path.starts_with("cmi.core.")) || path.starts_with("adl.")
        }
    }
}

/// If `path` is `<array>.<index>.<field>`, return the array prefix and index
pub fn array_index(path: &str) -> Option<(&str, usize)> {
    let mut offset = 0;
    for seg in path.split('.') {
        if !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()) {
            let prefix = path[..offset].trim_end_matches('.');
            return seg.parse().ok().map(|i| (prefix, i));
        }
        offset += seg.len() + 1;
    }
    None
}

/// Check a value against an element's constraint
pub fn check_value(kind: &ValueKind, value: &str) -> Result<(), Violation> {
    match *kind {
        ValueKind::Keyword => Err(Violation::Keyword),
        ValueKind::Text { max_len } => {
            if value.chars().count() > max_len {
                Err(Violation::TypeMismatch)
            } else {
                Ok(())
            }
        }
        ValueKind::Identifier { max_len } => {
            if value.is_empty()
                || value.chars().count() > max_len
                || value.chars().any(char::is_whitespace)
            {
                Err(Violation::TypeMismatch)
            } else {
                Ok(())
            }
        }
        ValueKind::Vocabulary(tokens) => {
            if tokens.contains(&value) {
                Ok(())
            } else {
                Err(Violation::TypeMismatch)
            }
        }
        ValueKind::VocabularyOrNumber(tokens) => {
            if tokens.contains(&value) || parse_decimal(value).is_some() {
                Ok(())
            } else {
                Err(Violation::TypeMismatch)
            }
        }
        ValueKind::Decimal { min, max, blank_ok } => {
            if value.is_empty() && blank_ok {
                return Ok(());
            }
            let n = parse_decimal(value).ok_or(Violation::TypeMismatch)?;
            if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                return Err(Violation::OutOfRange);
            }
            Ok(())
        }
        ValueKind::Integer { min, max } => {
            let n: i64 = value.parse().map_err(|_| Violation::TypeMismatch)?;
            if n < min || n > max {
                return Err(Violation::OutOfRange);
            }
            Ok(())
        }
        ValueKind::Timespan => {
            if is_timespan(value) {
                Ok(())
            } else {
                Err(Violation::TypeMismatch)
            }
        }
        ValueKind::TimeOfDay => {
            if is_time_of_day(value) {
                Ok(())
            } else {
                Err(Violation::TypeMismatch)
            }
        }
        ValueKind::Duration => {
            if is_iso_duration(value) {
                Ok(())
            } else {
                Err(Violation::TypeMismatch)
            }
        }
    }
}

fn parse_decimal(value: &str) -> Option<f64> {
    if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == 'e' || c == 'E') {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn all_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Split `SS` or `SS.s`/`SS.ss` and check the whole seconds part
fn seconds_ok(s: &str) -> bool {
    match s.split_once('.') {
        Some((whole, frac)) => all_digits(whole, 2, 2) && all_digits(frac, 1, 2),
        None => all_digits(s, 2, 2),
    }
}

fn is_timespan(value: &str) -> bool {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 || !all_digits(parts[0], 2, 4) || !all_digits(parts[1], 2, 2) {
        return false;
    }
    seconds_ok(parts[2]) && parts[1] < "60"
}

fn is_time_of_day(value: &str) -> bool {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 || !all_digits(parts[0], 2, 2) || !all_digits(parts[1], 2, 2) {
        return false;
    }
    seconds_ok(parts[2]) && parts[0] < "24" && parts[1] < "60" && &parts[2][..2] < "60"
}

fn is_iso_duration(value: &str) -> bool {
    let Some(rest) = value.strip_prefix('P') else {
        return false;
    };
    let (date, time) = match rest.split_once('T') {
        Some((d, t)) => {
            if t.is_empty() {
                return false;
            }
            (d, Some(t))
        }
        None => (rest, None),
    };

    let mut components = 0;
    if !designators(date, &['Y', 'M', 'D'], false, &mut components) {
        return false;
    }
    if let Some(t) = time {
        if !designators(t, &['H', 'M', 'S'], true, &mut components) {
            return false;
        }
    }
    components > 0
}

/// Parse `<number><designator>` runs in the given order
fn designators(s: &str, order: &[char], fractional_last: bool, count: &mut usize) -> bool {
    let mut next = 0;
    let mut number = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }
        let Some(pos) = order[next..].iter().position(|&d| d == c) else {
            return false;
        };
        let is_last = next + pos == order.len() - 1;
        let valid = if number.contains('.') {
            fractional_last && is_last && parse_decimal(&number).is_some()
        } else {
            !number.is_empty()
        };
        if !valid {
            return false;
        }
        number.clear();
        next += pos + 1;
        *count += 1;
    }
    number.is_empty()
}
