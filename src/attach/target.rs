//! Frames that can hold published API objects
//!
//! A [`FrameTarget`] is one window-like slot table reachable from the player:
//! itself, its parent, the top-level frame, or an opener. Access to any of
//! them may be refused (cross-origin), which callers treat as routine.

use crate::core::error::{BridgeError, Result};
use crate::rte::api::ApiObject;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait FrameTarget: Send + Sync + fmt::Debug {
    /// Human-readable label used in logs
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<ApiObject>>;

    fn set(&self, key: &str, object: ApiObject) -> Result<()>;

    fn remove(&self, key: &str) -> Result<Option<ApiObject>>;

    /// Write `object` only if `key` is empty, as one step
    ///
    /// Returns `None` when the object was written, otherwise the object
    /// already in the slot. Two publishers racing on a shared frame must
    /// never both see the slot as empty.
    fn publish_if_absent(&self, key: &str, object: ApiObject) -> Result<Option<ApiObject>>;
}

pub type TargetHandle = Arc<dyn FrameTarget>;

pub fn same_target(a: &TargetHandle, b: &TargetHandle) -> bool {
    Arc::ptr_eq(a, b)
}

/// In-process frame with a global slot table
///
/// Stands in for a browser window when the bridge runs outside a browser;
/// content and host share it through an explicit handle instead of ambient
/// globals.
#[derive(Debug, Default)]
pub struct LocalFrame {
    name: String,
    slots: Mutex<HashMap<String, ApiObject>>,
    blocked: AtomicBool,
}

impl LocalFrame {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            slots: Mutex::new(HashMap::new()),
            blocked: AtomicBool::new(false),
        })
    }

    /// Simulate the frame becoming inaccessible from our origin
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Read a slot directly, ignoring the origin check
    pub fn peek(&self, key: &str) -> Option<ApiObject> {
        self.slots.lock().get(key).cloned()
    }

    fn check_access(&self) -> Result<()> {
        if self.blocked.load(Ordering::SeqCst) {
            Err(BridgeError::CrossOrigin(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

impl FrameTarget for LocalFrame {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<ApiObject>> {
        self.check_access()?;
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, object: ApiObject) -> Result<()> {
        self.check_access()?;
        self.slots.lock().insert(key.to_string(), object);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<ApiObject>> {
        self.check_access()?;
        Ok(self.slots.lock().remove(key))
    }

    fn publish_if_absent(&self, key: &str, object: ApiObject) -> Result<Option<ApiObject>> {
        self.check_access()?;
        match self.slots.lock().entry(key.to_string()) {
            Entry::Occupied(existing) => Ok(Some(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(object);
                Ok(None)
            }
        }
    }
}

/// The frames reachable from the player: self, parent, top, opener
#[derive(Debug, Clone)]
pub struct FrameChain {
    pub current: TargetHandle,
    pub parent: Option<TargetHandle>,
    pub top: Option<TargetHandle>,
    pub opener: Option<TargetHandle>,
}

impl FrameChain {
    pub fn new(current: TargetHandle) -> Self {
        Self {
            current,
            parent: None,
            top: None,
            opener: None,
        }
    }

    pub fn with_parent(mut self, parent: TargetHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_top(mut self, top: TargetHandle) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_opener(mut self, opener: TargetHandle) -> Self {
        self.opener = Some(opener);
        self
    }

    /// `[self, parent?, top?, opener?]` with duplicates removed
    ///
    /// An unframed page is its own parent and top, so the same frame can
    /// appear more than once.
    pub fn candidates(&self) -> Vec<TargetHandle> {
        let mut out: Vec<TargetHandle> = Vec::with_capacity(4);
        let all = std::iter::once(&self.current)
            .chain(self.parent.as_ref())
            .chain(self.top.as_ref())
            .chain(self.opener.as_ref());
        for target in all {
            if !out.iter().any(|t| same_target(t, target)) {
                out.push(target.clone());
            }
        }
        out
    }

    /// Content-side discovery: first reachable frame exposing `key`
    pub fn find_api(&self, key: &str) -> Option<ApiObject> {
        self.candidates()
            .iter()
            .find_map(|target| target.get(key).ok().flatten())
    }
}
