//! Owner-tracked record of what one manager published

use crate::attach::target::{same_target, TargetHandle};
use crate::rte::api::{same_object, ApiObject};

#[derive(Debug, Clone)]
pub struct Publication {
    pub target: TargetHandle,
    pub key: &'static str,
    pub object: ApiObject,
}

/// The (target, key) pairs written by this session, with the exact object
#[derive(Debug, Default)]
pub struct PublishedRegistry {
    entries: Vec<Publication>,
}

impl PublishedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write; re-recording the same pair is a no-op
    pub fn record(&mut self, target: &TargetHandle, key: &'static str, object: &ApiObject) {
        if self.contains(target, key) {
            return;
        }
        self.entries.push(Publication {
            target: target.clone(),
            key,
            object: object.clone(),
        });
    }

    pub fn contains(&self, target: &TargetHandle, key: &str) -> bool {
        self.entries
            .iter()
            .any(|p| p.key == key && same_target(&p.target, target))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Publication> {
        self.entries.iter()
    }

    /// Remove every recorded object that is still ours; returns how many
    ///
    /// A slot now holding a different object belongs to someone else and is
    /// dropped from the record. Slots on a frame that refuses access stay
    /// recorded as orphans so a later call can retry them.
    pub fn retract_all(&mut self) -> usize {
        let mut removed = 0;
        let mut orphans = Vec::new();
        for publication in std::mem::take(&mut self.entries) {
            let target = &publication.target;
            let key = publication.key;
            let outcome = target.get(key).and_then(|current| match current {
                Some(current) if same_object(&current, &publication.object) => {
                    target.remove(key).map(|_| true)
                }
                _ => Ok(false),
            });
            match outcome {
                Ok(true) => removed += 1,
                Ok(false) => {
                    tracing::debug!(frame = target.name(), key, "slot no longer ours, leaving it");
                }
                Err(e) => {
                    tracing::warn!(
                        frame = target.name(),
                        key,
                        error = %e,
                        "api object orphaned, frame refused retraction"
                    );
                    orphans.push(publication);
                }
            }
        }
        self.entries = orphans;
        removed
    }
}
