//! Integration tests for API publication across a frame chain
//!
//! Covers the publish-only-if-absent rule, teardown ownership, and what
//! happens when one player replaces another on the same shared ancestors.

use rte_bridge::attach::{AttachmentManager, FrameChain, FrameTarget, LocalFrame, TargetHandle};
use rte_bridge::core::error::Result;
use rte_bridge::rte::api::same_object;
use rte_bridge::rte::{surfaces, ApiObject, Session};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn objects(package: &str) -> Vec<ApiObject> {
    surfaces(&Session::new(package.into())).to_vec()
}

fn player_chain(top: &Arc<LocalFrame>, name: &str) -> (Arc<LocalFrame>, FrameChain) {
    let frame = LocalFrame::new(name);
    let chain = FrameChain::new(frame.clone())
        .with_parent(top.clone())
        .with_top(top.clone());
    (frame, chain)
}

/// Shared frame that holds every publisher at the `API` slot until all arrive
#[derive(Debug)]
struct GatedFrame {
    inner: Arc<LocalFrame>,
    gate: Barrier,
}

impl FrameTarget for GatedFrame {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, key: &str) -> Result<Option<ApiObject>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, object: ApiObject) -> Result<()> {
        self.inner.set(key, object)
    }

    fn remove(&self, key: &str) -> Result<Option<ApiObject>> {
        self.inner.remove(key)
    }

    fn publish_if_absent(&self, key: &str, object: ApiObject) -> Result<Option<ApiObject>> {
        if key == "API" {
            self.gate.wait();
        }
        self.inner.publish_if_absent(key, object)
    }
}

#[test]
fn test_self_parent_top_written_exactly_once() {
    let me = LocalFrame::new("self");
    let parent = LocalFrame::new("parent");
    let top = LocalFrame::new("top");
    let chain = FrameChain::new(me.clone())
        .with_parent(parent.clone())
        .with_top(top.clone());

    let manager = AttachmentManager::new(&chain, objects("p1"));
    for _ in 0..5 {
        manager.publish_once();
    }

    let mut published = manager.published();
    published.sort();
    assert_eq!(
        published,
        vec![
            ("parent".to_string(), "API"),
            ("parent".to_string(), "API_1484_11"),
            ("self".to_string(), "API"),
            ("self".to_string(), "API_1484_11"),
            ("top".to_string(), "API"),
            ("top".to_string(), "API_1484_11"),
        ]
    );
}

#[test]
fn test_teardown_only_removes_own_objects() {
    let me = LocalFrame::new("self");
    let top = LocalFrame::new("top");
    let [foreign12, _] = surfaces(&Session::new("lms".into()));
    top.set("API", foreign12.clone()).unwrap();

    let chain = FrameChain::new(me.clone()).with_top(top.clone());
    let mut manager = AttachmentManager::new(&chain, objects("p1"));
    manager.publish_once();
    assert_eq!(manager.stop(), 3);

    assert!(same_object(&top.peek("API").unwrap(), &foreign12));
    assert!(top.peek("API_1484_11").is_none());
    assert!(me.peek("API").is_none());
}

#[test]
fn test_replaced_object_is_not_removed() {
    let me = LocalFrame::new("self");
    let chain = FrameChain::new(me.clone());
    let mut manager = AttachmentManager::new(&chain, objects("p1"));
    manager.publish_once();

    // someone else overwrote our slot after we published
    let [replacement, _] = surfaces(&Session::new("p2".into()));
    me.set("API", replacement.clone()).unwrap();

    manager.stop();
    assert!(same_object(&me.peek("API").unwrap(), &replacement));
    assert!(me.peek("API_1484_11").is_none());
}

#[test]
fn test_unreachable_ancestor_is_skipped() {
    let me = LocalFrame::new("self");
    let top = LocalFrame::new("top");
    top.set_blocked(true);
    let chain = FrameChain::new(me.clone()).with_top(top.clone());

    let manager = AttachmentManager::new(&chain, objects("p1"));
    let report = manager.publish_once();
    assert_eq!(report.unreachable, 1);
    assert_eq!(report.published, 2);
    assert!(chain.find_api("API_1484_11").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_outgoing_stops_before_incoming_starts() {
    let top = LocalFrame::new("top");
    let (_, old_chain) = player_chain(&top, "old");
    let (_, new_chain) = player_chain(&top, "new");

    let mut old = AttachmentManager::new(&old_chain, objects("p1"));
    old.start(Duration::from_millis(500));
    old.stop();
    assert!(top.peek("API").is_none());

    let new_objects = objects("p2");
    let mut new = AttachmentManager::new(&new_chain, new_objects.clone());
    let report = new.start(Duration::from_millis(500));
    assert_eq!(report.occupied, 0);
    assert!(same_object(&top.peek("API").unwrap(), &new_objects[0]));
    new.stop();
}

#[tokio::test(start_paused = true)]
async fn test_incoming_starts_before_outgoing_stops() {
    let top = LocalFrame::new("top");
    let (_, old_chain) = player_chain(&top, "old");
    let (new_frame, new_chain) = player_chain(&top, "new");

    let old_objects = objects("p1");
    let mut old = AttachmentManager::new(&old_chain, old_objects.clone());
    old.start(Duration::from_millis(500));

    let new_objects = objects("p2");
    let mut new = AttachmentManager::new(&new_chain, new_objects.clone());
    let report = new.start(Duration::from_millis(500));
    // the shared top still holds the outgoing player's objects
    assert_eq!(report.occupied, 2);
    assert_eq!(report.published, 2);
    assert!(same_object(&top.peek("API").unwrap(), &old_objects[0]));

    old.stop();
    assert!(top.peek("API").is_none());
    assert!(new_frame.peek("API").is_some());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(same_object(&top.peek("API").unwrap(), &new_objects[0]));
    assert!(same_object(&top.peek("API_1484_11").unwrap(), &new_objects[1]));

    new.stop();
    assert!(top.peek("API").is_none());
}

#[test]
fn test_concurrent_publishers_never_share_a_slot() {
    for _ in 0..50 {
        let top = LocalFrame::new("top");
        let gated: TargetHandle = Arc::new(GatedFrame {
            inner: top.clone(),
            gate: Barrier::new(2),
        });
        let chain = FrameChain::new(gated);

        let first_objects = objects("p1");
        let second_objects = objects("p2");
        let first = AttachmentManager::new(&chain, first_objects.clone());
        let second = AttachmentManager::new(&chain, second_objects.clone());

        let (a, b) = thread::scope(|s| {
            let a = s.spawn(|| first.publish_once());
            let b = s.spawn(|| second.publish_once());
            (a.join().unwrap(), b.join().unwrap())
        });
        assert_eq!(a.published + b.published, 2);
        assert_eq!(a.occupied + b.occupied, 2);

        let first_owns = first.published().iter().any(|(_, key)| *key == "API");
        let second_owns = second.published().iter().any(|(_, key)| *key == "API");
        assert!(first_owns != second_owns);

        let winner = if first_owns { &first_objects[0] } else { &second_objects[0] };
        assert!(same_object(&top.peek("API").unwrap(), winner));
    }
}
