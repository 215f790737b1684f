//! Property tests for the CMI data store behind the API surfaces

use proptest::prelude::*;
use rte_bridge::core::types::ScormVersion;
use rte_bridge::rte::Session;

fn element() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("cmi.location".to_string()),
        Just("cmi.suspend_data".to_string()),
        Just("cmi.completion_status".to_string()),
        Just("cmi.score.scaled".to_string()),
        Just("cmi.learner_id".to_string()),
        (0usize..4).prop_map(|i| format!("cmi.interactions.{}.id", i)),
        "[a-z]{1,8}".prop_map(|s| format!("cmi.ext_{}", s)),
    ]
}

fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("completed".to_string()),
        Just("0.5".to_string()),
        Just("".to_string()),
        "[a-z0-9 ]{0,12}",
    ]
}

proptest! {
    #[test]
    fn keys_are_never_deleted(writes in prop::collection::vec((element(), value()), 1..40)) {
        let session = Session::new("p1".into());
        session.call(ScormVersion::V2004, "Initialize", &[""]);

        let mut previous = session.store(ScormVersion::V2004).snapshot();
        for (element, value) in &writes {
            session.call(ScormVersion::V2004, "SetValue", &[element.as_str(), value.as_str()]);
            let current = session.store(ScormVersion::V2004).snapshot();
            for key in previous.keys() {
                prop_assert!(current.contains_key(key), "{} disappeared", key);
            }
            previous = current;
        }
    }

    #[test]
    fn unseeded_reads_are_empty(suffix in "[a-z]{1,12}") {
        let session = Session::new("p1".into());
        session.call(ScormVersion::V12, "LMSInitialize", &[""]);

        let element = format!("cmi.unseeded_{}", suffix);
        prop_assert_eq!(session.call(ScormVersion::V12, "LMSGetValue", &[element.as_str()]), "");
        prop_assert_eq!(session.last_error(ScormVersion::V12), 0);
    }

    #[test]
    fn rejected_writes_do_not_mutate(value in "[a-z]{1,10}") {
        let session = Session::new("p1".into());
        session.call(ScormVersion::V2004, "Initialize", &[""]);
        let before = session.store(ScormVersion::V2004).snapshot();

        // learner_id is read-only
        let args = ["cmi.learner_id", value.as_str()];
        let result = session.call(ScormVersion::V2004, "SetValue", &args);
        prop_assert_eq!(result, "false");
        prop_assert_eq!(session.store(ScormVersion::V2004).snapshot(), before);
    }
}
