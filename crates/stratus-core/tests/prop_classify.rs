use proptest::prelude::*;
use serde_json::json;
use stratus_core::{classify, kind_for_status, ApiErrorKind, HeaderFields};

#[test]
fn every_mapped_kind_round_trips_through_its_status() {
    for kind in ApiErrorKind::MAPPED {
        let status = kind.status().expect("mapped kind has a status");
        let err = classify(status, &HeaderFields::new(), None);
        assert_eq!(err.kind, kind);
        assert_eq!(err.status, status);
    }
}

proptest! {
    #[test]
    fn unmapped_statuses_are_generic(status in 400u16..600) {
        prop_assume!(ApiErrorKind::MAPPED.iter().all(|kind| kind.status() != Some(status)));
        prop_assert_eq!(kind_for_status(status), ApiErrorKind::Http);
    }

    #[test]
    fn envelope_message_is_preserved(name in "[a-zA-Z]{1,12}", message in "[ -~]{0,40}") {
        let mut envelope = serde_json::Map::new();
        envelope.insert(name, json!({ "message": message.clone() }));
        let body = serde_json::Value::Object(envelope);
        let err = classify(404, &HeaderFields::new(), Some(&body));
        prop_assert_eq!(err.message, message);
        prop_assert_eq!(err.details, "n/a");
    }
}
