//! Tests for the error value record.

use std::error::Error as _;

use faultline::{context, kind, Cause, ErrorValue};

#[test]
fn minimal_value_has_only_mandatory_fields() {
    let err = ErrorValue::new("Thrown", "boom");

    assert_eq!(err.kind(), "Thrown");
    assert_eq!(err.message(), "boom");
    assert!(err.origin().is_none());
    assert!(err.trace().is_none());
    assert!(err.occurred_at().is_none());
    assert!(err.context().is_none());
    assert!(err.cause().is_none());
}

#[test]
fn display_includes_kind_message_and_origin() {
    let bare = ErrorValue::new("DbError", "connection refused");
    assert_eq!(bare.to_string(), "DbError: connection refused");

    let located = bare.with_origin("db.rs:10:5");
    assert_eq!(located.to_string(), "DbError: connection refused (at db.rs:10:5)");
}

#[test]
fn error_source_walks_chained_cause() {
    let root = ErrorValue::new("IoError", "disk gone");
    let wrapper = ErrorValue::new("SaveFailed", "could not persist")
        .with_cause(Cause::Chain(root.clone()));

    let source = wrapper.source().expect("chained cause should surface as source");
    assert_eq!(source.to_string(), root.to_string());

    let raw = ErrorValue::new("Thrown", "x").with_cause(Cause::Raw("text".into()));
    assert!(raw.source().is_none());
}

#[test]
fn to_json_omits_absent_fields() {
    let err = ErrorValue::new("Thrown", "boom");
    let rendered = err.to_json();

    assert!(rendered.contains(r#""kind":"Thrown""#));
    assert!(!rendered.contains("origin"));
    assert!(!rendered.contains("trace"));
    assert!(!rendered.contains("occurred_at"));
}

#[test]
fn serde_round_trip_preserves_all_fields() {
    let err = ErrorValue::new("HttpError", "502 from upstream")
        .with_origin("gateway.rs:77:13")
        .with_occurred_at(1_700_000_000_000)
        .with_context(context! { "upstream" => "billing", "status" => 502 })
        .with_cause(Cause::Raw("bad gateway".into()));

    let rendered = serde_json::to_string(&err).unwrap();
    let back: ErrorValue = serde_json::from_str(&rendered).unwrap();
    assert_eq!(back, err);
}

#[test]
fn kind_predicates() {
    assert!(ErrorValue::new(kind::TIMEOUT, "late").is_timeout());
    assert!(ErrorValue::new(kind::ABORTED, "stopped").is_aborted());
    assert!(ErrorValue::new("Custom", "x").is_kind("Custom"));
    assert!(!ErrorValue::new("Custom", "x").is_timeout());
}
