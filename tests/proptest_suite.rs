//! Property-based tests for app_errors
//!
//! These tests use proptest to generate random inputs and verify invariants hold.

use app_errors::definitions::{self, keys};
use app_errors::factory::{default_can_retry, default_severity, default_user_message};
use app_errors::{
    convenience, create_error, extract_error_message, is_app_error, normalize, truncate_with_indicator,
    Caught, CreateOptions, DeliveryLedger, DeliveryOutcome, ErrorCode, ErrorContext, ErrorLog,
    MAX_FIELD_OUTPUT_LEN,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

fn any_code() -> impl Strategy<Value = ErrorCode> {
    prop::sample::select(ErrorCode::ALL.to_vec())
}

fn any_context() -> impl Strategy<Value = Option<ErrorContext>> {
    prop::option::of(prop::sample::select(ErrorContext::ALL.to_vec()))
}

fn any_key() -> impl Strategy<Value = Option<String>> {
    let known: Vec<String> = definitions::entries().map(|(k, _)| k.to_string()).collect();
    prop::option::of(prop_oneof![
        prop::sample::select(known),
        "[a-z_.]{0,24}",
    ])
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "\\PC{0,40}".prop_map(Value::from),
    ]
}

fn any_json() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{1,12}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn any_caught() -> impl Strategy<Value = Caught> {
    prop_oneof![
        "\\PC{0,200}".prop_map(Caught::from),
        any::<f64>().prop_map(Caught::from),
        any::<bool>().prop_map(Caught::from),
        Just(Caught::Null),
        Just(Caught::Undefined),
        any_json().prop_map(Caught::Object),
        "\\PC{0,200}".prop_map(|m| Caught::native(std::io::Error::other(m))),
        any_code().prop_map(|c| Caught::from(create_error(c, None, None, CreateOptions::default()))),
    ]
}

// ============================================================================
// FACTORY PROPERTIES
// ============================================================================

proptest! {
    /// Any code, context, key and option set yields a fully populated error
    #[test]
    fn create_error_is_total(
        code in any_code(),
        context in any_context(),
        key in any_key(),
        custom in prop::option::of("\\PC{0,200}"),
        id in prop::option::of("\\PC{0,64}"),
    ) {
        let mut options = CreateOptions::new();
        options.custom_message = custom;
        options.correlation_id = id;

        let err = create_error(code, context, key.as_deref(), options);

        prop_assert_eq!(err.code(), code);
        prop_assert_eq!(err.context(), context.unwrap_or_default());
        prop_assert!(!err.user_message().is_empty());
        prop_assert!(!err.message().is_empty());
        prop_assert!(!err.action().is_empty());
        prop_assert!(!err.correlation_id().is_empty());
    }

    /// custom message beats catalog, catalog beats defaults
    #[test]
    fn override_priority(
        code in any_code(),
        key in any_key(),
        custom in "\\PC{1,80}",
    ) {
        let preset = key.as_deref().and_then(definitions::lookup);

        let with_custom = create_error(
            code,
            None,
            key.as_deref(),
            CreateOptions::new().custom_message(custom.clone()),
        );
        prop_assert_eq!(with_custom.user_message(), custom.as_str());
        prop_assert_eq!(with_custom.message(), custom.as_str());

        let plain = create_error(code, None, key.as_deref(), CreateOptions::default());
        match preset {
            Some(p) => {
                prop_assert_eq!(plain.user_message(), p.user_message);
                prop_assert_eq!(plain.action(), p.action);
                prop_assert_eq!(plain.severity(), p.severity);
                prop_assert_eq!(plain.can_retry(), p.can_retry);
            }
            None => {
                prop_assert_eq!(plain.user_message(), default_user_message(code));
                prop_assert_eq!(plain.severity(), default_severity(code));
                prop_assert_eq!(plain.can_retry(), default_can_retry(code));
            }
        }
    }

    /// Supplied correlation ids are kept verbatim; empty ones are replaced
    #[test]
    fn supplied_correlation_id_is_kept(code in any_code(), id in "\\PC{0,64}") {
        let err = create_error(code, None, None, CreateOptions::new().correlation_id(id.clone()));
        if id.is_empty() {
            prop_assert!(!err.correlation_id().is_empty());
        } else {
            prop_assert_eq!(err.correlation_id(), id.as_str());
        }
    }

    /// Generated correlation ids never repeat within a batch
    #[test]
    fn correlation_ids_are_unique(code in any_code(), n in 2usize..200) {
        let ids: HashSet<String> = (0..n)
            .map(|_| create_error(code, None, None, CreateOptions::default()).correlation_id().to_string())
            .collect();
        prop_assert_eq!(ids.len(), n);
    }

    /// The wire shape survives a trip through JSON and is still recognized
    #[test]
    fn wire_shape_is_recognized(code in any_code(), context in any_context(), key in any_key()) {
        let err = create_error(code, context, key.as_deref(), CreateOptions::default());
        let wire = serde_json::to_value(&err).unwrap();
        prop_assert!(is_app_error(&Caught::Object(wire.clone())));

        let back = normalize(Caught::Object(wire));
        prop_assert_eq!(back.code(), err.code());
        prop_assert_eq!(back.correlation_id(), err.correlation_id());
    }
}

// ============================================================================
// CLASSIFIER PROPERTIES
// ============================================================================

proptest! {
    /// Classification, extraction and normalization never panic
    #[test]
    fn classifier_is_total(caught in any_caught()) {
        let _ = is_app_error(&caught);
        let message = extract_error_message(&caught);
        let err = normalize(caught.clone());
        prop_assert!(!err.correlation_id().is_empty());

        if !is_app_error(&caught) {
            prop_assert_eq!(err.code(), ErrorCode::UnknownError);
            if !message.is_empty() {
                prop_assert_eq!(err.user_message(), message.as_str());
            }
        }
    }

    /// Objects missing any identity key are never app errors
    #[test]
    fn partial_objects_are_rejected(
        value in any_json(),
        drop in prop::sample::select(vec!["code", "message", "correlationId"]),
    ) {
        let mut obj = json!({"code": "FILE_EMPTY", "message": "m", "correlationId": "c"});
        if let (Value::Object(extra), Some(fields)) = (value, obj.as_object_mut()) {
            for (k, v) in extra {
                fields.entry(k).or_insert(v);
            }
        }
        if let Some(fields) = obj.as_object_mut() {
            fields.remove(drop);
        }
        prop_assert!(!is_app_error(&Caught::Object(obj)));
    }

    /// Normalizing twice changes nothing
    #[test]
    fn normalize_is_idempotent(caught in any_caught()) {
        let once = normalize(caught);
        let twice = normalize(Caught::from(once.clone()));
        prop_assert_eq!(twice.code(), once.code());
        prop_assert_eq!(twice.correlation_id(), once.correlation_id());
        prop_assert_eq!(twice.user_message(), once.user_message());
    }
}

// ============================================================================
// BUILDER PROPERTIES
// ============================================================================

proptest! {
    /// Size builder carries both sizes and is never retryable
    #[test]
    fn file_size_exceeded_carries_sizes(actual in any::<u64>(), max in any::<u64>()) {
        let err = convenience::file_size_exceeded(actual, max);
        let details = err.details().unwrap();
        prop_assert_eq!(details.actual_size, Some(actual));
        prop_assert_eq!(details.max_size, Some(max));
        prop_assert!(!err.can_retry());
        prop_assert!(err.user_message().contains(&convenience::format_file_size(actual)));
    }

    #[test]
    fn format_file_size_is_short(bytes in any::<u64>()) {
        let text = convenience::format_file_size(bytes);
        let (number, unit) = text.split_once(' ').unwrap();
        prop_assert!(["Bytes", "KB", "MB", "GB"].contains(&unit));
        prop_assert!(!number.ends_with('.'));
        prop_assert!(number.parse::<f64>().is_ok());
    }

    /// HTTP translation always keeps the status
    #[test]
    fn http_errors_keep_status(status in 100u16..600) {
        let err = app_errors::create_error_from_http(status, None, None, None);
        prop_assert_eq!(err.details().and_then(|d| d.status), Some(status));
        if (500..600).contains(&status) {
            prop_assert_eq!(err.code(), ErrorCode::ServerError);
        }
    }
}

// ============================================================================
// LOGGING PROPERTIES
// ============================================================================

proptest! {
    /// Truncated strings stay valid UTF-8 and bounded
    #[test]
    fn truncation_is_bounded(s in "\\PC{0,4000}") {
        let truncated = truncate_with_indicator(&s);
        prop_assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        if s.len() <= MAX_FIELD_OUTPUT_LEN {
            prop_assert_eq!(truncated.as_ref(), s.as_str());
        }
    }

    /// A log line is bounded no matter how long the message is
    #[test]
    fn log_line_is_bounded(message in "\\PC{0,6000}", ctx in "\\PC{0,3000}") {
        let err = convenience::invalid_data(Some(message.as_str())).with_handler_context(ctx);
        let mut line = String::new();
        ErrorLog::new(&err).write_to(&mut line).unwrap();
        prop_assert!(line.len() < 4 * MAX_FIELD_OUTPUT_LEN);
        prop_assert!(line.starts_with("[DATA_VALIDATION_FAILED]"));
    }
}

// ============================================================================
// LEDGER PROPERTIES
// ============================================================================

proptest! {
    /// The ledger never holds more than its capacity; totals count everything
    #[test]
    fn ledger_respects_capacity(capacity in 1usize..64, writes in 0usize..300) {
        let ledger = DeliveryLedger::new(capacity);
        let err = convenience::network_error();
        for _ in 0..writes {
            ledger.record(&err, DeliveryOutcome::Fetch, 10);
        }
        prop_assert_eq!(ledger.len(), writes.min(capacity));
        prop_assert_eq!(ledger.total(DeliveryOutcome::Fetch), writes as u64);
        prop_assert_eq!(ledger.eviction_count(), writes.saturating_sub(capacity) as u64);
    }
}

#[test]
fn catalog_keys_are_unique() {
    let keys: Vec<&str> = definitions::entries().map(|(k, _)| k).collect();
    let unique: HashSet<&str> = keys.iter().copied().collect();
    assert_eq!(keys.len(), unique.len());
    assert!(definitions::lookup(keys::AUTH_UNAUTHORIZED).is_some());
}
