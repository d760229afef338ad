#![no_main]

use app_errors::{extract_error_message, is_app_error, normalize, Caught};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let caught = Caught::from(value);
    let recognized = is_app_error(&caught);
    let _ = extract_error_message(&caught);

    let err = normalize(caught);
    assert!(!err.correlation_id().is_empty());
    assert!(recognized || err.code() == app_errors::ErrorCode::UnknownError);
});
