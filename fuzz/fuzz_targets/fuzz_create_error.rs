#![no_main]

use app_errors::{create_error, CreateOptions, ErrorCode, ErrorContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let code = ErrorCode::ALL[data[0] as usize % ErrorCode::ALL.len()];
    let context = ErrorContext::ALL.get(data[1] as usize % (ErrorContext::ALL.len() + 1)).copied();
    let text = String::from_utf8_lossy(&data[2..]).into_owned();
    let (key, rest) = text.split_once('|').unwrap_or((text.as_str(), ""));

    let err = create_error(
        code,
        context,
        Some(key),
        CreateOptions::new().custom_message(rest).correlation_id(key),
    );
    assert_eq!(err.code(), code);
    assert!(!err.user_message().is_empty());
    assert!(!err.correlation_id().is_empty());
});
