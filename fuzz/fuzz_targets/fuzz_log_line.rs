#![no_main]

use app_errors::{convenience, MAX_FIELD_OUTPUT_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data).into_owned();
    let err = convenience::analysis_failed(Some(text.as_str())).with_handler_context(text.as_str());

    let mut line = String::new();
    err.log().write_to(&mut line).unwrap();
    assert!(line.len() < 4 * MAX_FIELD_OUTPUT_LEN);
});
