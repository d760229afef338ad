#![no_main]

use app_errors::ReporterConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(cfg) = ReporterConfig::from_toml_str(text) {
        assert!(cfg.validate().is_ok());
        assert!(cfg.beacon_capacity >= 1);
    }
});
