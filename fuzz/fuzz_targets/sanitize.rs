#![no_main]

use libfuzzer_sys::fuzz_target;
use stigpost_checklist_ingest::sanitize;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let once = sanitize(content);
        // 두 번 적용해도 결과가 같아야 함
        assert_eq!(sanitize(&once), once);
    }
});
