#![no_main]

use libfuzzer_sys::fuzz_target;
use stigpost_checklist_ingest::{ChecklistNormalizer, sanitize};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let normalizer = ChecklistNormalizer::new();
        let _ = normalizer.normalize(content);
        let _ = normalizer.normalize(&sanitize(content));
    }
});
