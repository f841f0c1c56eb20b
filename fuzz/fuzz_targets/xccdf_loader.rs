#![no_main]

use libfuzzer_sys::fuzz_target;
use stigpost_checklist_ingest::ChecklistNormalizer;
use stigpost_checklist_ingest::scap::{checklist, xccdf};

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(results) = xccdf::load_scan_results(content) else {
        return;
    };

    // 읽을 수 있었던 스캔 결과로 만든 체크리스트는 다시 파싱되어야 함
    let generated = checklist::generate(&results).expect("generate from loaded results");
    ChecklistNormalizer::new()
        .normalize(&generated)
        .expect("generated checklist must normalize");
});
