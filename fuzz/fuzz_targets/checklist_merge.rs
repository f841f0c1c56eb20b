#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use stigpost_checklist_ingest::{ScanAdapter, XccdfScanAdapter};

/// 퍼저용 병합 입력
#[derive(Arbitrary, Debug)]
struct MergeInput {
    scan: String,
    existing: String,
    replace_all: bool,
}

fuzz_target!(|input: MergeInput| {
    let adapter = XccdfScanAdapter::new();
    let _ = adapter.merge(&input.scan, &input.existing, input.replace_all);
});
