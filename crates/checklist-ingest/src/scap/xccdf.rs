//! XCCDF 스캔 결과 로더
//!
//! 네임스페이스(XCCDF 1.1/1.2, ARF 래퍼)와 무관하게 로컬 이름으로 요소를 찾습니다.
//! 여러 `TestResult`가 있으면 첫 번째만 읽습니다.

use roxmltree::{Document, Node, ParsingOptions};

use super::{RuleResult, RuleResultSet};
use crate::error::IngestError;
use crate::normalizer::inner_text;

const SOURCE_NAME: &str = "scan result";

/// 스캔 결과 XML을 읽습니다.
///
/// # Errors
///
/// XML이 올바르지 않거나 `TestResult` 요소가 없으면 `IngestError::Parse`
pub fn load_scan_results(xml: &str) -> Result<RuleResultSet, IngestError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc =
        Document::parse_with_options(xml, options).map_err(|e| IngestError::parse(SOURCE_NAME, e))?;

    let test_result = doc
        .descendants()
        .find(|n| n.has_tag_name("TestResult"))
        .ok_or_else(|| IngestError::parse(SOURCE_NAME, "no TestResult element"))?;

    let mut set = RuleResultSet::default();

    if let Some(benchmark) = doc.descendants().find(|n| n.has_tag_name("Benchmark")) {
        set.benchmark_title = child_text(benchmark, "title").unwrap_or_default();
        set.benchmark_version = release_info(benchmark)
            .or_else(|| child_text(benchmark, "version"))
            .unwrap_or_default();
    }

    set.target = child_text(test_result, "target").unwrap_or_default();

    for rule_result in test_result
        .children()
        .filter(|n| n.has_tag_name("rule-result"))
    {
        let Some(rule_id) = rule_result.attribute("idref") else {
            tracing::debug!("skipping rule-result without idref");
            continue;
        };
        set.results.push(RuleResult {
            rule_id: rule_id.to_owned(),
            result: child_text(rule_result, "result").unwrap_or_default(),
        });
    }

    Ok(set)
}

/// 첫 번째 직계 자식 요소의 텍스트 (앞뒤 공백 제거)
fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .map(|n| inner_text(n).trim().to_owned())
}

/// `<plain-text id="release-info">` 값
fn release_info(benchmark: Node<'_, '_>) -> Option<String> {
    benchmark
        .children()
        .find(|n| n.has_tag_name("plain-text") && n.attribute("id") == Some("release-info"))
        .map(|n| inner_text(n).trim().to_owned())
}
