//! 스캔 결과 어댑터 -- XCCDF/SCAP 결과를 CKL 체크리스트로 변환
//!
//! [`ScanAdapter`] trait은 수집 파이프라인이 스캔 결과를 다루는 유일한 경계입니다.
//! 규칙 평가 알고리즘은 이 crate의 관심사가 아니며, 기본 구현인
//! [`XccdfScanAdapter`]는 결과 파일을 읽어 상태값만 옮깁니다.
//!
//! # 구성
//!
//! - [`xccdf`] -- 스캔 결과 로더 (`TestResult` / `rule-result`)
//! - [`checklist`] -- CKL 골격 생성 및 기존 CKL의 `STATUS` 재작성

pub mod checklist;
pub mod xccdf;

use std::fmt;

use crate::error::IngestError;

/// 스캔 결과 어댑터 trait
///
/// 순수 함수이며 동기적으로 동작합니다.
pub trait ScanAdapter: Send + Sync + 'static {
    /// 스캔 결과로 새 체크리스트를 생성합니다.
    ///
    /// # Errors
    ///
    /// 스캔 결과를 해석할 수 없으면 `IngestError::Parse`
    fn convert(&self, scan_xml: &str) -> Result<String, IngestError>;

    /// 스캔 결과를 기존 체크리스트에 병합합니다.
    ///
    /// `replace_all`이 `false`이면 아직 검토되지 않은 항목만 바꿉니다.
    ///
    /// # Errors
    ///
    /// 스캔 결과나 기존 체크리스트를 해석할 수 없으면 `IngestError::Parse`
    fn merge(
        &self,
        scan_xml: &str,
        existing_checklist: &str,
        replace_all: bool,
    ) -> Result<String, IngestError>;
}

/// CKL 항목 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecklistStatus {
    /// 결함 없음
    NotAFinding,
    /// 결함 있음
    Open,
    /// 해당 없음
    NotApplicable,
    /// 미검토
    NotReviewed,
}

impl ChecklistStatus {
    /// XCCDF `result` 값을 CKL 상태로 옮깁니다.
    pub fn from_xccdf_result(result: &str) -> Self {
        match result.trim() {
            "pass" => Self::NotAFinding,
            "fail" => Self::Open,
            "notapplicable" => Self::NotApplicable,
            _ => Self::NotReviewed,
        }
    }

    /// CKL `STATUS` 요소에 쓰는 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAFinding => "NotAFinding",
            Self::Open => "Open",
            Self::NotApplicable => "Not_Applicable",
            Self::NotReviewed => "Not_Reviewed",
        }
    }
}

impl fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 규칙 하나의 평가 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    /// 규칙 ID (`rule-result@idref`)
    pub rule_id: String,
    /// 원래 결과 값 (`pass`, `fail`, ...)
    pub result: String,
}

impl RuleResult {
    /// CKL 상태로 변환합니다.
    pub fn status(&self) -> ChecklistStatus {
        ChecklistStatus::from_xccdf_result(&self.result)
    }
}

/// 스캔 결과 파일에서 읽은 내용
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleResultSet {
    /// 벤치마크 제목
    pub benchmark_title: String,
    /// 벤치마크 버전/릴리스 정보
    pub benchmark_version: String,
    /// 대상 호스트명
    pub target: String,
    /// 규칙별 결과 (파일 순서)
    pub results: Vec<RuleResult>,
}

impl RuleResultSet {
    /// 규칙 ID로 결과를 찾습니다. 같은 ID가 여러 번 나오면 마지막 값이 이깁니다.
    pub fn find(&self, rule_id: &str) -> Option<&RuleResult> {
        self.results.iter().rev().find(|r| r.rule_id == rule_id)
    }
}

/// 기본 XCCDF 어댑터
#[derive(Debug, Clone, Default)]
pub struct XccdfScanAdapter;

impl XccdfScanAdapter {
    /// 새 어댑터를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl ScanAdapter for XccdfScanAdapter {
    fn convert(&self, scan_xml: &str) -> Result<String, IngestError> {
        let results = xccdf::load_scan_results(scan_xml)?;
        tracing::debug!(
            benchmark = %results.benchmark_title,
            rules = results.results.len(),
            "generating checklist from scan results"
        );
        checklist::generate(&results)
    }

    fn merge(
        &self,
        scan_xml: &str,
        existing_checklist: &str,
        replace_all: bool,
    ) -> Result<String, IngestError> {
        let results = xccdf::load_scan_results(scan_xml)?;
        tracing::debug!(
            benchmark = %results.benchmark_title,
            rules = results.results.len(),
            replace_all,
            "merging scan results into checklist"
        );
        checklist::update(&results, existing_checklist, replace_all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xccdf_results_map_to_checklist_status() {
        assert_eq!(
            ChecklistStatus::from_xccdf_result("pass"),
            ChecklistStatus::NotAFinding
        );
        assert_eq!(
            ChecklistStatus::from_xccdf_result("fail"),
            ChecklistStatus::Open
        );
        assert_eq!(
            ChecklistStatus::from_xccdf_result("notapplicable"),
            ChecklistStatus::NotApplicable
        );
        for other in ["error", "unknown", "notchecked", "notselected", "informational", ""] {
            assert_eq!(
                ChecklistStatus::from_xccdf_result(other),
                ChecklistStatus::NotReviewed
            );
        }
    }

    #[test]
    fn status_strings() {
        assert_eq!(ChecklistStatus::NotApplicable.to_string(), "Not_Applicable");
        assert_eq!(ChecklistStatus::NotReviewed.as_str(), "Not_Reviewed");
    }

    #[test]
    fn find_returns_last_duplicate() {
        let set = RuleResultSet {
            results: vec![
                RuleResult {
                    rule_id: "SV-1r1_rule".to_owned(),
                    result: "fail".to_owned(),
                },
                RuleResult {
                    rule_id: "SV-1r1_rule".to_owned(),
                    result: "pass".to_owned(),
                },
            ],
            ..RuleResultSet::default()
        };
        assert_eq!(
            set.find("SV-1r1_rule").unwrap().status(),
            ChecklistStatus::NotAFinding
        );
        assert!(set.find("SV-2r1_rule").is_none());
    }
}
