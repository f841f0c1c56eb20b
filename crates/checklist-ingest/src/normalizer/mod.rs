//! CKL 메타데이터 추출 -- 호스트명, STIG 제목, 릴리스 정보
//!
//! [`ChecklistNormalizer`]는 정제된 CKL XML을 파싱하여 문서 메타데이터를 뽑고,
//! [`abbreviation`] 테이블로 표시용 문자열을 줄입니다.
//!
//! # CKL 구조 (필요한 부분만)
//!
//! ```text
//! CHECKLIST
//! ├── ASSET
//! │   └── HOST_NAME            -> host_name
//! └── STIGS / iSTIG
//!     └── STIG_INFO
//!         └── SI_DATA*
//!             ├── SID_NAME     (키: "title", "releaseinfo", ...)
//!             └── SID_DATA     (값)
//! ```
//!
//! 첫 번째 `ASSET`, 첫 번째 `STIG_INFO`만 사용합니다.

pub mod abbreviation;

pub use abbreviation::{STIG_RELEASE_ABBREVIATIONS, STIG_TYPE_ABBREVIATIONS, abbreviate};

use roxmltree::{Document, Node, ParsingOptions};
use stigpost_core::types::{Artifact, UNKNOWN_HOST};

use crate::error::IngestError;

/// STIG_INFO 안에서 릴리스 정보를 담은 키
const KEY_RELEASE_INFO: &str = "releaseinfo";
/// STIG_INFO 안에서 STIG 제목을 담은 키
const KEY_TITLE: &str = "title";

/// 체크리스트에서 추출한 메타데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedChecklist {
    /// 호스트명 (없으면 `Unknown-Host`)
    pub host_name: String,
    /// 약어 처리된 STIG 제목 (없으면 빈 문자열)
    pub stig_type: String,
    /// 약어 처리된 릴리스 정보 (없으면 빈 문자열)
    pub stig_release: String,
}

impl NormalizedChecklist {
    /// 추출한 메타데이터로 새 문서를 만듭니다.
    pub fn into_artifact(self, raw_checklist: String) -> Artifact {
        let mut artifact = Artifact::new(raw_checklist);
        artifact.host_name = self.host_name;
        artifact.stig_type = self.stig_type;
        artifact.stig_release = self.stig_release;
        artifact
    }
}

/// CKL 메타데이터 추출기
///
/// 약어 테이블은 생성 시 주입되며 파싱 로직과 분리되어 있습니다.
pub struct ChecklistNormalizer {
    stig_type_table: &'static [(&'static str, &'static str)],
    stig_release_table: &'static [(&'static str, &'static str)],
}

impl ChecklistNormalizer {
    /// 기본 약어 테이블로 생성합니다.
    pub fn new() -> Self {
        Self::with_tables(STIG_TYPE_ABBREVIATIONS, STIG_RELEASE_ABBREVIATIONS)
    }

    /// 지정한 약어 테이블로 생성합니다.
    pub fn with_tables(
        stig_type_table: &'static [(&'static str, &'static str)],
        stig_release_table: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            stig_type_table,
            stig_release_table,
        }
    }

    /// 정제된 CKL XML에서 메타데이터를 추출합니다.
    ///
    /// 줄바꿈은 파싱 전에만 제거하며 저장되는 원문은 바뀌지 않습니다.
    ///
    /// # Errors
    ///
    /// XML이 올바르지 않으면 `IngestError::Parse`
    pub fn normalize(&self, checklist: &str) -> Result<NormalizedChecklist, IngestError> {
        let flattened = checklist.replace('\n', "");
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(&flattened, options)
            .map_err(|e| IngestError::parse("checklist", e))?;

        let host_name = extract_host_name(&doc);
        let (stig_type, stig_release) = extract_stig_info(&doc);

        Ok(NormalizedChecklist {
            host_name,
            stig_type: abbreviate(&stig_type, self.stig_type_table),
            stig_release: abbreviate(&stig_release, self.stig_release_table),
        })
    }
}

impl Default for ChecklistNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 첫 번째 ASSET의 직계 HOST_NAME 값. 비어 있지 않은 마지막 값이 이깁니다.
fn extract_host_name(doc: &Document<'_>) -> String {
    let mut host_name = UNKNOWN_HOST.to_owned();

    let Some(asset) = doc.descendants().find(|n| n.has_tag_name("ASSET")) else {
        return host_name;
    };

    for child in asset.children().filter(|n| n.has_tag_name("HOST_NAME")) {
        let text = inner_text(child);
        if !text.trim().is_empty() {
            host_name = text;
        }
    }

    host_name
}

/// 첫 번째 STIG_INFO에서 (title, releaseinfo)를 꺼냅니다.
///
/// 각 자식 요소의 첫 번째 요소가 키, 마지막 요소가 값입니다.
/// 값 요소가 없으면(자식 요소가 하나뿐이면) 빈 값으로 취급합니다.
fn extract_stig_info(doc: &Document<'_>) -> (String, String) {
    let mut stig_type = String::new();
    let mut stig_release = String::new();

    let Some(stig_info) = doc.descendants().find(|n| n.has_tag_name("STIG_INFO")) else {
        return (stig_type, stig_release);
    };

    for entry in stig_info.children().filter(Node::is_element) {
        let mut fields = entry.children().filter(Node::is_element);
        let Some(key) = fields.next() else {
            continue;
        };
        let value = fields.last().map(inner_text).unwrap_or_default();

        match inner_text(key).as_str() {
            KEY_RELEASE_INFO => stig_release = value,
            KEY_TITLE => stig_type = value,
            _ => {}
        }
    }

    (stig_type, stig_release)
}

/// 요소 아래 모든 텍스트 노드를 이어 붙입니다.
pub(crate) fn inner_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}
