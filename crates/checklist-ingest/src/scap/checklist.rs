//! CKL 쓰기 -- 스캔 결과로 골격 생성, 기존 체크리스트의 STATUS 재작성
//!
//! 재작성은 quick-xml 스트리밍으로 수행하며 `STATUS` 텍스트 외의 이벤트는
//! 원본 그대로 다시 씁니다.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{ChecklistStatus, RuleResultSet};
use crate::error::IngestError;

const SOURCE_NAME: &str = "checklist";
const RULE_ID_ATTRIBUTE: &str = "Rule_ID";

/// 스캔 결과로 CKL 골격을 생성합니다.
///
/// 규칙마다 `VULN` 하나를 만들고 `Rule_ID`와 변환된 `STATUS`만 채웁니다.
///
/// # Errors
///
/// 쓰기에 실패하면 `IngestError::Parse`
pub fn generate(results: &RuleResultSet) -> Result<String, IngestError> {
    let mut w = CklWriter::new();

    w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.start("CHECKLIST")?;

    w.start("ASSET")?;
    w.text_element("ROLE", "None")?;
    w.text_element("ASSET_TYPE", "Computing")?;
    w.text_element("HOST_NAME", &results.target)?;
    for empty in ["HOST_IP", "HOST_MAC", "HOST_FQDN", "TECH_AREA", "TARGET_KEY"] {
        w.text_element(empty, "")?;
    }
    w.text_element("WEB_OR_DATABASE", "false")?;
    w.end("ASSET")?;

    w.start("STIGS")?;
    w.start("iSTIG")?;

    w.start("STIG_INFO")?;
    w.si_data("title", &results.benchmark_title)?;
    w.si_data("releaseinfo", &results.benchmark_version)?;
    w.end("STIG_INFO")?;

    for rule in &results.results {
        w.start("VULN")?;
        w.start("STIG_DATA")?;
        w.text_element("VULN_ATTRIBUTE", RULE_ID_ATTRIBUTE)?;
        w.text_element("ATTRIBUTE_DATA", &rule.rule_id)?;
        w.end("STIG_DATA")?;
        w.text_element("STATUS", rule.status().as_str())?;
        for empty in ["FINDING_DETAILS", "COMMENTS", "SEVERITY_OVERRIDE", "SEVERITY_JUSTIFICATION"] {
            w.text_element(empty, "")?;
        }
        w.end("VULN")?;
    }

    w.end("iSTIG")?;
    w.end("STIGS")?;
    w.end("CHECKLIST")?;

    w.finish()
}

/// 기존 CKL의 `STATUS`를 스캔 결과로 갱신합니다.
///
/// `Rule_ID`에 결과가 있는 `VULN`만 대상입니다. `replace_all`이 `false`이면
/// 현재 상태가 `Not_Reviewed`이거나 비어 있는 항목만 바꿉니다.
///
/// # Errors
///
/// 기존 체크리스트가 올바른 XML이 아니면 `IngestError::Parse`
pub fn update(
    results: &RuleResultSet,
    existing: &str,
    replace_all: bool,
) -> Result<String, IngestError> {
    let mut reader = Reader::from_str(existing);
    let mut w = CklWriter::new();
    let mut state = VulnState::default();
    let mut changed = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| IngestError::parse(SOURCE_NAME, e))?;

        match event {
            Event::Eof => break,
            Event::Start(ref e) => {
                state.enter(e.local_name().as_ref());
                w.event(event)?;
            }
            Event::Text(ref e) if state.capturing() => {
                let text = e
                    .unescape()
                    .map_err(|err| IngestError::parse(SOURCE_NAME, err))?;
                if state.in_status {
                    state.status_text.push_str(&text);
                } else {
                    state.capture(&text);
                    w.event(event)?;
                }
            }
            Event::End(ref e) => {
                let name = e.local_name();
                if name.as_ref() == b"STATUS" && state.in_status {
                    let status = state.resolve_status(results, replace_all);
                    if status != state.status_text {
                        changed += 1;
                    }
                    w.text(&status)?;
                    state.in_status = false;
                }
                state.leave(name.as_ref());
                w.event(event)?;
            }
            Event::Empty(ref e) if state.in_vuln && e.local_name().as_ref() == b"STATUS" => {
                state.status_text.clear();
                let status = state.resolve_status(results, replace_all);
                if status.is_empty() {
                    w.event(event)?;
                } else {
                    changed += 1;
                    w.text_element("STATUS", &status)?;
                }
            }
            other => w.event(other)?,
        }
    }

    tracing::debug!(changed, replace_all, "checklist statuses rewritten");
    w.finish()
}

/// 스트리밍 중인 VULN의 상태
#[derive(Default)]
struct VulnState {
    in_vuln: bool,
    in_status: bool,
    /// 현재 텍스트를 모으는 요소 (VULN_ATTRIBUTE 또는 ATTRIBUTE_DATA)
    field: Option<Field>,
    last_attribute: String,
    rule_id: Option<String>,
    status_text: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Attribute,
    Data,
}

impl VulnState {
    fn enter(&mut self, name: &[u8]) {
        match name {
            b"VULN" => {
                *self = Self {
                    in_vuln: true,
                    ..Self::default()
                };
            }
            b"VULN_ATTRIBUTE" if self.in_vuln => {
                self.field = Some(Field::Attribute);
                self.last_attribute.clear();
            }
            b"ATTRIBUTE_DATA" if self.in_vuln => self.field = Some(Field::Data),
            b"STATUS" if self.in_vuln => {
                self.in_status = true;
                self.status_text.clear();
            }
            _ => {}
        }
    }

    fn leave(&mut self, name: &[u8]) {
        match name {
            b"VULN" => *self = Self::default(),
            b"VULN_ATTRIBUTE" | b"ATTRIBUTE_DATA" => self.field = None,
            _ => {}
        }
    }

    fn capturing(&self) -> bool {
        self.in_status || self.field.is_some()
    }

    fn capture(&mut self, text: &str) {
        match self.field {
            Some(Field::Attribute) => self.last_attribute.push_str(text),
            Some(Field::Data) if self.last_attribute.trim() == RULE_ID_ATTRIBUTE => {
                self.rule_id
                    .get_or_insert_with(String::new)
                    .push_str(text.trim());
            }
            _ => {}
        }
    }

    /// 쓸 STATUS 값을 정합니다. 바꾸지 않으면 현재 값을 그대로 반환합니다.
    fn resolve_status(&self, results: &RuleResultSet, replace_all: bool) -> String {
        let current = self.status_text.trim();
        let replaceable = replace_all
            || current.is_empty()
            || current == ChecklistStatus::NotReviewed.as_str();

        match self.rule_id.as_deref().and_then(|id| results.find(id)) {
            Some(rule) if replaceable => rule.status().as_str().to_owned(),
            _ => self.status_text.clone(),
        }
    }
}

/// quick-xml Writer 래퍼
struct CklWriter {
    writer: Writer<Vec<u8>>,
}

impl CklWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event<'a>(&mut self, event: impl Into<Event<'a>>) -> Result<(), IngestError> {
        self.writer
            .write_event(event)
            .map_err(|e| IngestError::parse(SOURCE_NAME, e))
    }

    fn start(&mut self, name: &str) -> Result<(), IngestError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), IngestError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<(), IngestError> {
        if text.is_empty() {
            return Ok(());
        }
        self.event(Event::Text(BytesText::new(text)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), IngestError> {
        self.start(name)?;
        self.text(text)?;
        self.end(name)
    }

    fn si_data(&mut self, key: &str, value: &str) -> Result<(), IngestError> {
        self.start("SI_DATA")?;
        self.text_element("SID_NAME", key)?;
        self.text_element("SID_DATA", value)?;
        self.end("SI_DATA")
    }

    fn finish(self) -> Result<String, IngestError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| IngestError::parse(SOURCE_NAME, e))
    }
}
