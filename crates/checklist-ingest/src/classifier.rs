//! 업로드 파일 종류 판별
//!
//! 파일명 확장자(대소문자 무시)로 원본 체크리스트(`.ckl`)와
//! 스캔 결과(`.xml`)를 구분합니다. 그 외 확장자는 해당 파일만 거부됩니다.

use std::fmt;

use crate::error::IngestError;

/// 업로드 파일 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// CKL 체크리스트 원문
    RawChecklist,
    /// XCCDF/SCAP 스캔 결과
    ScanResult,
}

impl FileKind {
    /// 메트릭 레이블용 이름
    pub fn label(&self) -> &'static str {
        match self {
            Self::RawChecklist => "ckl",
            Self::ScanResult => "xccdf",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 파일 종류 판별기
///
/// 확장자 목록은 앞에서부터 순서대로 검사합니다.
pub struct FileTypeClassifier {
    /// (확장자, 종류) 목록. 확장자는 소문자, 점 포함
    known_extensions: Vec<(&'static str, FileKind)>,
}

impl FileTypeClassifier {
    /// 기본 확장자(`.ckl`, `.xml`)로 판별기를 생성합니다.
    pub fn new() -> Self {
        Self {
            known_extensions: vec![(".ckl", FileKind::RawChecklist), (".xml", FileKind::ScanResult)],
        }
    }

    /// 알려진 확장자 목록을 반환합니다.
    pub fn known_extensions(&self) -> &[(&'static str, FileKind)] {
        &self.known_extensions
    }

    /// 파일명으로 종류를 판별합니다.
    ///
    /// # Errors
    ///
    /// 알려진 확장자로 끝나지 않으면 `IngestError::UnsupportedFileType`
    pub fn classify(&self, filename: &str) -> Result<FileKind, IngestError> {
        let lower = filename.to_lowercase();
        self.known_extensions
            .iter()
            .find(|(ext, _)| lower.ends_with(ext))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| IngestError::UnsupportedFileType {
                filename: filename.to_owned(),
            })
    }
}

impl Default for FileTypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}
