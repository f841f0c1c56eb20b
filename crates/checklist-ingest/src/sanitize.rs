//! 체크리스트 원문 공백 정리
//!
//! 저장 전에 모든 체크리스트(스캔 결과에서 변환된 것 포함)에 무조건 적용합니다.

/// 탭 문자를 모두 제거하고 `>\n<`를 `><`로 합칩니다.
pub fn sanitize(raw: &str) -> String {
    raw.replace('\t', "").replace(">\n<", "><")
}
