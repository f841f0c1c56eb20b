//! 표시용 약어 테이블
//!
//! 테이블은 순서가 있는 (찾을 문자열, 바꿀 문자열) 목록입니다.
//! 긴 구문이 그 구문을 포함하는 짧은 구문보다 먼저 와야 합니다
//! (예: "MS SQL Server"가 "Server"보다 먼저).
//!
//! 전체적으로 멱등이 아닙니다. 두 번째 적용은 바꾼 문자열이 다른 항목의
//! 찾을 문자열을 포함하지 않는 경우에만 결과를 바꾸지 않습니다.

/// STIG 제목 약어 테이블
pub const STIG_TYPE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Security Technical Implementation Guide", "STIG"),
    ("Windows", "WIN"),
    ("Application Security and Development", "ASD"),
    ("Microsoft Internet Explorer", "MSIE"),
    ("Red Hat Enterprise Linux", "REL"),
    ("MS SQL Server", "MSSQL"),
    ("Server", "SVR"),
    ("Workstation", "WRK"),
];

/// STIG 릴리스 정보 약어 테이블
pub const STIG_RELEASE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Release: ", "R"),
    ("Benchmark Date:", "dated"),
];

/// 테이블의 각 항목을 순서대로 리터럴 치환합니다.
pub fn abbreviate(value: &str, table: &[(&str, &str)]) -> String {
    table
        .iter()
        .fold(value.to_owned(), |acc, (find, replace)| acc.replace(find, replace))
}
