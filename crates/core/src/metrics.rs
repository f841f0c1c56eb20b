//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `stigpost_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(stigpost_core::metrics::INGEST_FILES_TOTAL, "kind" => "ckl").increment(1);
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 파일 종류 레이블 키 (ckl, xccdf)
pub const LABEL_FILE_KIND: &str = "kind";

/// 에러 종류 레이블 키 (unsupported_file_type, parse, store ...)
pub const LABEL_ERROR_KIND: &str = "error";

/// 토픽 레이블 키
pub const LABEL_TOPIC: &str = "topic";

/// 흐름 레이블 키 (create, update)
pub const LABEL_FLOW: &str = "flow";

// ─── 수집 파이프라인 메트릭 ──────────────────────────────────────────

/// 저장까지 완료된 체크리스트 파일 수 (counter, label: kind, flow)
pub const INGEST_FILES_TOTAL: &str = "stigpost_ingest_files_total";

/// 수집 실패 수 (counter, label: error)
pub const INGEST_ERRORS_TOTAL: &str = "stigpost_ingest_errors_total";

/// 파일 한 건 처리 시간 (histogram, 초)
pub const INGEST_FILE_DURATION_SECONDS: &str = "stigpost_ingest_file_duration_seconds";

/// 발행된 이벤트 수 (counter, label: topic)
pub const EVENTS_PUBLISHED_TOTAL: &str = "stigpost_events_published_total";

/// 새로 생성된 시스템 그룹 수 (counter)
pub const SYSTEM_GROUPS_CREATED_TOTAL: &str = "stigpost_system_groups_created_total";

// ─── Daemon 메트릭 ────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "stigpost_daemon_uptime_seconds";

/// 파일 처리 시간 히스토그램 버킷 (초)
pub const INGEST_DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 직후 한 번 호출합니다. recorder가 없으면 아무 동작도 하지 않습니다.
pub fn describe_all() {
    describe_counter!(
        INGEST_FILES_TOTAL,
        "Checklist files persisted by the ingestion pipeline"
    );
    describe_counter!(
        INGEST_ERRORS_TOTAL,
        "Checklist ingestion failures by error kind"
    );
    describe_histogram!(
        INGEST_FILE_DURATION_SECONDS,
        "Time spent ingesting a single checklist file"
    );
    describe_counter!(
        EVENTS_PUBLISHED_TOTAL,
        "Notification events published by topic"
    );
    describe_counter!(
        SYSTEM_GROUPS_CREATED_TOTAL,
        "System groups created implicitly by uploads"
    );
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Stigpost daemon uptime in seconds");
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        INGEST_FILES_TOTAL,
        INGEST_ERRORS_TOTAL,
        INGEST_FILE_DURATION_SECONDS,
        EVENTS_PUBLISHED_TOTAL,
        SYSTEM_GROUPS_CREATED_TOTAL,
        DAEMON_UPTIME_SECONDS,
    ];

    #[test]
    fn all_metrics_start_with_stigpost_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("stigpost_"),
                "Metric '{}' does not start with 'stigpost_' prefix",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_FILE_KIND, LABEL_ERROR_KIND, LABEL_TOPIC, LABEL_FLOW] {
            assert_eq!(label.to_lowercase(), label);
        }
    }

    #[test]
    fn ingest_duration_buckets_are_sorted() {
        let buckets = INGEST_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(buckets[i] > buckets[i - 1]);
        }
    }
}
