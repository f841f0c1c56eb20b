//! 이벤트 발행 -- 체크리스트 변경을 하위 소비자에게 알리는 통로
//!
//! 수집 파이프라인은 [`EventPublisher`] trait으로 이벤트를 발행합니다.
//! 발행은 fire-and-forget 방식입니다. 구독자의 수신 확인을 기다리지 않으며,
//! `flush()`는 로컬 버퍼를 비우는 것만 보장하고 전달은 보장하지 않습니다.
//!
//! 페이로드는 식별자의 UTF-8 텍스트이며 별도의 봉투 구조가 없습니다.

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PublishError;

// --- 토픽 상수 ---

/// 새 체크리스트 저장 (페이로드: 새 문서 ID)
pub const TOPIC_CHECKLIST_SAVE_NEW: &str = "checklist.save.new";
/// 체크리스트 업데이트 (페이로드: 문서 ID)
pub const TOPIC_CHECKLIST_SAVE_UPDATE: &str = "checklist.save.update";
/// 시스템 체크리스트 수 증가 (페이로드: 그룹 ID)
pub const TOPIC_SYSTEM_COUNT_ADD: &str = "system.count.add";

/// 접두어를 붙인 전체 토픽명을 만듭니다.
///
/// 접두어가 비어 있으면 토픽을 그대로 반환합니다.
/// 예: `("openrmf", "checklist.save.new")` -> `"openrmf.checklist.save.new"`
pub fn qualified_topic(prefix: &str, topic: &str) -> String {
    let prefix = prefix.trim_end_matches('.');
    if prefix.is_empty() {
        topic.to_owned()
    } else {
        format!("{prefix}.{topic}")
    }
}

/// 이벤트 발행 채널
///
/// 오케스트레이터가 생성 시 주입받아 소유하는 명시적 핸들입니다.
pub trait EventPublisher: Send + Sync + 'static {
    /// 토픽에 페이로드를 발행합니다.
    fn publish(
        &self,
        topic: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// 로컬 버퍼를 비웁니다.
    fn flush(&self) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// 발행된 이벤트 한 건
///
/// 프로세스 내 채널 발행자가 전달하는 단위입니다.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEvent {
    /// 이벤트 고유 ID (UUID v4)
    pub id: String,
    /// 발행 시각
    pub published_at: DateTime<Utc>,
    /// 전체 토픽명
    pub topic: String,
    /// 페이로드 (식별자 UTF-8 텍스트)
    #[serde(serialize_with = "serialize_payload")]
    pub payload: Bytes,
}

impl PublishedEvent {
    /// 새 이벤트를 생성합니다.
    pub fn new(topic: impl Into<String>, payload: Bytes) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            published_at: Utc::now(),
            topic: topic.into(),
            payload,
        }
    }

    /// 페이로드를 UTF-8 문자열로 해석합니다 (잘못된 바이트는 대체 문자로).
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

impl fmt::Display for PublishedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublishedEvent[{}] topic={} payload={}",
            &self.id[..8.min(self.id.len())],
            self.topic,
            self.payload_text(),
        )
    }
}

fn serialize_payload<S: serde::Serializer>(payload: &Bytes, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(payload))
}
