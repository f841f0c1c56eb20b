//! 프로세스 내 이벤트 발행자
//!
//! [`ChannelPublisher`]는 발행된 이벤트를 bounded mpsc 채널로 넘깁니다.
//! 수신측은 데몬이 소유하며 브로커 전송 계층 자리를 대신합니다.
//!
//! ```text
//! ChecklistIngestor --publish--> ChannelPublisher --mpsc--> 소비자 태스크
//! ```

use std::future::Future;

use bytes::Bytes;
use stigpost_core::error::PublishError;
use stigpost_core::event::{EventPublisher, PublishedEvent, qualified_topic};
use stigpost_core::metrics as m;
use tokio::sync::mpsc;

/// mpsc 채널 기반 발행자
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<PublishedEvent>,
    topic_prefix: String,
}

impl ChannelPublisher {
    /// 발행자와 이벤트 수신 채널을 생성합니다.
    ///
    /// `topic_prefix`가 비어 있지 않으면 모든 토픽 앞에 붙습니다.
    pub fn new(
        capacity: usize,
        topic_prefix: impl Into<String>,
    ) -> (Self, mpsc::Receiver<PublishedEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                topic_prefix: topic_prefix.into(),
            },
            rx,
        )
    }

    /// 토픽 접두어
    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(
        &self,
        topic: &str,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        let topic = qualified_topic(&self.topic_prefix, topic);
        async move {
            let event = PublishedEvent::new(topic.clone(), payload);
            self.tx
                .send(event)
                .await
                .map_err(|e| PublishError::ChannelSend(e.to_string()))?;
            metrics::counter!(m::EVENTS_PUBLISHED_TOTAL, m::LABEL_TOPIC => topic).increment(1);
            Ok(())
        }
    }

    fn flush(&self) -> impl Future<Output = Result<(), PublishError>> + Send {
        // 채널에는 로컬 버퍼가 없으므로 수신측이 살아 있는지만 확인합니다.
        let closed = self.tx.is_closed();
        async move {
            if closed {
                Err(PublishError::Flush("event receiver dropped".to_owned()))
            } else {
                Ok(())
            }
        }
    }
}
