//! Notification dispatcher — best-effort fan-out of one message to many
//! chats.
//!
//! Failure handling is two-tiered: a flood-control signal suspends
//! delivery to that recipient for `retry_after + 1` seconds and retries
//! (bounded); any other failure skips the recipient. A failure for one
//! recipient never aborts delivery to the rest.

use std::sync::Arc;
use std::time::Duration;

use budvabot_core::types::{MessageFormat, OutboundMessage};

use crate::{MessageSender, SendError};

/// Retries per recipient per message are capped regardless of config.
const RETRY_HARD_CAP: u32 = 3;

/// Per-delivery outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub skipped: usize,
}

pub struct Dispatcher {
    sender: Arc<dyn MessageSender>,
    pacing: Duration,
    max_retries: u32,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn MessageSender>, pacing_ms: u64, max_retries: u32) -> Self {
        Self {
            sender,
            pacing: Duration::from_millis(pacing_ms),
            max_retries: max_retries.min(RETRY_HARD_CAP),
        }
    }

    /// Deliver `text` to every recipient. Ordering among recipients is
    /// not guaranteed or required.
    pub async fn deliver(
        &self,
        recipients: &[i64],
        text: &str,
        format: MessageFormat,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (i, &chat_id) in recipients.iter().enumerate() {
            let message = OutboundMessage {
                chat_id,
                text: text.to_string(),
                format,
            };

            if self.deliver_one(&message).await {
                report.delivered += 1;
            } else {
                report.skipped += 1;
            }

            // Platform-wide pacing between provider sends, independent
            // of per-recipient flood-control backoff.
            if i + 1 < recipients.len() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        tracing::info!(
            "Dispatch done: {} delivered, {} skipped of {}",
            report.delivered,
            report.skipped,
            recipients.len()
        );
        report
    }

    async fn deliver_one(&self, message: &OutboundMessage) -> bool {
        let mut retries_left = self.max_retries;
        loop {
            match self.sender.send(message).await {
                Ok(()) => return true,
                Err(SendError::RetryAfter(secs)) => {
                    if retries_left == 0 {
                        tracing::warn!(
                            "Chat {} still rate limited, giving up on this message",
                            message.chat_id
                        );
                        return false;
                    }
                    retries_left -= 1;
                    tracing::warn!(
                        "Chat {} rate limited, retrying in {}s",
                        message.chat_id,
                        secs + 1
                    );
                    tokio::time::sleep(Duration::from_secs(secs + 1)).await;
                }
                Err(SendError::Failed(reason)) => {
                    tracing::warn!("Skipping chat {}: {}", message.chat_id, reason);
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Scripted sender: pops the next result for each chat id and
    /// records every attempt with its timestamp.
    struct ScriptedSender {
        script: Mutex<Vec<(i64, Result<(), SendError>)>>,
        attempts: Mutex<Vec<(i64, Instant)>>,
    }

    impl ScriptedSender {
        fn new(script: Vec<(i64, Result<(), SendError>)>) -> Self {
            Self {
                script: Mutex::new(script),
                attempts: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> Vec<(i64, Instant)> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSender for ScriptedSender {
        async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
            self.attempts
                .lock()
                .unwrap()
                .push((message.chat_id, Instant::now()));
            let mut script = self.script.lock().unwrap();
            let pos = script
                .iter()
                .position(|(id, _)| *id == message.chat_id)
                .expect("unexpected send");
            script.remove(pos).1
        }
    }

    fn fail() -> Result<(), SendError> {
        Err(SendError::Failed("chat not found".into()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_does_not_cascade() {
        let sender = Arc::new(ScriptedSender::new(vec![
            (1, Ok(())),
            (2, fail()),
            (3, Ok(())),
        ]));
        let dispatcher = Dispatcher::new(sender.clone(), 1200, 1);

        let report = dispatcher
            .deliver(&[1, 2, 3], "water dropped", MessageFormat::Plain)
            .await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 1);
        let chats: Vec<i64> = sender.attempts().iter().map(|(id, _)| *id).collect();
        assert_eq!(chats, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retries_once_after_wait() {
        let sender = Arc::new(ScriptedSender::new(vec![
            (1, Err(SendError::RetryAfter(7))),
            (1, Ok(())),
        ]));
        let dispatcher = Dispatcher::new(sender.clone(), 1200, 1);

        let report = dispatcher.deliver(&[1], "hello", MessageFormat::Plain).await;

        assert_eq!(report.delivered, 1);
        let attempts = sender.attempts();
        assert_eq!(attempts.len(), 2);
        // Waited at least retry_after + 1 seconds before the retry.
        let waited = attempts[1].1 - attempts[0].1;
        assert!(waited >= Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_gives_up_after_bounded_retries() {
        let sender = Arc::new(ScriptedSender::new(vec![
            (1, Err(SendError::RetryAfter(2))),
            (1, Err(SendError::RetryAfter(2))),
            (2, Ok(())),
        ]));
        let dispatcher = Dispatcher::new(sender.clone(), 1200, 1);

        let report = dispatcher.deliver(&[1, 2], "hi", MessageFormat::Plain).await;

        // Exactly one retry for chat 1, then skip; chat 2 unaffected.
        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 1);
        let chats: Vec<i64> = sender.attempts().iter().map(|(id, _)| *id).collect();
        assert_eq!(chats, vec![1, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_sends() {
        let sender = Arc::new(ScriptedSender::new(vec![(1, Ok(())), (2, Ok(()))]));
        let dispatcher = Dispatcher::new(sender.clone(), 1200, 1);

        dispatcher.deliver(&[1, 2], "hi", MessageFormat::Plain).await;

        let attempts = sender.attempts();
        let gap = attempts[1].1 - attempts[0].1;
        assert!(gap >= Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_config_is_hard_capped() {
        let script: Vec<(i64, Result<(), SendError>)> = (0..4)
            .map(|_| (1, Err(SendError::RetryAfter(1))))
            .collect();
        let sender = Arc::new(ScriptedSender::new(script));
        let dispatcher = Dispatcher::new(sender.clone(), 0, 99);

        let report = dispatcher.deliver(&[1], "hi", MessageFormat::Plain).await;

        assert_eq!(report.skipped, 1);
        // 1 initial attempt + RETRY_HARD_CAP retries.
        assert_eq!(sender.attempts().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_recipient_set() {
        let sender = Arc::new(ScriptedSender::new(vec![]));
        let dispatcher = Dispatcher::new(sender.clone(), 1200, 1);
        let report = dispatcher.deliver(&[], "hi", MessageFormat::Plain).await;
        assert_eq!(report, DeliveryReport::default());
    }
}
