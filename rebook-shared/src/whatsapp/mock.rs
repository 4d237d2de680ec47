/// In-memory messenger for tests
///
/// Records every message it is asked to send. Recipients registered with
/// [`MockMessenger::fail_for`] get a 400 response instead.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::message::TemplateMessage;
use super::{Messenger, WhatsAppCredentials, WhatsAppError};

#[derive(Clone, Default)]
pub struct MockMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

/// A message the mock accepted
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub phone_number_id: String,
    pub message: TemplateMessage,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sends to `to` (normalized number) fail
    pub async fn fail_for(&self, to: &str) {
        self.failing.lock().await.insert(to.to_string());
    }

    /// Messages accepted so far
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_template(
        &self,
        credentials: &WhatsAppCredentials,
        message: &TemplateMessage,
    ) -> Result<(), WhatsAppError> {
        if self.failing.lock().await.contains(&message.to) {
            return Err(WhatsAppError::Http {
                status: 400,
                body: format!("recipient {} not reachable", message.to),
            });
        }

        self.sent.lock().await.push(SentMessage {
            phone_number_id: credentials.phone_number_id.clone(),
            message: message.clone(),
        });
        Ok(())
    }
}
