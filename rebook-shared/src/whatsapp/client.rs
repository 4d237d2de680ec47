/// WhatsApp Cloud API client
///
/// Posts template messages to `{base_url}/{api_version}/{phone_number_id}/messages`
/// with the salon's bearer token. One shared `reqwest::Client` serves every
/// salon; credentials are passed per call.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::message::TemplateMessage;
use super::{Messenger, WhatsAppCredentials, WhatsAppError};

/// Client settings
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Graph API base URL, without a trailing slash
    pub base_url: String,

    /// Graph API version segment, e.g. `v17.0`
    pub api_version: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            api_version: "v17.0".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`Messenger`] backed by the WhatsApp Cloud API
#[derive(Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> Result<Self, WhatsAppError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Messages endpoint for a sending phone number
    pub fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            phone_number_id
        )
    }
}

#[async_trait]
impl Messenger for WhatsAppClient {
    async fn send_template(
        &self,
        credentials: &WhatsAppCredentials,
        message: &TemplateMessage,
    ) -> Result<(), WhatsAppError> {
        let url = self.messages_url(&credentials.phone_number_id);
        debug!(to = %message.to, template = %message.template.name, "Sending WhatsApp template");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), to = %message.to, "WhatsApp API rejected message");

        Err(WhatsAppError::Http {
            status: status.as_u16(),
            body,
        })
    }
}
