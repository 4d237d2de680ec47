/// WhatsApp Business messaging
///
/// The [`Messenger`] trait is the seam between campaign dispatch and the
/// WhatsApp Cloud API. [`client::WhatsAppClient`] talks to the real API over
/// reqwest; [`mock::MockMessenger`] records messages in memory for tests.
///
/// # Example
///
/// ```no_run
/// use rebook_shared::whatsapp::client::{WhatsAppClient, WhatsAppConfig};
/// use rebook_shared::whatsapp::message::TemplateMessage;
/// use rebook_shared::whatsapp::{Messenger, WhatsAppCredentials};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WhatsAppClient::new(WhatsAppConfig::default())?;
/// let creds = WhatsAppCredentials {
///     access_token: "EAAG...".to_string(),
///     phone_number_id: "1098765".to_string(),
///     business_id: None,
/// };
///
/// let message = TemplateMessage::new("919876543210", "appointment_reminder", "en_US", vec![
///     "Asha".to_string(),
/// ]);
/// client.send_template(&creds, &message).await?;
/// # Ok(())
/// # }
/// ```

pub mod client;
pub mod message;
pub mod mock;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use message::TemplateMessage;

/// Per-salon WhatsApp Business credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppCredentials {
    /// Bearer token for the Cloud API
    pub access_token: String,

    /// Sending phone-number id
    pub phone_number_id: String,

    /// Business account id (informational)
    pub business_id: Option<String>,
}

/// Errors from sending a WhatsApp message
#[derive(Debug, Error)]
pub enum WhatsAppError {
    /// The request never produced a response
    #[error("WhatsApp request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("WhatsApp API returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The message was rejected before it was sent
    #[error("WhatsApp message rejected: {0}")]
    Rejected(String),
}

/// Sends template messages on behalf of a salon
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends one template message
    ///
    /// Success means the API accepted the message (any 2xx status); delivery
    /// is not tracked.
    async fn send_template(
        &self,
        credentials: &WhatsAppCredentials,
        message: &TemplateMessage,
    ) -> Result<(), WhatsAppError>;
}

/// Shared messenger handle
pub type DynMessenger = Arc<dyn Messenger>;
