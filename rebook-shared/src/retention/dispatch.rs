/// Campaign dispatch
///
/// Runs a campaign on demand: validate, select due customers, send one
/// WhatsApp template message per customer concurrently, then record the run.
///
/// Checks happen in this order, and the first failure is returned:
///
/// 1. campaign exists
/// 2. campaign belongs to the requesting salon
/// 3. campaign's template exists
/// 4. salon exists
/// 5. salon has WhatsApp credentials
///
/// Send failures never fail the run; each one becomes a failed
/// [`SendResult`]. Once all sends settle the campaign's `last_run` is stamped
/// and the success count added to `messages_sent`, even if every send failed.
/// A run with no due customers sends nothing and records nothing.
///
/// There is no retry, rate limiting or deduplication: dispatching twice
/// messages every still-due customer twice.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::composer::{compose, MessageSettings};
use super::selector::due_customers;
use crate::models::campaign::Campaign;
use crate::models::customer::Customer;
use crate::models::salon::Salon;
use crate::models::template::Template;
use crate::store::{DynStore, StoreError};
use crate::whatsapp::{DynMessenger, WhatsAppCredentials};

/// Why a dispatch could not start
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Campaign not found")]
    CampaignNotFound,

    #[error("Unauthorized access to campaign")]
    Forbidden,

    #[error("Template not found")]
    TemplateNotFound,

    #[error("Salon not found")]
    SalonNotFound,

    #[error("WhatsApp API not configured")]
    WhatsAppNotConfigured,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one send
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub customer_id: Uuid,
    pub name: String,
    pub phone: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a dispatch run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Human-readable summary
    pub message: String,

    /// Customers a send was attempted for
    pub total: usize,

    pub sent: usize,

    pub failed: usize,

    /// When the run was recorded; `None` if nobody was due
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ran_at: Option<DateTime<Utc>>,

    pub results: Vec<SendResult>,
}

impl DispatchReport {
    fn nobody_due() -> Self {
        Self {
            message: "No customers due for reminders".to_string(),
            total: 0,
            sent: 0,
            failed: 0,
            ran_at: None,
            results: Vec::new(),
        }
    }

    fn from_results(results: Vec<SendResult>, ran_at: DateTime<Utc>) -> Self {
        let total = results.len();
        let sent = results.iter().filter(|r| r.success).count();

        Self {
            message: format!("Sent {sent} of {total} reminders"),
            total,
            sent,
            failed: total - sent,
            ran_at: Some(ran_at),
            results,
        }
    }
}

/// Everything a send needs once validation has passed
struct Prepared {
    campaign: Campaign,
    template: Template,
    salon: Salon,
    credentials: WhatsAppCredentials,
}

/// Runs campaigns against a store and a messenger
#[derive(Clone)]
pub struct CampaignDispatcher {
    store: DynStore,
    messenger: DynMessenger,
    settings: MessageSettings,
}

impl CampaignDispatcher {
    pub fn new(store: DynStore, messenger: DynMessenger, settings: MessageSettings) -> Self {
        Self {
            store,
            messenger,
            settings,
        }
    }

    /// Runs a campaign now
    pub async fn run(&self, campaign_id: Uuid, salon_id: &str) -> Result<DispatchReport, DispatchError> {
        self.run_at(campaign_id, salon_id, Utc::now()).await
    }

    /// Runs a campaign as of `now`
    pub async fn run_at(
        &self,
        campaign_id: Uuid,
        salon_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DispatchReport, DispatchError> {
        let prepared = self.prepare(campaign_id, salon_id).await?;

        let customers = self.store.list_all_customers(salon_id).await?;
        let due = due_customers(&prepared.campaign, customers, now);

        if due.is_empty() {
            info!(campaign_id = %campaign_id, salon_id = %salon_id, "No customers due");
            return Ok(DispatchReport::nobody_due());
        }

        info!(
            campaign_id = %campaign_id,
            salon_id = %salon_id,
            due = due.len(),
            "Dispatching campaign"
        );

        let results = join_all(due.iter().map(|customer| self.send_one(&prepared, customer))).await;

        let ran_at = Utc::now();
        let report = DispatchReport::from_results(results, ran_at);
        self.store
            .record_campaign_run(campaign_id, ran_at, report.sent as i64)
            .await?;

        info!(
            campaign_id = %campaign_id,
            sent = report.sent,
            failed = report.failed,
            "Campaign dispatched"
        );

        Ok(report)
    }

    /// Customers a campaign would message right now, without sending
    pub async fn preview(
        &self,
        campaign_id: Uuid,
        salon_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Customer>, DispatchError> {
        let campaign = self.owned_campaign(campaign_id, salon_id).await?;
        let customers = self.store.list_all_customers(salon_id).await?;
        Ok(due_customers(&campaign, customers, now))
    }

    async fn owned_campaign(&self, campaign_id: Uuid, salon_id: &str) -> Result<Campaign, DispatchError> {
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await?
            .ok_or(DispatchError::CampaignNotFound)?;

        if campaign.salon_id != salon_id {
            warn!(campaign_id = %campaign_id, salon_id = %salon_id, "Campaign owned by another salon");
            return Err(DispatchError::Forbidden);
        }

        Ok(campaign)
    }

    async fn prepare(&self, campaign_id: Uuid, salon_id: &str) -> Result<Prepared, DispatchError> {
        let campaign = self.owned_campaign(campaign_id, salon_id).await?;

        let template = self
            .store
            .get_template(campaign.template_id)
            .await?
            .ok_or(DispatchError::TemplateNotFound)?;

        let salon = self
            .store
            .get_salon(salon_id)
            .await?
            .ok_or(DispatchError::SalonNotFound)?;

        let credentials = salon
            .whatsapp_credentials()
            .ok_or(DispatchError::WhatsAppNotConfigured)?;

        Ok(Prepared {
            campaign,
            template,
            salon,
            credentials,
        })
    }

    async fn send_one(&self, prepared: &Prepared, customer: &Customer) -> SendResult {
        let outcome = match compose(&self.settings, &prepared.template, customer, &prepared.salon) {
            Ok(message) => {
                self.messenger
                    .send_template(&prepared.credentials, &message)
                    .await
            }
            Err(e) => Err(e),
        };

        let error = match outcome {
            Ok(()) => None,
            Err(e) => {
                warn!(customer_id = %customer.id, error = %e, "Reminder send failed");
                Some(e.to_string())
            }
        };

        SendResult {
            customer_id: customer.id,
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            success: error.is_none(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::campaign::NewCampaign;
    use crate::models::customer::NewCustomer;
    use crate::models::salon::{NewSalon, UpdateSalon};
    use crate::models::template::NewTemplate;
    use crate::models::visit::ServiceTags;
    use crate::store::{MemoryStore, Store};
    use crate::whatsapp::mock::MockMessenger;
    use chrono::Duration;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        messenger: MockMessenger,
        dispatcher: CampaignDispatcher,
        campaign_id: Uuid,
    }

    async fn fixture(configure_whatsapp: bool) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let messenger = MockMessenger::new();

        store
            .create_salon_if_absent(NewSalon {
                id: "s1".to_string(),
                email: "owner@glow.example".to_string(),
                salon_name: Some("Glow Studio".to_string()),
            })
            .await
            .unwrap();

        if configure_whatsapp {
            store
                .update_salon(
                    "s1",
                    UpdateSalon {
                        whatsapp_access_token: Some("token".to_string()),
                        whatsapp_phone_number_id: Some("1098765".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let template = store
            .add_template(NewTemplate {
                salon_id: "s1".to_string(),
                name: "Reminder".to_string(),
                content: "Hi {{name}}, time for your next {{service}} at {{salon}}!".to_string(),
            })
            .await
            .unwrap();

        let campaign = store
            .add_campaign(NewCampaign {
                salon_id: "s1".to_string(),
                name: "Monthly".to_string(),
                template_id: template.id,
                service_filter: None,
                days_since_visit: 30,
                active: true,
            })
            .await
            .unwrap();

        let dispatcher = CampaignDispatcher::new(
            store.clone(),
            Arc::new(messenger.clone()),
            MessageSettings::default(),
        );

        Fixture {
            store,
            messenger,
            dispatcher,
            campaign_id: campaign.id,
        }
    }

    async fn add_customer(store: &MemoryStore, name: &str, phone: &str, days_ago: i64) {
        store
            .add_customer(NewCustomer {
                salon_id: "s1".to_string(),
                name: name.to_string(),
                phone: phone.to_string(),
                notes: None,
                services: ServiceTags::single("Haircut").unwrap(),
                last_visit: Utc::now() - Duration::days(days_ago),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_sends_to_due_customers_and_records_run() {
        let f = fixture(true).await;
        add_customer(&f.store, "Asha", "555-123-4567", 40).await;
        add_customer(&f.store, "Bela", "555-987-6543", 45).await;
        add_customer(&f.store, "Chitra", "555-000-1111", 3).await;

        let report = f.dispatcher.run(f.campaign_id, "s1").await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.sent, 2);
        assert_eq!(report.message, "Sent 2 of 2 reminders");

        let sent = f.messenger.sent().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.phone_number_id == "1098765"));
        assert!(sent.iter().any(|m| m.message.to == "15551234567"
            && m.message.body_parameters() == vec!["Asha", "Haircut", "Glow Studio"]));

        let campaign = f.store.get_campaign(f.campaign_id).await.unwrap().unwrap();
        assert!(campaign.last_run.is_some());
        assert_eq!(campaign.messages_sent, 2);
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_run_still_recorded() {
        let f = fixture(true).await;
        add_customer(&f.store, "Asha", "555-123-4567", 40).await;
        f.messenger.fail_for("15551234567").await;

        let report = f.dispatcher.run(f.campaign_id, "s1").await.unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 1);
        assert!(!report.results[0].success);
        assert!(report.results[0].error.is_some());

        let campaign = f.store.get_campaign(f.campaign_id).await.unwrap().unwrap();
        assert!(campaign.last_run.is_some());
        assert_eq!(campaign.messages_sent, 0);
    }

    #[tokio::test]
    async fn test_nobody_due_records_nothing() {
        let f = fixture(true).await;
        add_customer(&f.store, "Asha", "555-123-4567", 3).await;

        let report = f.dispatcher.run(f.campaign_id, "s1").await.unwrap();

        assert_eq!(report.message, "No customers due for reminders");
        assert!(report.results.is_empty());
        let campaign = f.store.get_campaign(f.campaign_id).await.unwrap().unwrap();
        assert!(campaign.last_run.is_none());
    }

    #[tokio::test]
    async fn test_validation_order() {
        let f = fixture(false).await;

        let missing = f.dispatcher.run(Uuid::new_v4(), "s1").await.unwrap_err();
        assert!(matches!(missing, DispatchError::CampaignNotFound));

        let foreign = f.dispatcher.run(f.campaign_id, "s2").await.unwrap_err();
        assert!(matches!(foreign, DispatchError::Forbidden));

        let unconfigured = f.dispatcher.run(f.campaign_id, "s1").await.unwrap_err();
        assert!(matches!(unconfigured, DispatchError::WhatsAppNotConfigured));
    }

    #[tokio::test]
    async fn test_deleted_template_is_not_found() {
        let f = fixture(true).await;
        let campaign = f.store.get_campaign(f.campaign_id).await.unwrap().unwrap();
        f.store.delete_template(campaign.template_id).await.unwrap();

        let err = f.dispatcher.run(f.campaign_id, "s1").await.unwrap_err();
        assert!(matches!(err, DispatchError::TemplateNotFound));
    }

    #[tokio::test]
    async fn test_preview_lists_due_without_sending() {
        let f = fixture(true).await;
        add_customer(&f.store, "Asha", "555-123-4567", 40).await;
        add_customer(&f.store, "Bela", "555-987-6543", 1).await;

        let due = f.dispatcher.preview(f.campaign_id, "s1", Utc::now()).await.unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].name, "Asha");
        assert!(f.messenger.sent().await.is_empty());
    }
}
