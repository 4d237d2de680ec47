/// Persistence seam
///
/// Everything above the models (retention logic, HTTP handlers) reads and
/// writes through the [`Store`] trait. [`PgStore`] is the production
/// implementation over the sqlx models; [`MemoryStore`] keeps everything in
/// process and backs the test suites.
///
/// Ownership checks are not done here: the store returns records by id and
/// callers compare `salon_id`.

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::campaign::{Campaign, NewCampaign, UpdateCampaign};
use crate::models::customer::{Customer, NewCustomer, UpdateCustomer};
use crate::models::salon::{NewSalon, Salon, UpdateSalon};
use crate::models::service_history::{NewServiceHistory, ServiceHistory};
use crate::models::template::{NewTemplate, Template, UpdateTemplate};
use crate::models::visit::CurrentVisit;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One page of a salon's customers
#[derive(Debug, Clone, Serialize)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,

    /// Pass back as `after` to fetch the next page; `None` on the last page
    pub next_cursor: Option<Uuid>,

    /// Customers in the salon, across all pages
    pub total_count: i64,
}

impl CustomerPage {
    /// Assembles a page, setting the cursor only when the page came back full
    pub fn new(customers: Vec<Customer>, page_size: usize, total_count: i64) -> Self {
        let next_cursor = if customers.len() == page_size {
            customers.last().map(|c| c.id)
        } else {
            None
        };

        Self {
            customers,
            next_cursor,
            total_count,
        }
    }
}

/// Salon-partitioned record storage
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe for the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;

    // Salons

    async fn get_salon(&self, id: &str) -> Result<Option<Salon>, StoreError>;

    /// Creates the salon if no record with that id exists and returns the stored one
    async fn create_salon_if_absent(&self, salon: NewSalon) -> Result<Salon, StoreError>;

    async fn update_salon(&self, id: &str, update: UpdateSalon)
        -> Result<Option<Salon>, StoreError>;

    // Customers

    /// Customers ordered by name, `page_size` at a time, continuing after `after`
    async fn list_customers_page(
        &self,
        salon_id: &str,
        page_size: usize,
        after: Option<Uuid>,
    ) -> Result<CustomerPage, StoreError>;

    /// Every customer of a salon, ordered by name
    async fn list_all_customers(&self, salon_id: &str) -> Result<Vec<Customer>, StoreError>;

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;

    async fn add_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    async fn update_customer(
        &self,
        id: Uuid,
        update: UpdateCustomer,
    ) -> Result<Option<Customer>, StoreError>;

    /// Overwrites the cached current visit; returns false if the customer is gone
    async fn set_current_visit(
        &self,
        id: Uuid,
        visit: Option<CurrentVisit>,
    ) -> Result<bool, StoreError>;

    /// Deletes a customer and their history
    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError>;

    // Service history

    /// A customer's visits, most recently recorded first
    async fn list_service_history(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ServiceHistory>, StoreError>;

    async fn get_service_history(&self, id: Uuid) -> Result<Option<ServiceHistory>, StoreError>;

    async fn add_service_history(
        &self,
        entry: NewServiceHistory,
    ) -> Result<ServiceHistory, StoreError>;

    async fn delete_service_history(&self, id: Uuid) -> Result<bool, StoreError>;

    // Templates

    async fn list_templates(&self, salon_id: &str) -> Result<Vec<Template>, StoreError>;

    async fn get_template(&self, id: Uuid) -> Result<Option<Template>, StoreError>;

    async fn add_template(&self, template: NewTemplate) -> Result<Template, StoreError>;

    async fn update_template(
        &self,
        id: Uuid,
        update: UpdateTemplate,
    ) -> Result<Option<Template>, StoreError>;

    async fn delete_template(&self, id: Uuid) -> Result<bool, StoreError>;

    // Campaigns

    async fn list_campaigns(&self, salon_id: &str) -> Result<Vec<Campaign>, StoreError>;

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError>;

    async fn add_campaign(&self, campaign: NewCampaign) -> Result<Campaign, StoreError>;

    async fn update_campaign(
        &self,
        id: Uuid,
        update: UpdateCampaign,
    ) -> Result<Option<Campaign>, StoreError>;

    /// Stamps `last_run` and adds `sent` to the campaign's counter
    async fn record_campaign_run(
        &self,
        id: Uuid,
        ran_at: DateTime<Utc>,
        sent: i64,
    ) -> Result<bool, StoreError>;

    async fn delete_campaign(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Shared store handle
pub type DynStore = Arc<dyn Store>;
