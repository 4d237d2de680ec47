/// PostgreSQL-backed [`Store`]
///
/// A thin adapter: every method delegates to the model's sqlx queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CustomerPage, Store, StoreError};
use crate::db::pool::health_check;
use crate::models::campaign::{Campaign, NewCampaign, UpdateCampaign};
use crate::models::customer::{Customer, NewCustomer, UpdateCustomer};
use crate::models::salon::{NewSalon, Salon, UpdateSalon};
use crate::models::service_history::{NewServiceHistory, ServiceHistory};
use crate::models::template::{NewTemplate, Template, UpdateTemplate};
use crate::models::visit::CurrentVisit;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }

    async fn get_salon(&self, id: &str) -> Result<Option<Salon>, StoreError> {
        Ok(Salon::find_by_id(&self.pool, id).await?)
    }

    async fn create_salon_if_absent(&self, salon: NewSalon) -> Result<Salon, StoreError> {
        Ok(Salon::create_if_absent(&self.pool, salon).await?)
    }

    async fn update_salon(
        &self,
        id: &str,
        update: UpdateSalon,
    ) -> Result<Option<Salon>, StoreError> {
        Ok(Salon::update(&self.pool, id, update).await?)
    }

    async fn list_customers_page(
        &self,
        salon_id: &str,
        page_size: usize,
        after: Option<Uuid>,
    ) -> Result<CustomerPage, StoreError> {
        let customers =
            Customer::list_page(&self.pool, salon_id, page_size as i64, after).await?;
        let total_count = Customer::count_by_salon(&self.pool, salon_id).await?;

        Ok(CustomerPage::new(customers, page_size, total_count))
    }

    async fn list_all_customers(&self, salon_id: &str) -> Result<Vec<Customer>, StoreError> {
        Ok(Customer::list_by_salon(&self.pool, salon_id).await?)
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(Customer::find_by_id(&self.pool, id).await?)
    }

    async fn add_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        Ok(Customer::create(&self.pool, customer).await?)
    }

    async fn update_customer(
        &self,
        id: Uuid,
        update: UpdateCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        Ok(Customer::update(&self.pool, id, update).await?)
    }

    async fn set_current_visit(
        &self,
        id: Uuid,
        visit: Option<CurrentVisit>,
    ) -> Result<bool, StoreError> {
        Ok(Customer::set_current_visit(&self.pool, id, visit.as_ref()).await?)
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Customer::delete(&self.pool, id).await?)
    }

    async fn list_service_history(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ServiceHistory>, StoreError> {
        Ok(ServiceHistory::list_by_customer(&self.pool, customer_id).await?)
    }

    async fn get_service_history(&self, id: Uuid) -> Result<Option<ServiceHistory>, StoreError> {
        Ok(ServiceHistory::find_by_id(&self.pool, id).await?)
    }

    async fn add_service_history(
        &self,
        entry: NewServiceHistory,
    ) -> Result<ServiceHistory, StoreError> {
        Ok(ServiceHistory::create(&self.pool, entry).await?)
    }

    async fn delete_service_history(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(ServiceHistory::delete(&self.pool, id).await?)
    }

    async fn list_templates(&self, salon_id: &str) -> Result<Vec<Template>, StoreError> {
        Ok(Template::list_by_salon(&self.pool, salon_id).await?)
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<Template>, StoreError> {
        Ok(Template::find_by_id(&self.pool, id).await?)
    }

    async fn add_template(&self, template: NewTemplate) -> Result<Template, StoreError> {
        Ok(Template::create(&self.pool, template).await?)
    }

    async fn update_template(
        &self,
        id: Uuid,
        update: UpdateTemplate,
    ) -> Result<Option<Template>, StoreError> {
        Ok(Template::update(&self.pool, id, update).await?)
    }

    async fn delete_template(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Template::delete(&self.pool, id).await?)
    }

    async fn list_campaigns(&self, salon_id: &str) -> Result<Vec<Campaign>, StoreError> {
        Ok(Campaign::list_by_salon(&self.pool, salon_id).await?)
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        Ok(Campaign::find_by_id(&self.pool, id).await?)
    }

    async fn add_campaign(&self, campaign: NewCampaign) -> Result<Campaign, StoreError> {
        Ok(Campaign::create(&self.pool, campaign).await?)
    }

    async fn update_campaign(
        &self,
        id: Uuid,
        update: UpdateCampaign,
    ) -> Result<Option<Campaign>, StoreError> {
        Ok(Campaign::update(&self.pool, id, update).await?)
    }

    async fn record_campaign_run(
        &self,
        id: Uuid,
        ran_at: DateTime<Utc>,
        sent: i64,
    ) -> Result<bool, StoreError> {
        Ok(Campaign::record_run(&self.pool, id, ran_at, sent).await?)
    }

    async fn delete_campaign(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Campaign::delete(&self.pool, id).await?)
    }
}
