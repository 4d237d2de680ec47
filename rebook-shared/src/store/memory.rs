/// In-process [`Store`]
///
/// Keeps every table in a `HashMap` behind one `tokio::sync::RwLock`. It
/// mirrors the PostgreSQL semantics the rest of the crate relies on: name
/// ordering, recording-order history, cascade deletes and blank-clears-field
/// updates. Used by the test suites and for running the API without a
/// database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CustomerPage, Store, StoreError};
use crate::models::campaign::{Campaign, NewCampaign, UpdateCampaign};
use crate::models::customer::{Customer, NewCustomer, UpdateCustomer};
use crate::models::salon::{NewSalon, Salon, UpdateSalon};
use crate::models::service_history::{NewServiceHistory, ServiceHistory};
use crate::models::template::{extract_variables, NewTemplate, Template, UpdateTemplate};
use crate::models::visit::CurrentVisit;

#[derive(Default)]
struct Tables {
    salons: HashMap<String, Salon>,
    customers: HashMap<Uuid, Customer>,
    /// History rows with their insertion sequence number
    history: HashMap<Uuid, (u64, ServiceHistory)>,
    templates: HashMap<Uuid, Template>,
    campaigns: HashMap<Uuid, Campaign>,
    next_seq: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_name(a_name: &str, a_id: Uuid, b_name: &str, b_id: Uuid) -> Ordering {
    a_name.cmp(b_name).then(a_id.cmp(&b_id))
}

fn sorted_customers(tables: &Tables, salon_id: &str) -> Vec<Customer> {
    let mut customers: Vec<Customer> = tables
        .customers
        .values()
        .filter(|c| c.salon_id == salon_id)
        .cloned()
        .collect();
    customers.sort_by(|a, b| by_name(&a.name, a.id, &b.name, b.id));
    customers
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_salon(&self, id: &str) -> Result<Option<Salon>, StoreError> {
        Ok(self.tables.read().await.salons.get(id).cloned())
    }

    async fn create_salon_if_absent(&self, salon: NewSalon) -> Result<Salon, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let stored = tables
            .salons
            .entry(salon.id.clone())
            .or_insert_with(|| Salon {
                id: salon.id,
                salon_name: salon.salon_name,
                email: salon.email,
                whatsapp_access_token: None,
                whatsapp_phone_number_id: None,
                whatsapp_business_id: None,
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn update_salon(
        &self,
        id: &str,
        update: UpdateSalon,
    ) -> Result<Option<Salon>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(salon) = tables.salons.get_mut(id) else {
            return Ok(None);
        };

        if let Some(name) = update.salon_name {
            salon.salon_name = Some(name);
        }
        if let Some(email) = update.email {
            salon.email = email;
        }
        if let Some(token) = update.whatsapp_access_token {
            salon.whatsapp_access_token = Some(token);
        }
        if let Some(phone_id) = update.whatsapp_phone_number_id {
            salon.whatsapp_phone_number_id = Some(phone_id);
        }
        if let Some(business_id) = update.whatsapp_business_id {
            salon.whatsapp_business_id = Some(business_id);
        }
        salon.updated_at = Utc::now();

        Ok(Some(salon.clone()))
    }

    async fn list_customers_page(
        &self,
        salon_id: &str,
        page_size: usize,
        after: Option<Uuid>,
    ) -> Result<CustomerPage, StoreError> {
        let tables = self.tables.read().await;
        let all = sorted_customers(&tables, salon_id);
        let total_count = all.len() as i64;

        let start = match after {
            None => 0,
            Some(cursor) => match tables.customers.get(&cursor) {
                Some(c) => all
                    .iter()
                    .position(|x| by_name(&x.name, x.id, &c.name, c.id) == Ordering::Greater)
                    .unwrap_or(all.len()),
                None => all.len(),
            },
        };

        let customers = all.into_iter().skip(start).take(page_size).collect();
        Ok(CustomerPage::new(customers, page_size, total_count))
    }

    async fn list_all_customers(&self, salon_id: &str) -> Result<Vec<Customer>, StoreError> {
        Ok(sorted_customers(&*self.tables.read().await, salon_id))
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn add_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let now = Utc::now();
        let stored = Customer {
            id: Uuid::new_v4(),
            salon_id: customer.salon_id,
            name: customer.name,
            phone: customer.phone,
            notes: customer.notes,
            current_visit: Some(CurrentVisit::new(customer.services, customer.last_visit)),
            created_at: now,
            updated_at: now,
        };

        self.tables
            .write()
            .await
            .customers
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_customer(
        &self,
        id: Uuid,
        update: UpdateCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(customer) = tables.customers.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            customer.name = name;
        }
        if let Some(phone) = update.phone {
            customer.phone = phone;
        }
        if update.notes.is_some() {
            customer.notes = blank_to_none(update.notes);
        }
        customer.updated_at = Utc::now();

        Ok(Some(customer.clone()))
    }

    async fn set_current_visit(
        &self,
        id: Uuid,
        visit: Option<CurrentVisit>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.customers.get_mut(&id) {
            Some(customer) => {
                customer.current_visit = visit;
                customer.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let removed = tables.customers.remove(&id).is_some();
        if removed {
            tables.history.retain(|_, (_, entry)| entry.customer_id != id);
        }
        Ok(removed)
    }

    async fn list_service_history(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ServiceHistory>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&(u64, ServiceHistory)> = tables
            .history
            .values()
            .filter(|(_, entry)| entry.customer_id == customer_id)
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(rows.into_iter().map(|(_, entry)| entry.clone()).collect())
    }

    async fn get_service_history(&self, id: Uuid) -> Result<Option<ServiceHistory>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .history
            .get(&id)
            .map(|(_, entry)| entry.clone()))
    }

    async fn add_service_history(
        &self,
        entry: NewServiceHistory,
    ) -> Result<ServiceHistory, StoreError> {
        let mut tables = self.tables.write().await;
        let stored = ServiceHistory {
            id: Uuid::new_v4(),
            customer_id: entry.customer_id,
            services: entry.services,
            visited_at: entry.visited_at,
            price: entry.price,
            notes: entry.notes,
            created_at: Utc::now(),
        };

        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.history.insert(stored.id, (seq, stored.clone()));
        Ok(stored)
    }

    async fn delete_service_history(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.history.remove(&id).is_some())
    }

    async fn list_templates(&self, salon_id: &str) -> Result<Vec<Template>, StoreError> {
        let tables = self.tables.read().await;
        let mut templates: Vec<Template> = tables
            .templates
            .values()
            .filter(|t| t.salon_id == salon_id)
            .cloned()
            .collect();
        templates.sort_by(|a, b| by_name(&a.name, a.id, &b.name, b.id));
        Ok(templates)
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<Template>, StoreError> {
        Ok(self.tables.read().await.templates.get(&id).cloned())
    }

    async fn add_template(&self, template: NewTemplate) -> Result<Template, StoreError> {
        let now = Utc::now();
        let stored = Template {
            id: Uuid::new_v4(),
            salon_id: template.salon_id,
            name: template.name,
            variables: extract_variables(&template.content),
            content: template.content,
            created_at: now,
            updated_at: now,
        };

        self.tables
            .write()
            .await
            .templates
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_template(
        &self,
        id: Uuid,
        update: UpdateTemplate,
    ) -> Result<Option<Template>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(template) = tables.templates.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            template.name = name;
        }
        if let Some(content) = update.content {
            template.variables = extract_variables(&content);
            template.content = content;
        }
        template.updated_at = Utc::now();

        Ok(Some(template.clone()))
    }

    async fn delete_template(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.templates.remove(&id).is_some())
    }

    async fn list_campaigns(&self, salon_id: &str) -> Result<Vec<Campaign>, StoreError> {
        let tables = self.tables.read().await;
        let mut campaigns: Vec<Campaign> = tables
            .campaigns
            .values()
            .filter(|c| c.salon_id == salon_id)
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| by_name(&a.name, a.id, &b.name, b.id));
        Ok(campaigns)
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        Ok(self.tables.read().await.campaigns.get(&id).cloned())
    }

    async fn add_campaign(&self, campaign: NewCampaign) -> Result<Campaign, StoreError> {
        let now = Utc::now();
        let stored = Campaign {
            id: Uuid::new_v4(),
            salon_id: campaign.salon_id,
            name: campaign.name,
            template_id: campaign.template_id,
            service_filter: blank_to_none(campaign.service_filter),
            days_since_visit: campaign.days_since_visit,
            active: campaign.active,
            last_run: None,
            messages_sent: 0,
            created_at: now,
            updated_at: now,
        };

        self.tables
            .write()
            .await
            .campaigns
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_campaign(
        &self,
        id: Uuid,
        update: UpdateCampaign,
    ) -> Result<Option<Campaign>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(campaign) = tables.campaigns.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            campaign.name = name;
        }
        if let Some(template_id) = update.template_id {
            campaign.template_id = template_id;
        }
        if update.service_filter.is_some() {
            campaign.service_filter = blank_to_none(update.service_filter);
        }
        if let Some(days) = update.days_since_visit {
            campaign.days_since_visit = days;
        }
        if let Some(active) = update.active {
            campaign.active = active;
        }
        campaign.updated_at = Utc::now();

        Ok(Some(campaign.clone()))
    }

    async fn record_campaign_run(
        &self,
        id: Uuid,
        ran_at: DateTime<Utc>,
        sent: i64,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.campaigns.get_mut(&id) {
            Some(campaign) => {
                campaign.last_run = Some(ran_at);
                campaign.messages_sent += sent;
                campaign.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_campaign(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.campaigns.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::visit::ServiceTags;

    fn new_customer(salon_id: &str, name: &str) -> NewCustomer {
        NewCustomer {
            salon_id: salon_id.to_string(),
            name: name.to_string(),
            phone: "5551234567".to_string(),
            notes: None,
            services: ServiceTags::single("Haircut").unwrap(),
            last_visit: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_customer_pages_follow_name_order() {
        let store = MemoryStore::new();
        for name in ["Zara", "Anil", "Meera", "Bela", "Kiran"] {
            store.add_customer(new_customer("s1", name)).await.unwrap();
        }
        store.add_customer(new_customer("s2", "Other")).await.unwrap();

        let first = store.list_customers_page("s1", 2, None).await.unwrap();
        let names: Vec<_> = first.customers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Anil", "Bela"]);
        assert_eq!(first.total_count, 5);
        assert!(first.next_cursor.is_some());

        let second = store
            .list_customers_page("s1", 2, first.next_cursor)
            .await
            .unwrap();
        let names: Vec<_> = second.customers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Kiran", "Meera"]);

        let last = store
            .list_customers_page("s1", 2, second.next_cursor)
            .await
            .unwrap();
        assert_eq!(last.customers.len(), 1);
        assert_eq!(last.customers[0].name, "Zara");
        assert!(last.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_history_newest_first_and_cascade() {
        let store = MemoryStore::new();
        let customer = store.add_customer(new_customer("s1", "Asha")).await.unwrap();

        for service in ["Haircut", "Color", "Spa"] {
            store
                .add_service_history(NewServiceHistory {
                    customer_id: customer.id,
                    services: ServiceTags::single(service).unwrap(),
                    visited_at: Utc::now(),
                    price: None,
                    notes: None,
                })
                .await
                .unwrap();
        }

        let history = store.list_service_history(customer.id).await.unwrap();
        let services: Vec<_> = history.iter().map(|h| h.services.primary()).collect();
        assert_eq!(services, vec!["Spa", "Color", "Haircut"]);

        assert!(store.delete_customer(customer.id).await.unwrap());
        assert!(store.list_service_history(customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_campaign_blank_filter_and_run_counter() {
        let store = MemoryStore::new();
        let campaign = store
            .add_campaign(NewCampaign {
                salon_id: "s1".to_string(),
                name: "Win-back".to_string(),
                template_id: Uuid::new_v4(),
                service_filter: Some(String::new()),
                days_since_visit: 30,
                active: true,
            })
            .await
            .unwrap();
        assert!(campaign.service_filter.is_none());

        let ran_at = Utc::now();
        store.record_campaign_run(campaign.id, ran_at, 3).await.unwrap();
        store.record_campaign_run(campaign.id, ran_at, 2).await.unwrap();

        let stored = store.get_campaign(campaign.id).await.unwrap().unwrap();
        assert_eq!(stored.messages_sent, 5);
        assert_eq!(stored.last_run, Some(ran_at));
    }

    #[tokio::test]
    async fn test_salon_create_if_absent_keeps_existing() {
        let store = MemoryStore::new();
        store
            .create_salon_if_absent(NewSalon {
                id: "uid".to_string(),
                email: "a@b.example".to_string(),
                salon_name: Some("First".to_string()),
            })
            .await
            .unwrap();

        let again = store
            .create_salon_if_absent(NewSalon {
                id: "uid".to_string(),
                email: "a@b.example".to_string(),
                salon_name: None,
            })
            .await
            .unwrap();

        assert_eq!(again.salon_name.as_deref(), Some("First"));
    }
}
