/// Service history and the customer visit cache
///
/// `Customer::current_visit` is derived from the customer's service history:
/// it always equals the most recently recorded row, or `None` when there are
/// no rows. Every write that can change the newest row goes through this
/// module:
///
/// - [`register_customer`] creates the customer and an "Initial visit" row
/// - [`record_visit`] adds a row and makes it the current visit
/// - [`remove_visit`] deletes a row and recomputes the cache from what remains
///
/// Writes are not transactional; the cache update follows the history write.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::customer::{Customer, NewCustomer};
use crate::models::service_history::{NewServiceHistory, ServiceHistory};
use crate::models::visit::{CurrentVisit, ServiceTags};
use crate::store::{Store, StoreError};

/// Notes recorded on the history row created with a new customer
pub const INITIAL_VISIT_NOTE: &str = "Initial visit";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Service history entry not found")]
    EntryNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A visit to record against an existing customer
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub services: ServiceTags,
    pub visited_at: DateTime<Utc>,
    pub price: Option<String>,
    pub notes: Option<String>,
}

/// Creates a customer with their first visit and its backing history row
pub async fn register_customer(
    store: &dyn Store,
    customer: NewCustomer,
) -> Result<(Customer, ServiceHistory), HistoryError> {
    let services = customer.services.clone();
    let visited_at = customer.last_visit;

    let customer = store.add_customer(customer).await?;
    let entry = store
        .add_service_history(NewServiceHistory {
            customer_id: customer.id,
            services,
            visited_at,
            price: None,
            notes: Some(INITIAL_VISIT_NOTE.to_string()),
        })
        .await?;

    info!(customer_id = %customer.id, salon_id = %customer.salon_id, "Customer registered");
    Ok((customer, entry))
}

/// Records a visit and makes it the customer's current visit
pub async fn record_visit(
    store: &dyn Store,
    customer: &Customer,
    visit: NewVisit,
) -> Result<ServiceHistory, HistoryError> {
    let entry = store
        .add_service_history(NewServiceHistory {
            customer_id: customer.id,
            services: visit.services,
            visited_at: visit.visited_at,
            price: visit.price,
            notes: visit.notes,
        })
        .await?;

    store
        .set_current_visit(customer.id, Some(entry.as_current_visit()))
        .await?;

    info!(customer_id = %customer.id, history_id = %entry.id, "Visit recorded");
    Ok(entry)
}

/// Deletes one of a customer's history rows and resyncs the cache
///
/// Returns the customer's current visit after the delete. The cache is only
/// written when it changes, which is when the deleted row was the newest.
pub async fn remove_visit(
    store: &dyn Store,
    customer: &Customer,
    history_id: Uuid,
) -> Result<Option<CurrentVisit>, HistoryError> {
    let entry = store
        .get_service_history(history_id)
        .await?
        .filter(|entry| entry.customer_id == customer.id)
        .ok_or(HistoryError::EntryNotFound)?;

    if !store.delete_service_history(entry.id).await? {
        return Err(HistoryError::EntryNotFound);
    }

    let remaining = store.list_service_history(customer.id).await?;
    let current = remaining.first().map(ServiceHistory::as_current_visit);

    if current != customer.current_visit {
        store.set_current_visit(customer.id, current.clone()).await?;
        info!(customer_id = %customer.id, cleared = current.is_none(), "Current visit resynced");
    }

    Ok(current)
}
