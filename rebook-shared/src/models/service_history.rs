/// Service history model and database operations
///
/// One row per recorded visit. Rows are ordered by `created_at` (the time the
/// visit was recorded, not the visit date), newest first; the newest row is the
/// one mirrored onto the customer.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE service_history (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
///     services TEXT[] NOT NULL,
///     visited_at TIMESTAMPTZ NOT NULL,
///     price TEXT,
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::visit::{CurrentVisit, ServiceTags};

/// A recorded visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHistory {
    pub id: Uuid,

    pub customer_id: Uuid,

    pub services: ServiceTags,

    /// Date of the visit
    pub visited_at: DateTime<Utc>,

    /// Free-text price as entered
    pub price: Option<String>,

    pub notes: Option<String>,

    /// When the row was recorded
    pub created_at: DateTime<Utc>,
}

impl ServiceHistory {
    /// The customer cache value this row produces
    pub fn as_current_visit(&self) -> CurrentVisit {
        CurrentVisit::new(self.services.clone(), self.visited_at)
    }
}

#[derive(sqlx::FromRow)]
struct ServiceHistoryRow {
    id: Uuid,
    customer_id: Uuid,
    services: Vec<String>,
    visited_at: DateTime<Utc>,
    price: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ServiceHistoryRow> for ServiceHistory {
    type Error = sqlx::Error;

    fn try_from(row: ServiceHistoryRow) -> Result<Self, Self::Error> {
        let services =
            ServiceTags::new(row.services).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self {
            id: row.id,
            customer_id: row.customer_id,
            services,
            visited_at: row.visited_at,
            price: row.price,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

/// Input for recording a visit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceHistory {
    pub customer_id: Uuid,
    pub services: ServiceTags,
    pub visited_at: DateTime<Utc>,
    pub price: Option<String>,
    pub notes: Option<String>,
}

const HISTORY_COLUMNS: &str = "id, customer_id, services, visited_at, price, notes, created_at";

impl ServiceHistory {
    /// Records a visit
    pub async fn create(pool: &PgPool, data: NewServiceHistory) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_history (customer_id, services, visited_at, price, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {HISTORY_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ServiceHistoryRow>(&query)
            .bind(data.customer_id)
            .bind(data.services.as_slice())
            .bind(data.visited_at)
            .bind(&data.price)
            .bind(&data.notes)
            .fetch_one(pool)
            .await?;

        row.try_into()
    }

    /// Finds a history row by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {HISTORY_COLUMNS} FROM service_history WHERE id = $1");
        let row = sqlx::query_as::<_, ServiceHistoryRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// A customer's visits, most recently recorded first
    pub async fn list_by_customer(
        pool: &PgPool,
        customer_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM service_history \
             WHERE customer_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ServiceHistoryRow>(&query)
            .bind(customer_id)
            .fetch_all(pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Deletes a history row
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM service_history WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
