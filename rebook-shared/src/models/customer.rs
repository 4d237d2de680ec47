/// Customer model and database operations
///
/// A customer belongs to one salon and carries a cached copy of their most
/// recent visit (`services` + `last_visit`). The cache is written only through
/// [`Customer::set_current_visit`]; see [`crate::retention::history`] for
/// when that happens.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE customers (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     salon_id TEXT NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
///     name TEXT NOT NULL,
///     phone TEXT NOT NULL,
///     services TEXT[] NOT NULL DEFAULT '{}',
///     last_visit TIMESTAMPTZ,
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::visit::{CurrentVisit, ServiceTags};

/// Salon customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,

    /// Owning salon
    pub salon_id: String,

    pub name: String,

    /// Phone number as entered; normalized only when a message is sent
    pub phone: String,

    pub notes: Option<String>,

    /// Copy of the newest service-history row, `None` if there is none
    pub current_visit: Option<CurrentVisit>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Primary service of the current visit
    pub fn primary_service(&self) -> Option<&str> {
        self.current_visit.as_ref().map(CurrentVisit::primary_service)
    }

    pub fn last_visit(&self) -> Option<DateTime<Utc>> {
        self.current_visit.as_ref().map(|v| v.last_visit)
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    salon_id: String,
    name: String,
    phone: String,
    services: Vec<String>,
    last_visit: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            salon_id: row.salon_id,
            name: row.name,
            phone: row.phone,
            notes: row.notes,
            current_visit: CurrentVisit::from_columns(row.services, row.last_visit),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a customer together with their first visit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub salon_id: String,
    pub name: String,
    pub phone: String,
    pub notes: Option<String>,
    pub services: ServiceTags,
    pub last_visit: DateTime<Utc>,
}

/// Contact fields that can be edited; `None` leaves a field untouched
///
/// Visits are not edited here; they change through service history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

const CUSTOMER_COLUMNS: &str =
    "id, salon_id, name, phone, services, last_visit, notes, created_at, updated_at";

impl Customer {
    /// Inserts a customer with their first visit cached
    pub async fn create(pool: &PgPool, data: NewCustomer) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO customers (salon_id, name, phone, notes, services, last_visit) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CUSTOMER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, CustomerRow>(&query)
            .bind(&data.salon_id)
            .bind(&data.name)
            .bind(&data.phone)
            .bind(&data.notes)
            .bind(data.services.as_slice())
            .bind(data.last_visit)
            .fetch_one(pool)
            .await?;

        Ok(row.into())
    }

    /// Finds a customer by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Every customer of a salon, ordered by name
    pub async fn list_by_salon(pool: &PgPool, salon_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE salon_id = $1 ORDER BY name, id"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&query)
            .bind(salon_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One page of a salon's customers in `(name, id)` order
    ///
    /// `after` is the id of the last customer on the previous page. An id
    /// that no longer exists yields an empty page.
    pub async fn list_page(
        pool: &PgPool,
        salon_id: &str,
        limit: i64,
        after: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE salon_id = $1 \
             AND ($2::uuid IS NULL OR (name, id) > (SELECT name, id FROM customers WHERE id = $2)) \
             ORDER BY name, id \
             LIMIT $3"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&query)
            .bind(salon_id)
            .bind(after)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number of customers in a salon
    pub async fn count_by_salon(pool: &PgPool, salon_id: &str) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers WHERE salon_id = $1")
            .bind(salon_id)
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }

    /// Updates contact fields
    ///
    /// Returns `None` if the customer doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCustomer,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE customers SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone = ${bind_count}"));
        }
        if data.notes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", notes = NULLIF(${bind_count}, '')"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {CUSTOMER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, CustomerRow>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }
        if let Some(notes) = data.notes {
            q = q.bind(notes);
        }

        let row = q.fetch_optional(pool).await?;
        Ok(row.map(Into::into))
    }

    /// Overwrites the cached current visit, clearing it when `visit` is `None`
    ///
    /// Returns false if the customer doesn't exist.
    pub async fn set_current_visit(
        pool: &PgPool,
        id: Uuid,
        visit: Option<&CurrentVisit>,
    ) -> Result<bool, sqlx::Error> {
        let services: Vec<String> = visit
            .map(|v| v.services.as_slice().to_vec())
            .unwrap_or_default();

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET services = $2, last_visit = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(services)
        .bind(visit.map(|v| v.last_visit))
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a customer; their history goes with them (ON DELETE CASCADE)
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
