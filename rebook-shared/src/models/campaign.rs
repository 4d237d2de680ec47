/// Campaign model and database operations
///
/// A campaign pairs a template with a selection rule: customers whose last
/// visit is at least `days_since_visit` days old, optionally restricted to a
/// primary service. Each dispatch run stamps `last_run` and adds to
/// `messages_sent`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE campaigns (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     salon_id TEXT NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
///     name TEXT NOT NULL,
///     template_id UUID NOT NULL,
///     service_filter TEXT,
///     days_since_visit INTEGER NOT NULL,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     last_run TIMESTAMPTZ,
///     messages_sent BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use rebook_shared::models::campaign::{Campaign, NewCampaign};
/// use rebook_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let campaign = Campaign::create(&pool, NewCampaign {
///     salon_id: "uid-1".to_string(),
///     name: "Haircut follow-up".to_string(),
///     template_id: Uuid::new_v4(),
///     service_filter: Some("Haircut".to_string()),
///     days_since_visit: 30,
///     active: true,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Follow-up campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: Uuid,

    pub salon_id: String,

    pub name: String,

    /// Template sent to due customers
    pub template_id: Uuid,

    /// Restricts the campaign to customers whose primary service matches
    pub service_filter: Option<String>,

    /// Minimum age of the last visit, in days (1..=365)
    pub days_since_visit: i32,

    pub active: bool,

    /// When the campaign was last dispatched
    pub last_run: Option<DateTime<Utc>>,

    /// Successful sends across all runs
    pub messages_sent: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// The service filter, treating a blank value as "all services"
    pub fn service_filter(&self) -> Option<&str> {
        self.service_filter
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Input for creating a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub salon_id: String,
    pub name: String,
    pub template_id: Uuid,
    pub service_filter: Option<String>,
    pub days_since_visit: i32,
    pub active: bool,
}

/// Fields to change on a campaign; `None` leaves a field untouched
///
/// `service_filter: Some("")` clears the filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCampaign {
    pub name: Option<String>,
    pub template_id: Option<Uuid>,
    pub service_filter: Option<String>,
    pub days_since_visit: Option<i32>,
    pub active: Option<bool>,
}

const CAMPAIGN_COLUMNS: &str = "id, salon_id, name, template_id, service_filter, \
     days_since_visit, active, last_run, messages_sent, created_at, updated_at";

impl Campaign {
    /// Inserts a campaign
    pub async fn create(pool: &PgPool, data: NewCampaign) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaigns (salon_id, name, template_id, service_filter, days_since_visit, active) \
             VALUES ($1, $2, $3, NULLIF($4, ''), $5, $6) RETURNING {CAMPAIGN_COLUMNS}"
        );

        sqlx::query_as::<_, Campaign>(&query)
            .bind(&data.salon_id)
            .bind(&data.name)
            .bind(data.template_id)
            .bind(&data.service_filter)
            .bind(data.days_since_visit)
            .bind(data.active)
            .fetch_one(pool)
            .await
    }

    /// Finds a campaign by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A salon's campaigns, ordered by name
    pub async fn list_by_salon(pool: &PgPool, salon_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE salon_id = $1 ORDER BY name, id"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(salon_id)
            .fetch_all(pool)
            .await
    }

    /// Updates the non-`None` fields of a campaign
    ///
    /// Returns `None` if the campaign doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCampaign,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE campaigns SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.template_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", template_id = ${bind_count}"));
        }
        if data.service_filter.is_some() {
            bind_count += 1;
            query.push_str(&format!(", service_filter = NULLIF(${bind_count}, '')"));
        }
        if data.days_since_visit.is_some() {
            bind_count += 1;
            query.push_str(&format!(", days_since_visit = ${bind_count}"));
        }
        if data.active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", active = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {CAMPAIGN_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Campaign>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(template_id) = data.template_id {
            q = q.bind(template_id);
        }
        if let Some(service_filter) = data.service_filter {
            q = q.bind(service_filter);
        }
        if let Some(days) = data.days_since_visit {
            q = q.bind(days);
        }
        if let Some(active) = data.active {
            q = q.bind(active);
        }

        q.fetch_optional(pool).await
    }

    /// Stamps a dispatch run and adds its successful sends to the counter
    ///
    /// Returns false if the campaign doesn't exist.
    pub async fn record_run(
        pool: &PgPool,
        id: Uuid,
        ran_at: DateTime<Utc>,
        sent: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET last_run = $2, messages_sent = messages_sent + $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(ran_at)
        .bind(sent)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a campaign
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
