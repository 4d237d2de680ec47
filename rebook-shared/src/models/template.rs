/// Message template model and database operations
///
/// Template content uses `{{variable}}` placeholders. The `variables` column
/// is derived from the content on every write and never set directly.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE templates (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     salon_id TEXT NOT NULL REFERENCES salons(id) ON DELETE CASCADE,
///     name TEXT NOT NULL,
///     content TEXT NOT NULL,
///     variables TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::OnceLock;
use uuid::Uuid;

/// WhatsApp message template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: Uuid,

    pub salon_id: String,

    pub name: String,

    /// Message text with `{{variable}}` placeholders
    pub content: String,

    /// Placeholder names found in `content`, in order of first appearance
    pub variables: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"))
}

/// Placeholder names in `content`, in order of first appearance, without repeats
///
/// ```
/// use rebook_shared::models::template::extract_variables;
///
/// let vars = extract_variables("Hi {{name}}, your {{service}} awaits. See you, {{name}}!");
/// assert_eq!(vars, vec!["name", "service"]);
/// ```
pub fn extract_variables(content: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    for capture in placeholder_re().captures_iter(content) {
        let name = &capture[1];
        if !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
    }
    variables
}

/// Input for creating a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTemplate {
    pub salon_id: String,
    pub name: String,
    pub content: String,
}

/// Fields to change on a template; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub content: Option<String>,
}

const TEMPLATE_COLUMNS: &str = "id, salon_id, name, content, variables, created_at, updated_at";

impl Template {
    /// Inserts a template, deriving its variables
    pub async fn create(pool: &PgPool, data: NewTemplate) -> Result<Self, sqlx::Error> {
        let variables = extract_variables(&data.content);
        let query = format!(
            "INSERT INTO templates (salon_id, name, content, variables) \
             VALUES ($1, $2, $3, $4) RETURNING {TEMPLATE_COLUMNS}"
        );

        sqlx::query_as::<_, Template>(&query)
            .bind(&data.salon_id)
            .bind(&data.name)
            .bind(&data.content)
            .bind(variables)
            .fetch_one(pool)
            .await
    }

    /// Finds a template by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1");
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A salon's templates, ordered by name
    pub async fn list_by_salon(pool: &PgPool, salon_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE salon_id = $1 ORDER BY name, id"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(salon_id)
            .fetch_all(pool)
            .await
    }

    /// Updates a template, re-deriving variables when the content changes
    ///
    /// Returns `None` if the template doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTemplate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE templates SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.content.is_some() {
            query.push_str(&format!(
                ", content = ${}, variables = ${}",
                bind_count + 1,
                bind_count + 2
            ));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TEMPLATE_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Template>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(content) = data.content {
            let variables = extract_variables(&content);
            q = q.bind(content).bind(variables);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a template
    ///
    /// Campaigns that still reference it fail at send time with "template
    /// not found".
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
