/// Salon model and database operations
///
/// A salon is the tenant: every customer, template and campaign carries the
/// owning salon's id. The salon id is the identity provider's user id, so a
/// signed-in user owns exactly one salon.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE salons (
///     id TEXT PRIMARY KEY,
///     salon_name TEXT,
///     email TEXT NOT NULL,
///     whatsapp_access_token TEXT,
///     whatsapp_phone_number_id TEXT,
///     whatsapp_business_id TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::whatsapp::WhatsAppCredentials;

/// Salon (tenant) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Salon {
    /// Identity provider user id
    pub id: String,

    /// Display name used for the `{{salon}}` placeholder
    pub salon_name: Option<String>,

    /// Contact email
    pub email: String,

    /// WhatsApp Business API access token (never serialized)
    #[serde(skip_serializing, default)]
    pub whatsapp_access_token: Option<String>,

    /// WhatsApp Business phone-number id
    pub whatsapp_phone_number_id: Option<String>,

    /// WhatsApp Business account id
    pub whatsapp_business_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Salon {
    /// Display name, or an empty string until one is set
    pub fn display_name(&self) -> &str {
        self.salon_name.as_deref().unwrap_or_default()
    }

    /// WhatsApp credentials, if both the token and phone-number id are set
    pub fn whatsapp_credentials(&self) -> Option<WhatsAppCredentials> {
        let access_token = non_blank(self.whatsapp_access_token.as_deref())?;
        let phone_number_id = non_blank(self.whatsapp_phone_number_id.as_deref())?;

        Some(WhatsAppCredentials {
            access_token: access_token.to_string(),
            phone_number_id: phone_number_id.to_string(),
            business_id: non_blank(self.whatsapp_business_id.as_deref()).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Input for creating a salon on sign-up or first sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSalon {
    /// Identity provider user id
    pub id: String,

    pub email: String,

    pub salon_name: Option<String>,
}

/// Fields to change on a salon; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSalon {
    pub salon_name: Option<String>,
    pub email: Option<String>,
    pub whatsapp_access_token: Option<String>,
    pub whatsapp_phone_number_id: Option<String>,
    pub whatsapp_business_id: Option<String>,
}

const SALON_COLUMNS: &str = "id, salon_name, email, whatsapp_access_token, \
     whatsapp_phone_number_id, whatsapp_business_id, created_at, updated_at";

impl Salon {
    /// Inserts the salon unless one with the same id already exists
    ///
    /// Returns the stored salon either way; an existing record is not
    /// modified.
    pub async fn create_if_absent(pool: &PgPool, data: NewSalon) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO salons (id, email, salon_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&data.id)
        .bind(&data.email)
        .bind(&data.salon_name)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, &data.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a salon by id
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {SALON_COLUMNS} FROM salons WHERE id = $1");
        sqlx::query_as::<_, Salon>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Updates the non-`None` fields of a salon
    ///
    /// Returns `None` if the salon doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        data: UpdateSalon,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE salons SET updated_at = NOW()");
        let mut bind_count = 1;

        let fields = [
            ("salon_name", &data.salon_name),
            ("email", &data.email),
            ("whatsapp_access_token", &data.whatsapp_access_token),
            ("whatsapp_phone_number_id", &data.whatsapp_phone_number_id),
            ("whatsapp_business_id", &data.whatsapp_business_id),
        ];

        for (column, value) in fields.iter() {
            if value.is_some() {
                bind_count += 1;
                query.push_str(&format!(", {column} = ${bind_count}"));
            }
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {SALON_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Salon>(&query).bind(id);
        for (_, value) in fields {
            if let Some(value) = value {
                q = q.bind(value.clone());
            }
        }

        q.fetch_optional(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salon() -> Salon {
        Salon {
            id: "uid-1".to_string(),
            salon_name: Some("Glow Studio".to_string()),
            email: "owner@glow.example".to_string(),
            whatsapp_access_token: Some("EAAG-token".to_string()),
            whatsapp_phone_number_id: Some("1098765".to_string()),
            whatsapp_business_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_whatsapp_credentials_present() {
        let creds = salon().whatsapp_credentials().unwrap();
        assert_eq!(creds.access_token, "EAAG-token");
        assert_eq!(creds.phone_number_id, "1098765");
        assert!(creds.business_id.is_none());
    }

    #[test]
    fn test_whatsapp_credentials_require_token_and_phone_id() {
        let mut no_token = salon();
        no_token.whatsapp_access_token = None;
        assert!(no_token.whatsapp_credentials().is_none());

        let mut blank_phone = salon();
        blank_phone.whatsapp_phone_number_id = Some("   ".to_string());
        assert!(blank_phone.whatsapp_credentials().is_none());
    }

    #[test]
    fn test_access_token_not_serialized() {
        let json = serde_json::to_value(salon()).unwrap();
        assert!(json.get("whatsapp_access_token").is_none());
        assert_eq!(json["whatsapp_phone_number_id"], "1098765");
    }

    #[test]
    fn test_display_name_defaults_to_empty() {
        let mut s = salon();
        assert_eq!(s.display_name(), "Glow Studio");
        s.salon_name = None;
        assert_eq!(s.display_name(), "");
    }
}
