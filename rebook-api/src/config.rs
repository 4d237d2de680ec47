/// Configuration management for the API server
///
/// Configuration comes from environment variables. A `.env` file in the
/// working directory is loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS when `true` (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `WHATSAPP_API_BASE_URL`: Graph API root (default: https://graph.facebook.com)
/// - `WHATSAPP_API_VERSION`: Graph API version (default: v17.0)
/// - `WHATSAPP_TEMPLATE_NAME`: Approved template name (default: appointment_reminder)
/// - `WHATSAPP_LANGUAGE_CODE`: Template language (default: en_US)
/// - `DEFAULT_COUNTRY_CODE`: Prefix for numbers without one (default: 1)
/// - `WHATSAPP_TIMEOUT_SECONDS`: Per-send timeout (default: 30)
/// - `IDENTITY_API_KEY`: Identity provider web API key (required)
/// - `IDENTITY_BASE_URL`: Identity provider root (default: https://identitytoolkit.googleapis.com)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use rebook_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use rebook_shared::auth::identity::FirebaseConfig;
use rebook_shared::db::pool::DatabaseConfig as PoolConfig;
use rebook_shared::retention::composer::MessageSettings;
use rebook_shared::whatsapp::client::WhatsAppConfig as ClientConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub whatsapp: WhatsAppConfig,
    pub identity: IdentityConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (adds HSTS)
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Outbound WhatsApp settings shared by every salon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    pub base_url: String,
    pub api_version: String,
    pub template_name: String,
    pub language_code: String,
    pub default_country_code: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let country_code = var("DEFAULT_COUNTRY_CODE", "1");
        if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("DEFAULT_COUNTRY_CODE must be digits only, got {country_code:?}");
        }

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port: var("API_PORT", "8080").parse()?,
                cors_origins: var("CORS_ORIGINS", "*")
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect(),
                production: var("PRODUCTION", "false").parse()?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: var("DATABASE_MAX_CONNECTIONS", "10").parse()?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            whatsapp: WhatsAppConfig {
                base_url: var("WHATSAPP_API_BASE_URL", "https://graph.facebook.com"),
                api_version: var("WHATSAPP_API_VERSION", "v17.0"),
                template_name: var("WHATSAPP_TEMPLATE_NAME", "appointment_reminder"),
                language_code: var("WHATSAPP_LANGUAGE_CODE", "en_US"),
                default_country_code: country_code,
                timeout_seconds: var("WHATSAPP_TIMEOUT_SECONDS", "30").parse()?,
            },
            identity: IdentityConfig {
                api_key: required("IDENTITY_API_KEY")?,
                base_url: var("IDENTITY_BASE_URL", "https://identitytoolkit.googleapis.com"),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    pub fn whatsapp_client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.whatsapp.base_url.clone(),
            api_version: self.whatsapp.api_version.clone(),
            timeout: Duration::from_secs(self.whatsapp.timeout_seconds),
        }
    }

    pub fn message_settings(&self) -> MessageSettings {
        MessageSettings {
            template_name: self.whatsapp.template_name.clone(),
            language_code: self.whatsapp.language_code.clone(),
            default_country_code: self.whatsapp.default_country_code.clone(),
        }
    }

    pub fn firebase_config(&self) -> FirebaseConfig {
        FirebaseConfig {
            base_url: self.identity.base_url.clone(),
            ..FirebaseConfig::new(self.identity.api_key.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgresql://localhost/rebook"),
        ("JWT_SECRET", "test-secret-key-at-least-32-bytes-long"),
        ("IDENTITY_API_KEY", "web-api-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.whatsapp.api_version, "v17.0");
        assert_eq!(config.whatsapp.template_name, "appointment_reminder");
        assert_eq!(config.message_settings().default_country_code, "1");
        assert_eq!(config.pool_config().max_connections, 10);
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("API_PORT", "9000"),
            ("CORS_ORIGINS", "https://app.rebook.example, https://admin.rebook.example"),
            ("PRODUCTION", "true"),
            ("DEFAULT_COUNTRY_CODE", "91"),
            ("WHATSAPP_TIMEOUT_SECONDS", "5"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.cors_origins.len(), 2);
        assert!(config.api.production);
        assert_eq!(config.message_settings().default_country_code, "91");
        assert_eq!(config.whatsapp_client_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_and_invalid_values() {
        assert!(Config::from_lookup(lookup(&REQUIRED[..2])).is_err());

        let mut short_secret = REQUIRED.to_vec();
        short_secret[1] = ("JWT_SECRET", "too-short");
        assert!(Config::from_lookup(lookup(&short_secret)).is_err());

        let mut bad_code = REQUIRED.to_vec();
        bad_code.push(("DEFAULT_COUNTRY_CODE", "+1"));
        assert!(Config::from_lookup(lookup(&bad_code)).is_err());
    }
}
