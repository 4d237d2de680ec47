/// Database models for Rebook
///
/// Each model owns its table and exposes its queries as associated functions
/// taking a `&PgPool`. Handlers never call these directly; they go through
/// [`crate::store::Store`], which [`crate::store::PgStore`] implements on top
/// of this module.
///
/// # Models
///
/// - `salon`: the tenant, keyed by the identity provider's user id
/// - `customer`: salon customers with a cached copy of their latest visit
/// - `service_history`: one row per recorded visit
/// - `template`: WhatsApp message templates with `{{variable}}` placeholders
/// - `campaign`: follow-up rules that select overdue customers
/// - `visit`: value types shared by customers and history
///
/// # Example
///
/// ```no_run
/// use rebook_shared::models::customer::{Customer, NewCustomer};
/// use rebook_shared::models::visit::ServiceTags;
/// use rebook_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let customer = Customer::create(&pool, NewCustomer {
///     salon_id: "uid-1".to_string(),
///     name: "Asha Rao".to_string(),
///     phone: "98765 43210".to_string(),
///     notes: None,
///     services: ServiceTags::single("Haircut")?,
///     last_visit: chrono::Utc::now(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod campaign;
pub mod customer;
pub mod salon;
pub mod service_history;
pub mod template;
pub mod visit;
