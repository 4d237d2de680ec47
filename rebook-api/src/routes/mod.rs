/// API route handlers, organized by resource
///
/// - `health`: Health check
/// - `auth`: Sign-up, login, token refresh, logout
/// - `customers`: Customer CRUD and the filtered, paginated list
/// - `history`: A customer's service history
/// - `templates`: Message templates
/// - `campaigns`: Campaign CRUD, due-customer preview and dispatch
/// - `salon`: Salon profile and WhatsApp settings
/// - `dashboard`: Summary counts
/// - `reminders`: The `/send-reminder` endpoint

pub mod auth;
pub mod campaigns;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod history;
pub mod reminders;
pub mod salon;
pub mod templates;

use crate::error::ApiError;
use rebook_shared::auth::context::AuthContext;
use validator::ValidationError;

/// 403 unless the record with `salon_id` belongs to the caller
pub(crate) fn ensure_owner(auth: &AuthContext, salon_id: &str, what: &str) -> Result<(), ApiError> {
    if auth.owns(salon_id) {
        Ok(())
    } else {
        tracing::warn!(salon_id = %auth.salon_id, owner = %salon_id, "Cross-salon access to {what} refused");
        Err(ApiError::Forbidden(format!("Unauthorized access to {what}")))
    }
}

/// Phone numbers must carry 7 to 15 digits once formatting is stripped
pub(crate) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if (7..=15).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone number must contain 7 to 15 digits".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("(555) 123 4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_ensure_owner() {
        let auth = AuthContext {
            user_id: "uid-1".to_string(),
            salon_id: "uid-1".to_string(),
        };

        assert!(ensure_owner(&auth, "uid-1", "customer").is_ok());
        assert!(matches!(
            ensure_owner(&auth, "uid-2", "customer"),
            Err(ApiError::Forbidden(_))
        ));
    }
}
