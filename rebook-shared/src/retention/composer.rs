/// WhatsApp message composition
///
/// Template bodies live in WhatsApp Business Manager; what we send is the
/// approved template name plus positional body parameters. The stored
/// template text decides which parameters are sent: one per recognized
/// placeholder it contains, always in the order name, service, salon.

use crate::models::customer::Customer;
use crate::models::salon::Salon;
use crate::models::template::Template;
use crate::whatsapp::message::TemplateMessage;
use crate::whatsapp::WhatsAppError;

/// Placeholders we know how to fill, in parameter order
pub const KNOWN_PLACEHOLDERS: [&str; 3] = ["{{name}}", "{{service}}", "{{salon}}"];

/// Outbound message settings shared by every salon
#[derive(Debug, Clone)]
pub struct MessageSettings {
    /// Approved WhatsApp template name
    pub template_name: String,

    /// Template language code
    pub language_code: String,

    /// Country code prefixed to numbers that lack it
    pub default_country_code: String,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            template_name: "appointment_reminder".to_string(),
            language_code: "en_US".to_string(),
            default_country_code: "1".to_string(),
        }
    }
}

/// Body parameters for one customer
pub fn template_parameters(content: &str, customer: &Customer, salon: &Salon) -> Vec<String> {
    let [name, service, salon_name] = KNOWN_PLACEHOLDERS;
    let mut parameters = Vec::new();

    if content.contains(name) {
        parameters.push(customer.name.clone());
    }
    if content.contains(service) {
        parameters.push(customer.primary_service().unwrap_or_default().to_string());
    }
    if content.contains(salon_name) {
        parameters.push(salon.display_name().to_string());
    }

    parameters
}

/// Strips formatting and prefixes the country code unless the number starts with it
///
/// Returns `None` when the input has no digits.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    if digits.starts_with(country_code) {
        Some(digits)
    } else {
        Some(format!("{country_code}{digits}"))
    }
}

/// Builds the WhatsApp payload for one customer
pub fn compose(
    settings: &MessageSettings,
    template: &Template,
    customer: &Customer,
    salon: &Salon,
) -> Result<TemplateMessage, WhatsAppError> {
    let to = normalize_phone(&customer.phone, &settings.default_country_code).ok_or_else(|| {
        WhatsAppError::Rejected(format!("phone number {:?} has no digits", customer.phone))
    })?;

    Ok(TemplateMessage::new(
        &to,
        &settings.template_name,
        &settings.language_code,
        template_parameters(&template.content, customer, salon),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::visit::{CurrentVisit, ServiceTags};
    use chrono::Utc;
    use uuid::Uuid;

    fn customer(phone: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            salon_id: "s1".to_string(),
            name: "Asha".to_string(),
            phone: phone.to_string(),
            notes: None,
            current_visit: Some(CurrentVisit::new(
                ServiceTags::new(["Color", "Haircut"]).unwrap(),
                Utc::now(),
            )),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn salon() -> Salon {
        Salon {
            id: "s1".to_string(),
            salon_name: Some("Glow Studio".to_string()),
            email: "owner@glow.example".to_string(),
            whatsapp_access_token: Some("t".to_string()),
            whatsapp_phone_number_id: Some("p".to_string()),
            whatsapp_business_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn template(content: &str) -> Template {
        Template {
            id: Uuid::new_v4(),
            salon_id: "s1".to_string(),
            name: "Reminder".to_string(),
            content: content.to_string(),
            variables: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parameters_follow_fixed_order() {
        // Placeholder order in the text does not matter
        let params = template_parameters(
            "{{salon}} here! {{name}}, book your next {{service}}.",
            &customer("5551234567"),
            &salon(),
        );
        assert_eq!(params, vec!["Asha", "Color", "Glow Studio"]);
    }

    #[test]
    fn test_absent_placeholders_are_skipped() {
        let params = template_parameters(
            "Hi {{name}}, we miss you at {{salon}}",
            &customer("5551234567"),
            &salon(),
        );
        assert_eq!(params, vec!["Asha", "Glow Studio"]);

        let none = template_parameters("Hello there {{offer}}", &customer("1"), &salon());
        assert!(none.is_empty());
    }

    #[test]
    fn test_repeated_placeholder_counts_once() {
        let params = template_parameters("{{name}} {{name}}", &customer("1"), &salon());
        assert_eq!(params, vec!["Asha"]);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("(555) 123-4567", "1").as_deref(), Some("15551234567"));
        assert_eq!(normalize_phone("+1 555 123 4567", "1").as_deref(), Some("15551234567"));
        assert_eq!(normalize_phone("98765 43210", "91").as_deref(), Some("919876543210"));
        assert_eq!(normalize_phone("+91-98765-43210", "91").as_deref(), Some("919876543210"));
        assert_eq!(normalize_phone("n/a", "1"), None);
    }

    #[test]
    fn test_compose_builds_payload() {
        let settings = MessageSettings::default();
        let message = compose(
            &settings,
            &template("Hi {{name}}, time for your {{service}}!"),
            &customer("(555) 123-4567"),
            &salon(),
        )
        .unwrap();

        assert_eq!(message.to, "15551234567");
        assert_eq!(message.template.name, "appointment_reminder");
        assert_eq!(message.template.language.code, "en_US");
        assert_eq!(message.body_parameters(), vec!["Asha", "Color"]);
    }

    #[test]
    fn test_compose_rejects_unusable_phone() {
        let err = compose(
            &MessageSettings::default(),
            &template("Hi {{name}}"),
            &customer("unknown"),
            &salon(),
        )
        .unwrap_err();

        assert!(matches!(err, WhatsAppError::Rejected(_)));
    }
}
