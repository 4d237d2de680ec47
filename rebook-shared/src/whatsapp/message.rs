/// WhatsApp Cloud API template-message payload
///
/// Serializes to the body of `POST /{version}/{phone_number_id}/messages`:
///
/// ```json
/// {
///   "messaging_product": "whatsapp",
///   "recipient_type": "individual",
///   "to": "919876543210",
///   "type": "template",
///   "template": {
///     "name": "appointment_reminder",
///     "language": { "code": "en_US" },
///     "components": [
///       { "type": "body", "parameters": [ { "type": "text", "text": "Asha" } ] }
///     ]
///   }
/// }
/// ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMessage {
    pub messaging_product: String,
    pub recipient_type: String,

    /// Recipient phone number, digits only with country code
    pub to: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub template: TemplatePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePayload {
    /// Name of the template approved in WhatsApp Business Manager
    pub name: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl Parameter {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: value.into(),
        }
    }
}

impl TemplateMessage {
    /// Builds a template message with one body component
    ///
    /// The body component is omitted when there are no parameters.
    pub fn new(to: &str, template_name: &str, language_code: &str, parameters: Vec<String>) -> Self {
        let components = if parameters.is_empty() {
            Vec::new()
        } else {
            vec![Component {
                kind: "body".to_string(),
                parameters: parameters.into_iter().map(Parameter::text).collect(),
            }]
        };

        Self {
            messaging_product: "whatsapp".to_string(),
            recipient_type: "individual".to_string(),
            to: to.to_string(),
            kind: "template".to_string(),
            template: TemplatePayload {
                name: template_name.to_string(),
                language: Language {
                    code: language_code.to_string(),
                },
                components,
            },
        }
    }

    /// Body parameter texts in order
    pub fn body_parameters(&self) -> Vec<&str> {
        self.template
            .components
            .iter()
            .filter(|c| c.kind == "body")
            .flat_map(|c| c.parameters.iter().map(|p| p.text.as_str()))
            .collect()
    }
}
