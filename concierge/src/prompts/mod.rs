//! Persona templates
//!
//! Each handler renders its system prompt from an embedded handlebars
//! template with the passenger snapshot and current time. Templates are
//! compiled once at engine startup.

use handlebars::Handlebars;

use crate::handlers::HandlerId;

mod embedded;

pub use embedded::{ENTRY_ACK, RESUME_HOST};

/// Compiled persona templates, one per handler
pub struct Prompts {
    registry: Handlebars<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string("primary", embedded::PRIMARY)?;
        registry.register_template_string("flight", embedded::FLIGHT)?;
        registry.register_template_string("hotel", embedded::HOTEL)?;
        registry.register_template_string("car-rental", embedded::CAR_RENTAL)?;
        registry.register_template_string("excursion", embedded::EXCURSION)?;
        Ok(Self { registry })
    }

    /// Render the system prompt for a handler
    pub fn system_prompt(
        &self,
        handler: HandlerId,
        user_info: &serde_json::Value,
        time: &str,
    ) -> Result<String, handlebars::RenderError> {
        let name = match handler {
            HandlerId::Primary => "primary",
            HandlerId::Flight => "flight",
            HandlerId::Hotel => "hotel",
            HandlerId::CarRental => "car-rental",
            HandlerId::Excursion => "excursion",
        };
        let user_info = serde_json::to_string_pretty(user_info).unwrap_or_else(|_| "null".to_string());
        self.registry.render(
            name,
            &serde_json::json!({
                "user_info": user_info,
                "time": time,
            }),
        )
    }

    /// Synthetic tool result injected when a specialist takes over
    pub fn entry_ack(handler: HandlerId) -> String {
        ENTRY_ACK.replace("{name}", handler.display_name())
    }
}
