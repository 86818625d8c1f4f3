//! Dialog handlers
//!
//! One primary handler plus four domain specialists. The active handler
//! is selected by the top of the conversation's dialog stack; each
//! handler turns the transcript into an LLM call and classifies the
//! model's output into a [`HandlerOutcome`].

use serde::{Deserialize, Serialize};

mod common;
mod outcome;
mod primary;
mod specialist;

pub use outcome::HandlerOutcome;
pub use primary::PrimaryHandler;
pub use specialist::{SpecialistHandler, SpecialistProfile};

/// Closed set of handler identities
///
/// The stack bottom is always `Primary`; everything else is a
/// specialist that can be pushed above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlerId {
    Primary,
    Flight,
    Hotel,
    CarRental,
    Excursion,
}

impl HandlerId {
    /// Every specialist id, in delegation-tool order
    pub const SPECIALISTS: [HandlerId; 4] = [
        HandlerId::Flight,
        HandlerId::Hotel,
        HandlerId::CarRental,
        HandlerId::Excursion,
    ];

    pub fn is_specialist(&self) -> bool {
        !matches!(self, HandlerId::Primary)
    }

    /// The delegate tool name the primary handler uses to reach this specialist
    pub fn delegate_tool(&self) -> Option<&'static str> {
        match self {
            HandlerId::Primary => None,
            HandlerId::Flight => Some("to_flight_assistant"),
            HandlerId::Hotel => Some("to_hotel_assistant"),
            HandlerId::CarRental => Some("to_car_rental_assistant"),
            HandlerId::Excursion => Some("to_excursion_assistant"),
        }
    }

    /// Reverse lookup from a delegate tool name
    pub fn from_delegate_tool(name: &str) -> Option<HandlerId> {
        Self::SPECIALISTS.iter().copied().find(|id| id.delegate_tool() == Some(name))
    }

    /// Human-readable persona name, used in entry acknowledgements
    pub fn display_name(&self) -> &'static str {
        match self {
            HandlerId::Primary => "Primary Assistant",
            HandlerId::Flight => "Flight Updates & Booking Assistant",
            HandlerId::Hotel => "Hotel Booking Assistant",
            HandlerId::CarRental => "Car Rental Assistant",
            HandlerId::Excursion => "Trip Recommendation Assistant",
        }
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HandlerId::Primary => "primary",
            HandlerId::Flight => "flight",
            HandlerId::Hotel => "hotel",
            HandlerId::CarRental => "car-rental",
            HandlerId::Excursion => "excursion",
        };
        write!(f, "{name}")
    }
}

/// Tool name a specialist uses to hand control back to the primary
pub const ESCALATE_TOOL: &str = "complete_or_escalate";
