//! Builtin domain tools
//!
//! One module per travel domain, mirroring the specialist split:
//! searches are safe, anything that writes a record is sensitive and
//! registered as such. Plus the primary handler's policy lookup.

mod car_rentals;
mod excursions;
mod flights;
mod hotels;
mod policies;

pub use car_rentals::{BookCarRentalTool, CancelCarRentalTool, SearchCarRentalsTool, UpdateCarRentalTool};
pub use excursions::{BookExcursionTool, CancelExcursionTool, SearchTripRecommendationsTool, UpdateExcursionTool};
pub use flights::{CancelTicketTool, SearchFlightsTool, UpdateTicketTool};
pub use hotels::{BookHotelTool, CancelHotelTool, SearchHotelsTool, UpdateHotelTool};
pub use policies::LookupPolicyTool;

use crate::records::Record;

/// Render search results the way the model consumes them
pub(crate) fn records_json(records: &[Record]) -> String {
    serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
}
