//! Flight tools - search, rebook, cancel

use async_trait::async_trait;
use serde_json::Value;

use crate::records::{Domain, Filter};
use crate::tools::{Tool, ToolContext, ToolResult};

use super::records_json;

/// Search flights by departure/arrival airport
pub struct SearchFlightsTool;

#[async_trait]
impl Tool for SearchFlightsTool {
    fn name(&self) -> &'static str {
        "search_flights"
    }

    fn description(&self) -> &'static str {
        "Search for flights by departure airport, arrival airport, or flight number."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "departure_airport": { "type": "string", "description": "IATA code, e.g. ZRH" },
                "arrival_airport": { "type": "string", "description": "IATA code, e.g. BSL" },
                "flight_id": { "type": "string", "description": "Flight number, e.g. LX0038" }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let mut filter = Filter::new();
        if let Some(dep) = input["departure_airport"].as_str() {
            filter = filter.eq("departure_airport", dep);
        }
        if let Some(arr) = input["arrival_airport"].as_str() {
            filter = filter.eq("arrival_airport", arr);
        }
        if let Some(id) = input["flight_id"].as_str() {
            filter = filter.eq("id", id);
        }

        match ctx.records.find(Domain::Flight, &filter).await {
            Ok(records) => ToolResult::success(records_json(&records)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Rebook the passenger's ticket onto a different flight
pub struct UpdateTicketTool;

#[async_trait]
impl Tool for UpdateTicketTool {
    fn name(&self) -> &'static str {
        "update_ticket_to_new_flight"
    }

    fn description(&self) -> &'static str {
        "Update the passenger's ticket to a new flight. The new flight must exist."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "ticket_no": { "type": "string", "description": "The ticket number to rebook" },
                "new_flight_id": { "type": "string", "description": "Flight number to move the ticket to" }
            },
            "required": ["ticket_no", "new_flight_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let passenger_id = match ctx.require_passenger() {
            Ok(p) => p.to_string(),
            Err(e) => return ToolResult::error(e),
        };
        let Some(ticket_no) = input["ticket_no"].as_str() else {
            return ToolResult::error("ticket_no is required");
        };
        let Some(new_flight_id) = input["new_flight_id"].as_str() else {
            return ToolResult::error("new_flight_id is required");
        };

        // Ticket must belong to the requesting passenger
        let owned = match ctx
            .records
            .find(
                Domain::Flight,
                &Filter::new().eq("ticket_no", ticket_no).eq("passenger_id", passenger_id.as_str()),
            )
            .await
        {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let Some(ticket) = owned.first() else {
            return ToolResult::error(format!("No ticket {ticket_no} found for the current passenger"));
        };

        // Target flight must exist
        let target = match ctx
            .records
            .find(Domain::Flight, &Filter::new().eq("id", new_flight_id))
            .await
        {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        if target.is_empty() {
            return ToolResult::error(format!("No flight found with id {new_flight_id}"));
        }

        match ctx
            .records
            .update(
                Domain::Flight,
                &ticket.id,
                serde_json::json!({ "status": "rebooked", "rebooked_to": new_flight_id }),
            )
            .await
        {
            Ok(updated) => ToolResult::success(records_json(std::slice::from_ref(&updated))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Cancel the passenger's ticket
pub struct CancelTicketTool;

#[async_trait]
impl Tool for CancelTicketTool {
    fn name(&self) -> &'static str {
        "cancel_ticket"
    }

    fn description(&self) -> &'static str {
        "Cancel the passenger's ticket and remove it from their bookings."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "ticket_no": { "type": "string", "description": "The ticket number to cancel" }
            },
            "required": ["ticket_no"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let passenger_id = match ctx.require_passenger() {
            Ok(p) => p.to_string(),
            Err(e) => return ToolResult::error(e),
        };
        let Some(ticket_no) = input["ticket_no"].as_str() else {
            return ToolResult::error("ticket_no is required");
        };

        let owned = match ctx
            .records
            .find(
                Domain::Flight,
                &Filter::new().eq("ticket_no", ticket_no).eq("passenger_id", passenger_id.as_str()),
            )
            .await
        {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let Some(ticket) = owned.first() else {
            return ToolResult::error(format!("No ticket {ticket_no} found for the current passenger"));
        };

        match ctx.records.cancel(Domain::Flight, &ticket.id).await {
            Ok(cancelled) => ToolResult::success(records_json(std::slice::from_ref(&cancelled))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
