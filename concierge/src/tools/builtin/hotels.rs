//! Hotel tools - search, book, update, cancel

use async_trait::async_trait;
use serde_json::Value;

use crate::records::{Domain, Filter};
use crate::tools::{Tool, ToolContext, ToolResult};

use super::records_json;

/// Search hotels by location, name, or price tier
pub struct SearchHotelsTool;

#[async_trait]
impl Tool for SearchHotelsTool {
    fn name(&self) -> &'static str {
        "search_hotels"
    }

    fn description(&self) -> &'static str {
        "Search for available hotels by location, name, or price tier."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "City or area to search in" },
                "name": { "type": "string", "description": "Hotel name fragment" },
                "price_tier": { "type": "string", "description": "e.g. Midscale, Upscale, Luxury" }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let mut filter = Filter::new();
        if let Some(location) = input["location"].as_str() {
            filter = filter.contains("location", location);
        }
        if let Some(name) = input["name"].as_str() {
            filter = filter.contains("name", name);
        }
        if let Some(tier) = input["price_tier"].as_str() {
            filter = filter.eq("price_tier", tier);
        }

        match ctx.records.find(Domain::Hotel, &filter).await {
            Ok(records) => ToolResult::success(records_json(&records)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Book a hotel by id
pub struct BookHotelTool;

#[async_trait]
impl Tool for BookHotelTool {
    fn name(&self) -> &'static str {
        "book_hotel"
    }

    fn description(&self) -> &'static str {
        "Book a hotel by its id for the given dates."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "hotel_id": { "type": "string", "description": "Id of the hotel to book" },
                "checkin_date": { "type": "string" },
                "checkout_date": { "type": "string" }
            },
            "required": ["hotel_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(hotel_id) = input["hotel_id"].as_str() else {
            return ToolResult::error("hotel_id is required");
        };

        let mut payload = serde_json::json!({ "status": "booked" });
        if let Some(passenger) = &ctx.passenger_id {
            payload["booked_by"] = serde_json::json!(passenger);
        }
        if let Some(checkin) = input["checkin_date"].as_str() {
            payload["checkin_date"] = serde_json::json!(checkin);
        }
        if let Some(checkout) = input["checkout_date"].as_str() {
            payload["checkout_date"] = serde_json::json!(checkout);
        }

        match ctx.records.update(Domain::Hotel, hotel_id, payload).await {
            Ok(updated) => ToolResult::success(records_json(std::slice::from_ref(&updated))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Change the dates on a hotel booking
pub struct UpdateHotelTool;

#[async_trait]
impl Tool for UpdateHotelTool {
    fn name(&self) -> &'static str {
        "update_hotel"
    }

    fn description(&self) -> &'static str {
        "Update a hotel booking's check-in or check-out dates."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "hotel_id": { "type": "string" },
                "checkin_date": { "type": "string" },
                "checkout_date": { "type": "string" }
            },
            "required": ["hotel_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(hotel_id) = input["hotel_id"].as_str() else {
            return ToolResult::error("hotel_id is required");
        };

        let mut payload = serde_json::Map::new();
        if let Some(checkin) = input["checkin_date"].as_str() {
            payload.insert("checkin_date".to_string(), checkin.into());
        }
        if let Some(checkout) = input["checkout_date"].as_str() {
            payload.insert("checkout_date".to_string(), checkout.into());
        }
        if payload.is_empty() {
            return ToolResult::error("Nothing to update: provide checkin_date or checkout_date");
        }

        match ctx.records.update(Domain::Hotel, hotel_id, Value::Object(payload)).await {
            Ok(updated) => ToolResult::success(records_json(std::slice::from_ref(&updated))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Cancel a hotel booking
pub struct CancelHotelTool;

#[async_trait]
impl Tool for CancelHotelTool {
    fn name(&self) -> &'static str {
        "cancel_hotel"
    }

    fn description(&self) -> &'static str {
        "Cancel a hotel booking by its id."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "hotel_id": { "type": "string" }
            },
            "required": ["hotel_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(hotel_id) = input["hotel_id"].as_str() else {
            return ToolResult::error("hotel_id is required");
        };

        match ctx.records.cancel(Domain::Hotel, hotel_id).await {
            Ok(cancelled) => ToolResult::success(records_json(std::slice::from_ref(&cancelled))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
