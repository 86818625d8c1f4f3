//! Car rental tools - search, book, update, cancel
//!
//! Booking creates a separate booking record against the rental
//! inventory, so one vehicle class can be booked by many passengers.

use async_trait::async_trait;
use serde_json::Value;

use crate::records::{Domain, Filter, Record};
use crate::tools::{Tool, ToolContext, ToolResult};

use super::records_json;

/// Search car rentals by location, name, or price tier
pub struct SearchCarRentalsTool;

#[async_trait]
impl Tool for SearchCarRentalsTool {
    fn name(&self) -> &'static str {
        "search_car_rentals"
    }

    fn description(&self) -> &'static str {
        "Search for available car rentals by location, company name, or price tier."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "City to pick the car up in" },
                "name": { "type": "string", "description": "Rental company name fragment" },
                "price_tier": { "type": "string", "description": "e.g. Economy, Midsize, Luxury" }
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

        match ctx.records.find(Domain::CarRental, &filter).await {
            Ok(records) => ToolResult::success(records_json(&records)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Create a rental booking against an existing rental offer
pub struct BookCarRentalTool;

#[async_trait]
impl Tool for BookCarRentalTool {
    fn name(&self) -> &'static str {
        "book_car_rental"
    }

    fn description(&self) -> &'static str {
        "Book a car rental by rental id for a start and end date."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "rental_id": { "type": "string", "description": "Id of the rental offer to book" },
                "start_date": { "type": "string" },
                "end_date": { "type": "string" }
            },
            "required": ["rental_id", "start_date", "end_date"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(rental_id) = input["rental_id"].as_str() else {
            return ToolResult::error("rental_id is required");
        };
        let (Some(start), Some(end)) = (input["start_date"].as_str(), input["end_date"].as_str()) else {
            return ToolResult::error("start_date and end_date are required");
        };

        // The offer has to exist before a booking is created against it
        let offers = match ctx
            .records
            .find(Domain::CarRental, &Filter::new().eq("id", rental_id))
            .await
        {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        if offers.is_empty() {
            return ToolResult::error(format!("No car rental found with id {rental_id}"));
        }

        let mut booking = Record::new("")
            .with("kind", "booking")
            .with("rental_id", rental_id)
            .with("start_date", start)
            .with("end_date", end)
            .with("status", "booked");
        if let Some(passenger) = &ctx.passenger_id {
            booking = booking.with("passenger_id", passenger.as_str());
        }

        match ctx.records.create(Domain::CarRental, booking).await {
            Ok(created) => ToolResult::success(records_json(std::slice::from_ref(&created))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Change dates on an existing rental booking
pub struct UpdateCarRentalTool;

#[async_trait]
impl Tool for UpdateCarRentalTool {
    fn name(&self) -> &'static str {
        "update_car_rental"
    }

    fn description(&self) -> &'static str {
        "Update a car rental booking's start or end date."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "booking_id": { "type": "string" },
                "start_date": { "type": "string" },
                "end_date": { "type": "string" }
            },
            "required": ["booking_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(booking_id) = input["booking_id"].as_str() else {
            return ToolResult::error("booking_id is required");
        };

        let mut payload = serde_json::Map::new();
        if let Some(start) = input["start_date"].as_str() {
            payload.insert("start_date".to_string(), start.into());
        }
        if let Some(end) = input["end_date"].as_str() {
            payload.insert("end_date".to_string(), end.into());
        }
        if payload.is_empty() {
            return ToolResult::error("Nothing to update: provide start_date or end_date");
        }

        match ctx
            .records
            .update(Domain::CarRental, booking_id, Value::Object(payload))
            .await
        {
            Ok(updated) => ToolResult::success(records_json(std::slice::from_ref(&updated))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Cancel a rental booking
pub struct CancelCarRentalTool;

#[async_trait]
impl Tool for CancelCarRentalTool {
    fn name(&self) -> &'static str {
        "cancel_car_rental"
    }

    fn description(&self) -> &'static str {
        "Cancel a car rental booking by its booking id."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "booking_id": { "type": "string" }
            },
            "required": ["booking_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(booking_id) = input["booking_id"].as_str() else {
            return ToolResult::error("booking_id is required");
        };

        match ctx.records.cancel(Domain::CarRental, booking_id).await {
            Ok(cancelled) => ToolResult::success(records_json(std::slice::from_ref(&cancelled))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MemoryRecordStore;
    use std::sync::Arc;

    fn seeded_ctx() -> (Arc<MemoryRecordStore>, ToolContext) {
        let store = Arc::new(MemoryRecordStore::seeded());
        let ctx = ToolContext::new(store.clone(), Some("3442 587242".to_string()));
        (store, ctx)
    }

    #[tokio::test]
    async fn test_search_car_rentals_by_tier() {
        let (_, ctx) = seeded_ctx();
        let result = SearchCarRentalsTool
            .execute(serde_json::json!({"price_tier": "Economy"}), &ctx)
            .await;
        assert!(!result.is_error);
        assert!(result.content.contains("Europcar"));
    }

    #[tokio::test]
    async fn test_book_car_rental_creates_booking() {
        let (store, ctx) = seeded_ctx();
        let result = BookCarRentalTool
            .execute(
                serde_json::json!({"rental_id": "c-1", "start_date": "2026-09-01", "end_date": "2026-09-08"}),
                &ctx,
            )
            .await;
        assert!(!result.is_error, "{}", result.content);
        assert!(result.content.contains("booked"));
        assert_eq!(store.mutation_count(), 1);
    }

    #[tokio::test]
    async fn test_book_unknown_rental_is_domain_error() {
        let (store, ctx) = seeded_ctx();
        let result = BookCarRentalTool
            .execute(
                serde_json::json!({"rental_id": "c-99", "start_date": "2026-09-01", "end_date": "2026-09-08"}),
                &ctx,
            )
            .await;
        assert!(result.is_error);
        assert_eq!(store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_book_requires_dates() {
        let (_, ctx) = seeded_ctx();
        let result = BookCarRentalTool
            .execute(serde_json::json!({"rental_id": "c-1"}), &ctx)
            .await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_cancel_unknown_booking_not_found() {
        let (_, ctx) = seeded_ctx();
        let result = CancelCarRentalTool
            .execute(serde_json::json!({"booking_id": "b-404"}), &ctx)
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("b-404"));
    }
}
