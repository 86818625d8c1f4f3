//! Excursion tools - recommend, book, update, cancel

use async_trait::async_trait;
use serde_json::Value;

use crate::records::{Domain, Filter};
use crate::tools::{Tool, ToolContext, ToolResult};

use super::records_json;

/// Search trip recommendations by location or keyword
pub struct SearchTripRecommendationsTool;

#[async_trait]
impl Tool for SearchTripRecommendationsTool {
    fn name(&self) -> &'static str {
        "search_trip_recommendations"
    }

    fn description(&self) -> &'static str {
        "Search for trip recommendations and excursions by location or keywords."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "City or area" },
                "keywords": { "type": "string", "description": "Interest keywords, e.g. outdoor, scenic" }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let mut filter = Filter::new();
        if let Some(location) = input["location"].as_str() {
            filter = filter.contains("location", location);
        }
        if let Some(keywords) = input["keywords"].as_str() {
            filter = filter.contains("keywords", keywords);
        }

        match ctx.records.find(Domain::Excursion, &filter).await {
            Ok(records) => ToolResult::success(records_json(&records)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Book an excursion by id
pub struct BookExcursionTool;

#[async_trait]
impl Tool for BookExcursionTool {
    fn name(&self) -> &'static str {
        "book_excursion"
    }

    fn description(&self) -> &'static str {
        "Book a recommended excursion by its id."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recommendation_id": { "type": "string" }
            },
            "required": ["recommendation_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(id) = input["recommendation_id"].as_str() else {
            return ToolResult::error("recommendation_id is required");
        };

        let mut payload = serde_json::json!({ "status": "booked" });
        if let Some(passenger) = &ctx.passenger_id {
            payload["booked_by"] = serde_json::json!(passenger);
        }

        match ctx.records.update(Domain::Excursion, id, payload).await {
            Ok(updated) => ToolResult::success(records_json(std::slice::from_ref(&updated))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Update an excursion booking's details
pub struct UpdateExcursionTool;

#[async_trait]
impl Tool for UpdateExcursionTool {
    fn name(&self) -> &'static str {
        "update_excursion"
    }

    fn description(&self) -> &'static str {
        "Update the details of an excursion booking."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recommendation_id": { "type": "string" },
                "details": { "type": "string", "description": "Updated booking details" }
            },
            "required": ["recommendation_id", "details"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(id) = input["recommendation_id"].as_str() else {
            return ToolResult::error("recommendation_id is required");
        };
        let Some(details) = input["details"].as_str() else {
            return ToolResult::error("details is required");
        };

        match ctx
            .records
            .update(Domain::Excursion, id, serde_json::json!({ "details": details }))
            .await
        {
            Ok(updated) => ToolResult::success(records_json(std::slice::from_ref(&updated))),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Cancel an excursion booking
pub struct CancelExcursionTool;

#[async_trait]
impl Tool for CancelExcursionTool {
    fn name(&self) -> &'static str {
        "cancel_excursion"
    }

    fn description(&self) -> &'static str {
        "Cancel an excursion booking by its id."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recommendation_id": { "type": "string" }
            },
            "required": ["recommendation_id"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let Some(id) = input["recommendation_id"].as_str() else {
            return ToolResult::error("recommendation_id is required");
        };

        match ctx.records.cancel(Domain::Excursion, id).await {
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

    fn seeded_ctx() -> ToolContext {
        ToolContext::new(Arc::new(MemoryRecordStore::seeded()), Some("3442 587242".to_string()))
    }

    #[tokio::test]
    async fn test_search_by_keyword() {
        let ctx = seeded_ctx();
        let result = SearchTripRecommendationsTool
            .execute(serde_json::json!({"keywords": "scenic"}), &ctx)
            .await;
        assert!(!result.is_error);
        assert!(result.content.contains("Rhine River Cruise"));
        assert!(result.content.contains("Lucerne Day Trip"));
    }

    #[tokio::test]
    async fn test_book_excursion() {
        let ctx = seeded_ctx();
        let result = BookExcursionTool
            .execute(serde_json::json!({"recommendation_id": "e-1"}), &ctx)
            .await;
        assert!(!result.is_error);
        assert!(result.content.contains("booked"));
    }

    #[tokio::test]
    async fn test_book_unknown_excursion_errors() {
        let ctx = seeded_ctx();
        let result = BookExcursionTool
            .execute(serde_json::json!({"recommendation_id": "e-404"}), &ctx)
            .await;
        assert!(result.is_error);
    }
}
