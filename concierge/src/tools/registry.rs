//! ToolRegistry - declared tools with sensitivity flags and owners
//!
//! Built once at startup and immutable afterwards. The registry is the
//! single source of truth for the approval gate: a tool is sensitive if
//! and only if its entry says so, decided at dispatch time.

use std::collections::HashMap;

use crate::handlers::HandlerId;
use crate::llm::ToolDefinition;

use super::builtin::{
    BookCarRentalTool, BookExcursionTool, BookHotelTool, CancelCarRentalTool, CancelExcursionTool, CancelHotelTool,
    CancelTicketTool, LookupPolicyTool, SearchCarRentalsTool, SearchFlightsTool, SearchHotelsTool,
    SearchTripRecommendationsTool, UpdateCarRentalTool, UpdateExcursionTool, UpdateHotelTool, UpdateTicketTool,
};
use super::{Tool, ToolContext, ToolResult};

struct ToolEntry {
    tool: Box<dyn Tool>,
    sensitive: bool,
    /// Handlers allowed to bind this tool (search_flights is shared
    /// between the primary and the flight specialist)
    owners: Vec<HandlerId>,
}

/// Registry of every callable tool
pub struct ToolRegistry {
    entries: HashMap<String, ToolEntry>,
}

impl ToolRegistry {
    /// Registry with the full travel toolset wired to its owners
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        // Primary: read-only lookups, never mutations
        registry.register(vec![HandlerId::Primary], false, Box::new(LookupPolicyTool));
        registry.register(
            vec![HandlerId::Primary, HandlerId::Flight],
            false,
            Box::new(SearchFlightsTool),
        );

        // Flight specialist
        registry.register(vec![HandlerId::Flight], true, Box::new(UpdateTicketTool));
        registry.register(vec![HandlerId::Flight], true, Box::new(CancelTicketTool));

        // Hotel specialist
        registry.register(vec![HandlerId::Hotel], false, Box::new(SearchHotelsTool));
        registry.register(vec![HandlerId::Hotel], true, Box::new(BookHotelTool));
        registry.register(vec![HandlerId::Hotel], true, Box::new(UpdateHotelTool));
        registry.register(vec![HandlerId::Hotel], true, Box::new(CancelHotelTool));

        // Car rental specialist
        registry.register(vec![HandlerId::CarRental], false, Box::new(SearchCarRentalsTool));
        registry.register(vec![HandlerId::CarRental], true, Box::new(BookCarRentalTool));
        registry.register(vec![HandlerId::CarRental], true, Box::new(UpdateCarRentalTool));
        registry.register(vec![HandlerId::CarRental], true, Box::new(CancelCarRentalTool));

        // Excursion specialist
        registry.register(vec![HandlerId::Excursion], false, Box::new(SearchTripRecommendationsTool));
        registry.register(vec![HandlerId::Excursion], true, Box::new(BookExcursionTool));
        registry.register(vec![HandlerId::Excursion], true, Box::new(UpdateExcursionTool));
        registry.register(vec![HandlerId::Excursion], true, Box::new(CancelExcursionTool));

        registry
    }

    /// Empty registry (for testing)
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add a tool entry
    pub fn register(&mut self, owners: Vec<HandlerId>, sensitive: bool, tool: Box<dyn Tool>) {
        self.entries.insert(
            tool.name().to_string(),
            ToolEntry {
                tool,
                sensitive,
                owners,
            },
        );
    }

    /// Tool definitions bound to one handler, sorted by name for
    /// deterministic prompt construction
    pub fn definitions_for(&self, owner: HandlerId) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .entries
            .values()
            .filter(|e| e.owners.contains(&owner))
            .map(|e| ToolDefinition {
                name: e.tool.name().to_string(),
                description: e.tool.description().to_string(),
                input_schema: e.tool.input_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// The approval-gate predicate: is this tool mutating?
    ///
    /// Unknown tools are treated as sensitive so a hallucinated name
    /// never slips past the gate.
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.entries.get(name).map(|e| e.sensitive).unwrap_or(true)
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Check whether a handler is allowed to call a tool
    pub fn owned_by(&self, name: &str, owner: HandlerId) -> bool {
        self.entries.get(name).map(|e| e.owners.contains(&owner)).unwrap_or(false)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, input: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        match self.entries.get(name) {
            Some(entry) => entry.tool.execute(input, ctx).await,
            None => ToolResult::error(format!("Unknown tool: {name}")),
        }
    }
}
