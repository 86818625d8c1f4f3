//! ToolContext - execution context for tools

use std::sync::Arc;

use crate::records::RecordStore;

/// Execution context for tools - scoped to a single thread's turn
///
/// Carries the passenger identity threaded in from the hosting layer
/// and the record store handle. Tools have no other ambient access.
#[derive(Clone)]
pub struct ToolContext {
    /// Passenger identity, when the hosting layer supplied one
    pub passenger_id: Option<String>,

    /// Record store the domain tools read and write
    pub records: Arc<dyn RecordStore>,
}

impl ToolContext {
    pub fn new(records: Arc<dyn RecordStore>, passenger_id: Option<String>) -> Self {
        Self { passenger_id, records }
    }

    /// Passenger id or a tool-level error message
    pub fn require_passenger(&self) -> Result<&str, String> {
        self.passenger_id
            .as_deref()
            .ok_or_else(|| "No passenger id on this conversation. Ask the user for their booking reference.".to_string())
    }
}
