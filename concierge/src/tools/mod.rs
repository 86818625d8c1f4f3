//! Tool system
//!
//! Tools give handlers read and write access to travel records. Each
//! tool is declared once in the [`ToolRegistry`] with a sensitivity
//! flag; sensitive tools are intercepted by the engine's approval gate
//! before they execute.

mod context;
mod registry;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolResult};
