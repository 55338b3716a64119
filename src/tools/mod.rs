//! Ration Tools module
//!
//! MCP tool implementations for ingredient editing.

pub mod ingredients;
pub mod status;
