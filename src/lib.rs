//! Ration Library
//!
//! Nutrient reconciliation and unit conversion for editing adventure
//! ingredients against a remote planning service.

pub mod build_info;
pub mod config;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod remote;
pub mod tools;
