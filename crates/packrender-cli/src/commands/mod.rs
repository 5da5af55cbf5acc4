//! CLI commands

pub mod cache;
pub mod render;
