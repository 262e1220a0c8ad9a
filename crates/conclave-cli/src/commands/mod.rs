//! CLI command implementations

pub mod debate;
pub mod info;
pub mod panel;
pub mod validate;
