//! CLI commands for lister

pub mod dispatch;
pub mod fetch;
pub mod pick;
pub mod presets;
