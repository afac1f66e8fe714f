// ABOUTME: Command implementations behind each CLI subcommand
// ABOUTME: Exports the export, preflight, and status commands

pub mod export;
pub mod preflight;
pub mod status;

pub use export::{export, ExportOptions};
pub use preflight::preflight;
pub use status::status;
