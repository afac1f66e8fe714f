// ABOUTME: Library root for validator-migrator
// ABOUTME: Exports a legacy Prysm validator wallet into a verified migration bundle

pub mod commands;
pub mod config;
pub mod docker;
pub mod error;
pub mod export;
pub mod preflight;
pub mod pubkey;
pub mod runner;
pub mod state;
pub mod utils;

pub use config::{MigrationRequest, MigratorSettings, Network, PathSet};
pub use error::{Artifact, MigrationError, Step};
pub use export::{ExportPipeline, ExportReport};
pub use pubkey::{parse_validator_pubkeys, ValidatorKeySet, ValidatorPublicKey};
pub use runner::{CommandError, CommandRunner, ShellRunner};
