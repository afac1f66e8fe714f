use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::config::{MigrationRequest, Network};
use crate::export::ExportReport;
use crate::pubkey::ValidatorPublicKey;

/// Summary of the last export that passed verification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub network: Network,
    pub source_volume: String,
    pub output_volume: String,
    pub output_dir: PathBuf,
    pub pubkeys: Vec<ValidatorPublicKey>,
    pub backup_sha256: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ExportRecord {
    pub fn from_report(request: &MigrationRequest, output_volume: &str, report: &ExportReport) -> Self {
        Self {
            network: request.network,
            source_volume: request.source_volume.clone(),
            output_volume: output_volume.to_string(),
            output_dir: report.artifacts.out_dir.clone(),
            pubkeys: report.keys.iter().copied().collect(),
            backup_sha256: report.backup_sha256.clone(),
            completed_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
pub struct AppState {
    pub last_export: Option<ExportRecord>,
}

fn get_state_path() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    let state_dir = home_dir.join(".validator-migrator");
    if !state_dir.exists() {
        fs::create_dir_all(&state_dir)
            .with_context(|| format!("Failed to create state directory: {:?}", state_dir))?;
    }
    Ok(state_dir.join("state.json"))
}

pub fn load() -> Result<AppState> {
    let state_path = get_state_path()?;
    if !state_path.exists() {
        return Ok(AppState::default());
    }
    let state_file = fs::File::open(state_path)?;
    let state = serde_json::from_reader(state_file)?;
    Ok(state)
}

pub fn save(state: &AppState) -> Result<()> {
    let state_path = get_state_path()?;
    let state_file = fs::File::create(state_path)?;
    serde_json::to_writer_pretty(state_file, state)?;
    Ok(())
}
