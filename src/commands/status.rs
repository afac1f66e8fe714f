use anyhow::{Context, Result};

use crate::state;

pub async fn status() -> Result<()> {
    let state = state::load().context("Failed to load state")?;
    let Some(record) = state.last_export else {
        println!("No completed export recorded.");
        return Ok(());
    };

    println!(
        "Last export: {} ({})",
        record.completed_at.to_rfc3339(),
        record.network
    );
    println!(
        "  Source volume: {}  ->  output volume: {}",
        record.source_volume, record.output_volume
    );
    println!("  Output directory: {}", record.output_dir.display());
    if let Some(sha) = &record.backup_sha256 {
        println!("  backup.zip sha256: {}", sha);
    }
    println!("  Validator keys ({}):", record.pubkeys.len());
    for key in &record.pubkeys {
        println!("    {}", key);
    }
    Ok(())
}
