// ABOUTME: Export command: preflight, confirmation, pipeline run, and state record
// ABOUTME: Whole-sequence retries happen here, never inside the pipeline

use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::time::Duration;

use crate::config::{MigrationRequest, MigratorSettings};
use crate::error::MigrationError;
use crate::export::{ExportPipeline, ExportReport};
use crate::runner::ShellRunner;
use crate::state::{self, ExportRecord};
use crate::utils::retry_with_backoff;

pub struct ExportOptions {
    pub request: MigrationRequest,
    pub settings: MigratorSettings,
    /// Skip the confirmation prompt
    pub yes: bool,
    pub skip_preflight: bool,
    /// Extra attempts of the whole sequence after a retryable failure
    pub retries: u32,
    pub retry_delay: Duration,
}

pub async fn export(opts: ExportOptions) -> Result<()> {
    opts.settings.validate()?;
    opts.request.validate()?;

    let runner = ShellRunner::new().with_timeout(opts.settings.command_timeout());

    if opts.skip_preflight {
        tracing::warn!("Skipping pre-flight checks (--skip-preflight)");
    } else {
        super::preflight(&runner, &opts.request, &opts.settings).await?;
    }

    if !opts.yes && !confirm_export(&opts.request, &opts.settings)? {
        bail!("Export cancelled by user");
    }

    let pipeline = ExportPipeline::new(opts.settings.clone(), runner);
    let request = &opts.request;
    let pipeline = &pipeline;

    let report = retry_with_backoff(
        move || pipeline.run(request),
        opts.retries,
        opts.retry_delay,
        MigrationError::is_retryable,
    )
    .await
    .context("Validator export failed")?;

    print_report(&report);

    let mut app_state = state::load().context("Failed to load state")?;
    app_state.last_export = Some(ExportRecord::from_report(
        request,
        &opts.settings.output_volume,
        &report,
    ));
    state::save(&app_state).context("Failed to save state")?;

    Ok(())
}

fn confirm_export(request: &MigrationRequest, settings: &MigratorSettings) -> Result<bool> {
    println!();
    println!("Validator export");
    println!("  Network:        {}", request.network);
    println!("  Source image:   {}", request.source_image);
    println!("  Source volume:  {}", request.source_volume);
    println!("  Wallet dir:     {}", request.wallet_dir);
    println!("  Output volume:  {}", settings.output_volume);
    println!("  Host output:    {}", settings.host_output_root.display());
    println!();
    println!("Stop the legacy validator before exporting. Running the same keys");
    println!("in two places at once can get them slashed.");
    println!();

    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Proceed with the export?")
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn print_report(report: &ExportReport) {
    println!();
    println!("✓ Export complete");
    println!();
    println!("Validator keys ({}):", report.keys.len());
    for key in &report.keys {
        println!("  {}", key);
    }
    println!();
    println!("Artifacts:");
    println!("  {}", report.artifacts.backup_file.display());
    println!("  {}", report.artifacts.wallet_password_file.display());
    println!("  {}", report.artifacts.slashing_protection_file.display());
    match report.keystore_count {
        Some(count) => println!(
            "  {} ({} keystore file(s))",
            report.artifacts.keystores_dir.display(),
            count
        ),
        None => println!("  {}", report.artifacts.keystores_dir.display()),
    }
    if let Some(sha) = &report.backup_sha256 {
        println!();
        println!("backup.zip sha256: {}", sha);
    }
}
