// ABOUTME: Export pipeline that turns a legacy Prysm volume into a migration bundle
// ABOUTME: Runs the named steps in order and stops at the first failure

pub mod steps;
pub mod unpack;
pub mod verify;

use serde::{Deserialize, Serialize};

use crate::config::{HostPaths, MigrationRequest, MigratorSettings, PathSet};
use crate::docker;
use crate::error::{MigrationError, Step};
use crate::pubkey::{parse_validator_pubkeys, ValidatorKeySet};
use crate::runner::CommandRunner;
use crate::utils::sha256_file;

pub use verify::verify_artifacts;

/// Outcome of a successful export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub keys: ValidatorKeySet,
    pub artifacts: HostPaths,
    /// `keystore-*.json` files found after unpacking, if the directory was readable.
    pub keystore_count: Option<usize>,
    /// Hex SHA-256 of `backup.zip`.
    pub backup_sha256: Option<String>,
    /// `ls -la` of the output root; `None` when the listing failed.
    pub output_listing: Option<String>,
}

/// Sequencer for one export.
///
/// Settings are fixed at construction; each call to [`ExportPipeline::run`]
/// is an independent, sequential run. The pipeline never retries and never
/// deletes partial output.
pub struct ExportPipeline<R> {
    settings: MigratorSettings,
    runner: R,
}

impl<R: CommandRunner> ExportPipeline<R> {
    pub fn new(settings: MigratorSettings, runner: R) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &MigratorSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn run(&self, request: &MigrationRequest) -> Result<ExportReport, MigrationError> {
        request.validate().map_err(MigrationError::InvalidRequest)?;
        self.settings
            .validate()
            .map_err(MigrationError::InvalidRequest)?;
        let paths = PathSet::resolve(request, &self.settings);

        tracing::info!(
            "Exporting {} validator wallet '{}' from volume '{}' into '{}'",
            request.network,
            request.wallet_dir,
            request.source_volume,
            self.settings.output_volume
        );

        let listing = self
            .command(
                Step::ListAccounts,
                steps::list_accounts(request, &self.settings, &paths),
                "validator accounts list failed",
            )
            .await?;

        let keys = self.parse_keys(&listing)?;

        self.command(
            Step::BackupExport,
            steps::backup_export(request, &self.settings, &paths, &keys),
            "validator accounts backup failed",
        )
        .await?;

        self.command(
            Step::PasswordCopy,
            steps::password_copy(request, &self.settings, &paths),
            "walletpassword.txt copy failed",
        )
        .await?;

        self.command(
            Step::SlashingProtectionExport,
            steps::slashing_protection_export(request, &self.settings, &paths),
            "slashing protection history export failed",
        )
        .await?;

        let output_listing = self.enumerate_output(&paths).await;

        tracing::info!("[{}] Checking exported files", Step::Verify);
        verify_artifacts(&paths.host)?;

        self.unpack(&paths.host).await?;

        let keystore_count = match unpack::count_keystores(&paths.host.keystores_dir) {
            Ok(count) => {
                if count != keys.len() {
                    tracing::warn!(
                        "Unpacked {} keystore(s) but {} validator key(s) were exported",
                        count,
                        keys.len()
                    );
                }
                Some(count)
            }
            Err(e) => {
                tracing::warn!(
                    "Could not count keystores in {}: {}",
                    paths.host.keystores_dir.display(),
                    e
                );
                None
            }
        };

        let backup_file = paths.host.backup_file.clone();
        let backup_sha256 =
            match tokio::task::spawn_blocking(move || sha256_file(&backup_file)).await {
                Ok(Ok(digest)) => Some(digest),
                Ok(Err(e)) => {
                    tracing::warn!("Could not checksum backup archive: {:#}", e);
                    None
                }
                Err(e) => {
                    tracing::warn!("Checksum task failed: {}", e);
                    None
                }
            };

        tracing::info!(
            "Export complete: {} key(s) in {}",
            keys.len(),
            paths.host.out_dir.display()
        );

        Ok(ExportReport {
            keys,
            artifacts: paths.host,
            keystore_count,
            backup_sha256,
            output_listing,
        })
    }

    async fn command(
        &self,
        step: Step,
        tokens: Vec<String>,
        failure_message: &str,
    ) -> Result<String, MigrationError> {
        tracing::info!("[{}] Running", step);
        match self.runner.run(&tokens, failure_message).await {
            Ok(output) => Ok(output),
            Err(source) => {
                if source.is_timeout() {
                    self.remove_container(step).await;
                }
                Err(MigrationError::CommandFailed { step, source })
            }
        }
    }

    /// Killing the local `docker run` client leaves the container running in
    /// the daemon, still holding the name and the output volume.
    async fn remove_container(&self, step: Step) {
        let name = &self.settings.container_name;
        tracing::warn!("[{}] Timed out, removing container '{}'", step, name);
        if let Err(e) = self
            .runner
            .run(&docker::remove_container(name), "docker rm failed")
            .await
        {
            tracing::warn!("[{}] Could not remove container '{}': {}", step, name, e);
        }
    }

    fn parse_keys(&self, listing: &str) -> Result<ValidatorKeySet, MigrationError> {
        let keys = parse_validator_pubkeys(listing).map_err(|e| {
            tracing::debug!("Account list output:\n{}", listing);
            tracing::error!("[{}] {}", Step::ParseKeys, e);
            MigrationError::NoAccountsFound {
                step: Step::ParseKeys,
            }
        })?;
        tracing::info!(
            "[{}] Found {} validator key(s): {}",
            Step::ParseKeys,
            keys.len(),
            keys.to_csv()
        );
        Ok(keys)
    }

    /// Diagnostic only: a failure is logged and the run continues.
    async fn enumerate_output(&self, paths: &PathSet) -> Option<String> {
        tracing::info!("[{}] Running", Step::EnumerateOutput);
        match self
            .runner
            .run(
                &steps::enumerate_output(paths),
                "listing output volume failed",
            )
            .await
        {
            Ok(listing) => {
                tracing::info!(
                    "[{}] Output volume contents:\n{}",
                    Step::EnumerateOutput,
                    listing
                );
                Some(listing)
            }
            Err(e) => {
                tracing::warn!("[{}] Continuing despite error: {}", Step::EnumerateOutput, e);
                None
            }
        }
    }

    async fn unpack(&self, host: &HostPaths) -> Result<(), MigrationError> {
        tracing::info!(
            "[{}] Extracting {} into {}",
            Step::Unpack,
            host.backup_file.display(),
            host.keystores_dir.display()
        );
        self.runner
            .run(
                &unpack::unzip_command(&host.backup_file, &host.keystores_dir),
                "Error unzipping backup.zip file",
            )
            .await
            .map_err(|source| MigrationError::Unpack {
                step: Step::Unpack,
                archive: host.backup_file.clone(),
                source,
            })?;
        Ok(())
    }
}
