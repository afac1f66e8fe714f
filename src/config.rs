// ABOUTME: Migration request, process-wide settings, and resolved path layout
// ABOUTME: Validates caller input and derives container and host paths for one run

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{
    validate_host_path, validate_image_reference, validate_volume_name, validate_wallet_dir,
};

/// Directory created inside the output volume to hold the bundle.
pub const MIGRATION_DIR: &str = "prysm-migration";
pub const BACKUP_FILENAME: &str = "backup.zip";
pub const WALLET_PASSWORD_FILENAME: &str = "walletpassword.txt";
pub const SLASHING_PROTECTION_FILENAME: &str = "slashing_protection.json";
pub const KEYSTORES_DIRNAME: &str = "keystores";

/// Validator binary inside the Prysm validator image.
pub const VALIDATOR_ENTRYPOINT: &str = "/usr/local/bin/validator";

const CONTAINER_ROOT_DIR: &str = "/root";
const CONTAINER_OUT_TARGET: &str = "/out";

/// Consensus networks the Prysm validator accepts as `--<network>` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Prater,
    Goerli,
    Sepolia,
    Holesky,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Prater => "prater",
            Network::Goerli => "goerli",
            Network::Sepolia => "sepolia",
            Network::Holesky => "holesky",
        }
    }

    pub fn flag(&self) -> String {
        format!("--{}", self.as_str())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable input to one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRequest {
    pub network: Network,
    /// Legacy Prysm validator image, e.g. `prysm-validator:1.0.0`.
    pub source_image: String,
    /// Docker volume holding the legacy validator data, mounted at `/root`.
    pub source_volume: String,
    /// Wallet directory relative to the source volume root, e.g. `.eth2validators`.
    pub wallet_dir: String,
    /// Small image used to run `cp`, e.g. `alpine:3.15`.
    pub utility_image: String,
}

impl MigrationRequest {
    pub fn validate(&self) -> Result<()> {
        validate_image_reference(&self.source_image).context("Invalid source image")?;
        validate_volume_name(&self.source_volume).context("Invalid source volume")?;
        validate_wallet_dir(&self.wallet_dir).context("Invalid wallet directory")?;
        validate_image_reference(&self.utility_image).context("Invalid utility image")?;
        Ok(())
    }
}

/// Process-wide settings shared by every run.
///
/// Loaded from an optional TOML file; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigratorSettings {
    /// Docker volume receiving the bundle.
    pub output_volume: String,
    /// Where `output_volume` is visible on the host.
    pub host_output_root: PathBuf,
    /// Name reserved for the ephemeral worker containers of a run.
    pub container_name: String,
    /// Kill any single command after this many seconds. `None` waits forever.
    pub command_timeout_secs: Option<u64>,
}

impl Default for MigratorSettings {
    fn default() -> Self {
        Self {
            output_volume: "validator-migration-out".to_string(),
            host_output_root: PathBuf::from("/var/lib/docker/volumes/validator-migration-out/_data"),
            container_name: "prysm-migration".to_string(),
            command_timeout_secs: None,
        }
    }
}

impl MigratorSettings {
    /// Load settings from a TOML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        validate_volume_name(&self.output_volume).context("Invalid output volume")?;
        validate_volume_name(&self.container_name).context("Invalid container name")?;
        validate_host_path(&self.host_output_root).context("Invalid host_output_root")?;
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

/// Paths as seen from inside the worker containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPaths {
    pub root_dir: String,
    pub out_volume_target: String,
    pub out_dir: String,
    pub wallet_dir: String,
    pub wallet_password_file: String,
    pub wallet_password_out_file: String,
}

/// Paths on the host where the output volume is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPaths {
    pub output_root: PathBuf,
    pub out_dir: PathBuf,
    pub backup_file: PathBuf,
    pub wallet_password_file: PathBuf,
    pub slashing_protection_file: PathBuf,
    pub keystores_dir: PathBuf,
}

/// Logical role to absolute path mapping, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    pub container: ContainerPaths,
    pub host: HostPaths,
}

impl PathSet {
    pub fn resolve(request: &MigrationRequest, settings: &MigratorSettings) -> Self {
        let wallet_dir = format!(
            "{}/{}",
            CONTAINER_ROOT_DIR,
            request.wallet_dir.trim_end_matches('/')
        );
        let out_dir = format!("{}/{}", CONTAINER_OUT_TARGET, MIGRATION_DIR);
        let container = ContainerPaths {
            root_dir: CONTAINER_ROOT_DIR.to_string(),
            out_volume_target: CONTAINER_OUT_TARGET.to_string(),
            wallet_password_file: format!("{}/{}", wallet_dir, WALLET_PASSWORD_FILENAME),
            wallet_password_out_file: format!("{}/{}", out_dir, WALLET_PASSWORD_FILENAME),
            wallet_dir,
            out_dir,
        };

        let host_out_dir = settings.host_output_root.join(MIGRATION_DIR);
        let host = HostPaths {
            output_root: settings.host_output_root.clone(),
            backup_file: host_out_dir.join(BACKUP_FILENAME),
            wallet_password_file: host_out_dir.join(WALLET_PASSWORD_FILENAME),
            slashing_protection_file: host_out_dir.join(SLASHING_PROTECTION_FILENAME),
            keystores_dir: host_out_dir.join(KEYSTORES_DIRNAME),
            out_dir: host_out_dir,
        };

        Self { container, host }
    }
}
