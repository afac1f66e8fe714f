// ABOUTME: Error taxonomy for a migration run
// ABOUTME: Every failure is tagged with the pipeline step that produced it

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::runner::CommandError;

/// Named steps of an export, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ListAccounts,
    ParseKeys,
    BackupExport,
    PasswordCopy,
    SlashingProtectionExport,
    EnumerateOutput,
    Verify,
    Unpack,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::ListAccounts,
        Step::ParseKeys,
        Step::BackupExport,
        Step::PasswordCopy,
        Step::SlashingProtectionExport,
        Step::EnumerateOutput,
        Step::Verify,
        Step::Unpack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ListAccounts => "list-accounts",
            Step::ParseKeys => "parse-keys",
            Step::BackupExport => "backup-export",
            Step::PasswordCopy => "password-copy",
            Step::SlashingProtectionExport => "slashing-protection-export",
            Step::EnumerateOutput => "enumerate-output",
            Step::Verify => "verify",
            Step::Unpack => "unpack",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files every complete bundle must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    WalletPassword,
    SlashingProtection,
    BackupArchive,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::WalletPassword => crate::config::WALLET_PASSWORD_FILENAME,
            Artifact::SlashingProtection => crate::config::SLASHING_PROTECTION_FILENAME,
            Artifact::BackupArchive => crate::config::BACKUP_FILENAME,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("invalid migration request: {0:#}")]
    InvalidRequest(anyhow::Error),

    #[error("{step} step failed")]
    CommandFailed {
        step: Step,
        #[source]
        source: CommandError,
    },

    #[error("{step} step failed: no validator accounts found in the account list output")]
    NoAccountsFound { step: Step },

    #[error("{step} step failed: {artifact} file not found in {}", .path.display())]
    MissingArtifact {
        step: Step,
        artifact: Artifact,
        path: PathBuf,
    },

    #[error("{step} step failed: could not unpack {}", .archive.display())]
    Unpack {
        step: Step,
        archive: PathBuf,
        #[source]
        source: CommandError,
    },
}

impl MigrationError {
    /// Step that produced the error, `None` when the run never started.
    pub fn step(&self) -> Option<Step> {
        match self {
            MigrationError::InvalidRequest(_) => None,
            MigrationError::CommandFailed { step, .. }
            | MigrationError::NoAccountsFound { step }
            | MigrationError::MissingArtifact { step, .. }
            | MigrationError::Unpack { step, .. } => Some(*step),
        }
    }

    /// Whether re-running the whole sequence could plausibly succeed.
    ///
    /// Only container invocations fail transiently; an empty wallet, a
    /// missing artifact, or a corrupt archive will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MigrationError::CommandFailed { .. })
    }
}
