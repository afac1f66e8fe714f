// ABOUTME: Postcondition checks on the host-visible output volume
// ABOUTME: Fails on the first required artifact that is missing

use std::path::Path;

use crate::config::HostPaths;
use crate::error::{Artifact, MigrationError, Step};

/// Required artifacts in the order they are checked.
pub fn required_artifacts(host: &HostPaths) -> [(Artifact, &Path); 3] {
    [
        (Artifact::WalletPassword, host.wallet_password_file.as_path()),
        (
            Artifact::SlashingProtection,
            host.slashing_protection_file.as_path(),
        ),
        (Artifact::BackupArchive, host.backup_file.as_path()),
    ]
}

/// Assert that the password file, the slashing protection export, and the
/// backup archive all exist on the host.
///
/// First failure wins: the error names exactly one artifact so the root cause
/// is unambiguous.
pub fn verify_artifacts(host: &HostPaths) -> Result<(), MigrationError> {
    for (artifact, path) in required_artifacts(host) {
        if !path.exists() {
            return Err(MigrationError::MissingArtifact {
                step: Step::Verify,
                artifact,
                path: path.to_path_buf(),
            });
        }
        tracing::debug!("Found {} at {}", artifact, path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationRequest, MigratorSettings, Network, PathSet};
    use std::fs;
    use tempfile::TempDir;

    fn host_paths(root: &Path) -> HostPaths {
        let request = MigrationRequest {
            network: Network::Mainnet,
            source_image: "prysm-validator:1.0.0".to_string(),
            source_volume: "validator-data".to_string(),
            wallet_dir: ".eth2validators".to_string(),
            utility_image: "alpine:3.15".to_string(),
        };
        let settings = MigratorSettings {
            host_output_root: root.to_path_buf(),
            ..Default::default()
        };
        PathSet::resolve(&request, &settings).host
    }

    fn touch_all(host: &HostPaths) {
        fs::create_dir_all(&host.out_dir).unwrap();
        for (_, path) in required_artifacts(host) {
            fs::write(path, b"x").unwrap();
        }
    }

    #[test]
    fn test_verify_passes_when_all_present() {
        let temp = TempDir::new().unwrap();
        let host = host_paths(temp.path());
        touch_all(&host);
        assert!(verify_artifacts(&host).is_ok());
    }

    #[test]
    fn test_verify_names_each_missing_artifact() {
        for missing in [
            Artifact::WalletPassword,
            Artifact::SlashingProtection,
            Artifact::BackupArchive,
        ] {
            let temp = TempDir::new().unwrap();
            let host = host_paths(temp.path());
            touch_all(&host);
            let (_, path) = required_artifacts(&host)
                .into_iter()
                .find(|(a, _)| *a == missing)
                .unwrap();
            fs::remove_file(path).unwrap();

            match verify_artifacts(&host) {
                Err(MigrationError::MissingArtifact { artifact, path: p, step }) => {
                    assert_eq!(artifact, missing);
                    assert_eq!(p, path);
                    assert_eq!(step, Step::Verify);
                }
                other => panic!("expected MissingArtifact, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_verify_reports_first_missing_only() {
        let temp = TempDir::new().unwrap();
        let host = host_paths(temp.path());
        // Nothing written: the password file is checked first.
        let err = verify_artifacts(&host).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MissingArtifact {
                artifact: Artifact::WalletPassword,
                ..
            }
        ));
    }
}
