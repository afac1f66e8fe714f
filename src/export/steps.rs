// ABOUTME: Command lines for each container step of the export
// ABOUTME: Mirrors the Prysm validator CLI contract for accounts and slashing protection

use crate::config::{MigrationRequest, MigratorSettings, PathSet, VALIDATOR_ENTRYPOINT};
use crate::docker::DockerRun;
use crate::pubkey::ValidatorKeySet;

const ACCEPT_TERMS: &str = "--accept-terms-of-use";

fn validator_container(
    request: &MigrationRequest,
    settings: &MigratorSettings,
    paths: &PathSet,
) -> DockerRun {
    DockerRun::new(&settings.container_name, &request.source_image)
        .volume(&request.source_volume, &paths.container.root_dir)
}

/// `validator accounts list` against the source wallet.
pub fn list_accounts(
    request: &MigrationRequest,
    settings: &MigratorSettings,
    paths: &PathSet,
) -> Vec<String> {
    validator_container(request, settings, paths)
        .entrypoint(VALIDATOR_ENTRYPOINT)
        .arg("accounts list")
        .arg(format!("--wallet-dir={}", paths.container.wallet_dir))
        .arg(format!(
            "--wallet-password-file={}",
            paths.container.wallet_password_file
        ))
        .arg(request.network.flag())
        .arg(ACCEPT_TERMS)
        .into_tokens()
}

/// `validator accounts backup`, writing `backup.zip` into the output volume.
///
/// The backup is encrypted with the wallet password, which is copied next to
/// it by [`password_copy`].
pub fn backup_export(
    request: &MigrationRequest,
    settings: &MigratorSettings,
    paths: &PathSet,
    keys: &ValidatorKeySet,
) -> Vec<String> {
    validator_container(request, settings, paths)
        .volume(&settings.output_volume, &paths.container.out_volume_target)
        .entrypoint(VALIDATOR_ENTRYPOINT)
        .arg("accounts backup")
        .arg(format!("--wallet-dir={}", paths.container.wallet_dir))
        .arg(format!(
            "--wallet-password-file={}",
            paths.container.wallet_password_file
        ))
        .arg(format!("--backup-dir={}", paths.container.out_dir))
        .arg(format!(
            "--backup-password-file={}",
            paths.container.wallet_password_file
        ))
        .arg(format!("--backup-public-keys={}", keys.to_csv()))
        .arg(request.network.flag())
        .arg(ACCEPT_TERMS)
        .into_tokens()
}

/// Plain `cp` of the wallet password in the utility image.
pub fn password_copy(
    request: &MigrationRequest,
    settings: &MigratorSettings,
    paths: &PathSet,
) -> Vec<String> {
    DockerRun::new(&settings.container_name, &request.utility_image)
        .volume(&request.source_volume, &paths.container.root_dir)
        .volume(&settings.output_volume, &paths.container.out_volume_target)
        .arg(format!(
            "cp {} {}",
            paths.container.wallet_password_file, paths.container.wallet_password_out_file
        ))
        .into_tokens()
}

/// `validator slashing-protection-history export`, writing
/// `slashing_protection.json` (EIP-3076 interchange) into the output volume.
pub fn slashing_protection_export(
    request: &MigrationRequest,
    settings: &MigratorSettings,
    paths: &PathSet,
) -> Vec<String> {
    validator_container(request, settings, paths)
        .volume(&settings.output_volume, &paths.container.out_volume_target)
        .entrypoint(VALIDATOR_ENTRYPOINT)
        .arg("slashing-protection-history export")
        .arg(format!("--datadir={}", paths.container.wallet_dir))
        .arg(format!(
            "--slashing-protection-export-dir={}",
            paths.container.out_dir
        ))
        .arg(request.network.flag())
        .arg(ACCEPT_TERMS)
        .into_tokens()
}

/// Host-side listing of the output root, for the log only.
pub fn enumerate_output(paths: &PathSet) -> Vec<String> {
    vec![
        "ls -la".to_string(),
        paths.host.output_root.display().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::runner::command_line;
    use std::path::PathBuf;

    const KEY: &str = "0x80b11b83eb8c1858c657dc55936bd4b47d2418c8906777cecae9c14495796f3d52b44652684e25e9ebb3e9efcfea33c6";

    fn fixture() -> (MigrationRequest, MigratorSettings, PathSet) {
        let request = MigrationRequest {
            network: Network::Prater,
            source_image: "prysm-validator:1.0.0".to_string(),
            source_volume: "validator-data".to_string(),
            wallet_dir: ".eth2validators".to_string(),
            utility_image: "alpine:3.15".to_string(),
        };
        let settings = MigratorSettings {
            output_volume: "migration-out".to_string(),
            host_output_root: PathBuf::from("/srv/out"),
            container_name: "prysm-migration".to_string(),
            command_timeout_secs: None,
        };
        let paths = PathSet::resolve(&request, &settings);
        (request, settings, paths)
    }

    #[test]
    fn test_list_accounts_command() {
        let (request, settings, paths) = fixture();
        assert_eq!(
            command_line(&list_accounts(&request, &settings, &paths)),
            "docker run --rm --name prysm-migration --volume validator-data:/root \
             --entrypoint=/usr/local/bin/validator prysm-validator:1.0.0 accounts list \
             --wallet-dir=/root/.eth2validators \
             --wallet-password-file=/root/.eth2validators/walletpassword.txt \
             --prater --accept-terms-of-use"
        );
    }

    #[test]
    fn test_backup_export_command() {
        let (request, settings, paths) = fixture();
        let keys = crate::pubkey::parse_validator_pubkeys(KEY).unwrap();
        assert_eq!(
            command_line(&backup_export(&request, &settings, &paths, &keys)),
            format!(
                "docker run --rm --name prysm-migration --volume validator-data:/root \
                 --volume migration-out:/out --entrypoint=/usr/local/bin/validator \
                 prysm-validator:1.0.0 accounts backup --wallet-dir=/root/.eth2validators \
                 --wallet-password-file=/root/.eth2validators/walletpassword.txt \
                 --backup-dir=/out/prysm-migration \
                 --backup-password-file=/root/.eth2validators/walletpassword.txt \
                 --backup-public-keys={} --prater --accept-terms-of-use",
                KEY
            )
        );
    }

    #[test]
    fn test_password_copy_command() {
        let (request, settings, paths) = fixture();
        assert_eq!(
            command_line(&password_copy(&request, &settings, &paths)),
            "docker run --rm --name prysm-migration --volume validator-data:/root \
             --volume migration-out:/out alpine:3.15 \
             cp /root/.eth2validators/walletpassword.txt /out/prysm-migration/walletpassword.txt"
        );
    }

    #[test]
    fn test_slashing_protection_export_command() {
        let (request, settings, paths) = fixture();
        assert_eq!(
            command_line(&slashing_protection_export(&request, &settings, &paths)),
            "docker run --rm --name prysm-migration --volume validator-data:/root \
             --volume migration-out:/out --entrypoint=/usr/local/bin/validator \
             prysm-validator:1.0.0 slashing-protection-history export \
             --datadir=/root/.eth2validators \
             --slashing-protection-export-dir=/out/prysm-migration \
             --prater --accept-terms-of-use"
        );
    }

    #[test]
    fn test_enumerate_output_command() {
        let (_, _, paths) = fixture();
        assert_eq!(command_line(&enumerate_output(&paths)), "ls -la /srv/out");
    }
}
