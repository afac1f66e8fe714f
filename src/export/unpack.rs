// ABOUTME: Extraction of the backup archive into the keystores directory
// ABOUTME: Shells out to unzip and counts the keystore files it produced

use std::io;
use std::path::Path;

/// `unzip -o <archive> -d <dest>`. `-o` overwrites so a re-run replaces
/// keystores instead of prompting.
pub fn unzip_command(archive: &Path, dest: &Path) -> Vec<String> {
    vec![
        "unzip".to_string(),
        "-o".to_string(),
        archive.display().to_string(),
        format!("-d {}", dest.display()),
    ]
}

/// Number of `keystore-*.json` files directly under `dir`.
pub fn count_keystores(dir: &Path) -> io::Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("keystore-") && name.ends_with(".json") {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::command_line;
    use std::fs;

    #[test]
    fn test_unzip_command() {
        let cmd = unzip_command(
            Path::new("/srv/out/prysm-migration/backup.zip"),
            Path::new("/srv/out/prysm-migration/keystores"),
        );
        assert_eq!(
            command_line(&cmd),
            "unzip -o /srv/out/prysm-migration/backup.zip -d /srv/out/prysm-migration/keystores"
        );
    }

    #[test]
    fn test_count_keystores() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("keystore-0.json"), "{}").unwrap();
        fs::write(temp.path().join("keystore-1.json"), "{}").unwrap();
        fs::write(temp.path().join("deposit_data.json"), "{}").unwrap();
        fs::create_dir(temp.path().join("keystore-dir.json")).unwrap();
        assert_eq!(count_keystores(temp.path()).unwrap(), 2);
        assert!(count_keystores(&temp.path().join("missing")).is_err());
    }
}
