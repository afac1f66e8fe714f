// ABOUTME: Utility functions for input validation, retry logic, and checksums
// ABOUTME: Guards every value that ends up on a docker command line

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path};
use std::time::Duration;

/// Host tools the export shells out to, with the package that provides them.
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("docker", "docker-ce"), ("unzip", "unzip")];

/// Validate a Docker volume or container name
///
/// Docker names must:
/// - Be non-empty
/// - Start with a letter or digit
/// - Contain only letters, digits, `_`, `.`, or `-`
///
/// The names are interpolated into a shell command line, so anything else is
/// rejected rather than quoted.
///
/// # Examples
///
/// ```
/// # use validator_migrator::utils::validate_volume_name;
/// assert!(validate_volume_name("prysmdnpdappnodeeth_validator-data").is_ok());
/// assert!(validate_volume_name("").is_err());
/// assert!(validate_volume_name("-leading-dash").is_err());
/// assert!(validate_volume_name("vol;rm").is_err());
/// ```
pub fn validate_volume_name(name: &str) -> Result<()> {
    let Some(first_char) = name.chars().next() else {
        bail!("Name cannot be empty");
    };

    if !first_char.is_ascii_alphanumeric() {
        bail!(
            "Name '{}' must start with a letter or digit, not '{}'",
            sanitize_for_display(name),
            first_char
        );
    }

    for (i, c) in name.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-') {
            bail!(
                "Name '{}' contains invalid character '{}' at position {}. \
                 Only letters, digits, '_', '.', and '-' are allowed",
                sanitize_for_display(name),
                display_char(c),
                i
            );
        }
    }

    Ok(())
}

/// Validate a container image reference such as `alpine:3.15` or
/// `registry.example.com/prysm/validator@sha256:...`
pub fn validate_image_reference(image: &str) -> Result<()> {
    if image.trim().is_empty() {
        bail!("Image reference cannot be empty");
    }

    for (i, c) in image.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-' | '/' | ':' | '@') {
            bail!(
                "Image reference '{}' contains invalid character '{}' at position {}",
                sanitize_for_display(image),
                display_char(c),
                i
            );
        }
    }

    Ok(())
}

/// Validate the wallet directory, given relative to the source volume root
///
/// Must be non-empty, relative, free of `..`, and made of shell-safe characters.
///
/// # Examples
///
/// ```
/// # use validator_migrator::utils::validate_wallet_dir;
/// assert!(validate_wallet_dir(".eth2validators").is_ok());
/// assert!(validate_wallet_dir("backup/.eth2validators").is_ok());
/// assert!(validate_wallet_dir("/root/.eth2validators").is_err());
/// assert!(validate_wallet_dir("../.eth2validators").is_err());
/// ```
pub fn validate_wallet_dir(dir: &str) -> Result<()> {
    if dir.trim().is_empty() {
        bail!("Wallet directory cannot be empty");
    }

    for (i, c) in dir.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-' | '/') {
            bail!(
                "Wallet directory '{}' contains invalid character '{}' at position {}",
                sanitize_for_display(dir),
                display_char(c),
                i
            );
        }
    }

    for component in Path::new(dir).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                bail!("Wallet directory '{}' must not contain '..'", dir)
            }
            Component::RootDir | Component::Prefix(_) => bail!(
                "Wallet directory '{}' must be relative to the volume root",
                dir
            ),
        }
    }

    Ok(())
}

/// Validate a host directory that is passed to `unzip` and `ls` on the host
///
/// Must be absolute, free of `..`, and made of shell-safe characters. A space
/// would split the argument and `;` or `$` would be interpreted by `sh -c`.
///
/// # Examples
///
/// ```
/// # use std::path::Path;
/// # use validator_migrator::utils::validate_host_path;
/// assert!(validate_host_path(Path::new("/srv/validator-out")).is_ok());
/// assert!(validate_host_path(Path::new("/srv/validator out")).is_err());
/// assert!(validate_host_path(Path::new("relative/out")).is_err());
/// ```
pub fn validate_host_path(path: &Path) -> Result<()> {
    let Some(text) = path.to_str() else {
        bail!("Host path '{}' is not valid UTF-8", path.display());
    };

    for (i, c) in text.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-' | '/') {
            bail!(
                "Host path '{}' contains invalid character '{}' at position {}. \
                 Only letters, digits, '_', '.', '-', and '/' are allowed",
                sanitize_for_display(text),
                display_char(c),
                i
            );
        }
    }

    if !path.is_absolute() {
        bail!("Host path '{}' must be absolute", text);
    }
    if path.components().any(|c| c == Component::ParentDir) {
        bail!("Host path '{}' must not contain '..'", text);
    }

    Ok(())
}

/// Strip control characters and cap length so a bad value can be echoed safely.
pub fn sanitize_for_display(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).take(100).collect()
}

fn display_char(c: char) -> String {
    if c.is_control() {
        format!("\\x{:02x}", c as u32)
    } else {
        c.to_string()
    }
}

/// Retry a function with exponential backoff
///
/// Executes an async operation and re-runs it while `should_retry` accepts
/// the error. Each retry doubles the delay.
///
/// # Arguments
///
/// * `operation` - Async function to retry
/// * `max_retries` - Maximum number of retry attempts (0 = no retries, just initial attempt)
/// * `initial_delay` - Delay before first retry (doubles each subsequent retry)
/// * `should_retry` - Decides whether an error is worth another attempt
///
/// # Returns
///
/// The successful result, the first non-retryable error, or the last error
/// after all retries are exhausted.
///
/// # Examples
///
/// ```no_run
/// # use std::time::Duration;
/// # use validator_migrator::utils::retry_with_backoff;
/// # async fn example() -> Result<(), std::io::Error> {
/// let result = retry_with_backoff(
///     || async { Ok::<_, std::io::Error>("success") },
///     3,
///     Duration::from_secs(1),
///     |_| true,
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    mut operation: F,
    max_retries: u32,
    initial_delay: Duration,
    should_retry: P,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries && should_retry(&e) => {
                tracing::warn!(
                    "Operation failed (attempt {}/{}): {}, retrying in {:?}...",
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
