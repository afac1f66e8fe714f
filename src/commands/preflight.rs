use anyhow::{bail, Result};

use crate::config::{MigrationRequest, MigratorSettings};
use crate::preflight::run_preflight_checks;
use crate::runner::CommandRunner;

/// Run and print the pre-flight checks, failing if any issue was found.
pub async fn preflight<R: CommandRunner>(
    runner: &R,
    request: &MigrationRequest,
    settings: &MigratorSettings,
) -> Result<()> {
    request.validate()?;
    let result = run_preflight_checks(runner, request, settings).await;
    result.print();

    if !result.all_passed() {
        bail!(
            "Pre-flight checks failed with {} issue(s)",
            result.failed_count()
        );
    }
    Ok(())
}
