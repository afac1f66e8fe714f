// ABOUTME: Pre-flight validation checks for export prerequisites
// ABOUTME: Validates host tools, Docker volumes, and the host-visible output root

use crate::config::{MigrationRequest, MigratorSettings};
use crate::docker::volume_inspect;
use crate::runner::CommandRunner;
use crate::utils::REQUIRED_TOOLS;

/// Individual check result
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Issue with suggested fixes
#[derive(Debug, Clone)]
pub struct PreflightIssue {
    pub title: String,
    pub explanation: String,
    pub fixes: Vec<String>,
}

/// Complete pre-flight results
#[derive(Debug, Default)]
pub struct PreflightResult {
    pub local_env: Vec<CheckResult>,
    pub volumes: Vec<CheckResult>,
    pub output: Vec<CheckResult>,
    pub issues: Vec<PreflightIssue>,
}

impl PreflightResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.issues.len()
    }

    /// Print formatted output
    pub fn print(&self) {
        println!();
        println!("Pre-flight Checks");
        println!("{}", "═".repeat(61));
        println!();

        print_section("Local Environment:", &self.local_env);
        print_section("Docker Volumes:", &self.volumes);
        print_section("Output Directory:", &self.output);

        println!("{}", "═".repeat(61));
        if self.all_passed() {
            println!("PASSED: All pre-flight checks successful");
        } else {
            println!("FAILED: {} issue(s) must be resolved", self.failed_count());
            println!();
            for (i, issue) in self.issues.iter().enumerate() {
                println!("Issue {}: {}", i + 1, issue.title);
                println!("  {}", issue.explanation);
                println!();
                println!("  Fix options:");
                for fix in &issue.fixes {
                    println!("    • {}", fix);
                }
                println!();
            }
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    if checks.is_empty() {
        return;
    }
    println!("{}", title);
    for check in checks {
        let icon = if check.passed { "✓" } else { "✗" };
        println!("  {} {}", icon, check.message);
        if let Some(ref details) = check.details {
            println!("      {}", details);
        }
    }
    println!();
}

/// Run all pre-flight checks
///
/// Docker volumes are only inspected when the `docker` binary was found.
pub async fn run_preflight_checks<R: CommandRunner>(
    runner: &R,
    request: &MigrationRequest,
    settings: &MigratorSettings,
) -> PreflightResult {
    let mut result = PreflightResult::new();

    // 1. Host tools
    check_local_environment(&mut result);

    // 2. Source and output volumes
    if result
        .local_env
        .iter()
        .any(|c| c.name == "docker" && c.passed)
    {
        check_volumes(&mut result, runner, request, settings).await;
    }

    // 3. Host-visible output root
    check_output_root(&mut result, settings);

    result
}

fn check_local_environment(result: &mut PreflightResult) {
    let mut missing = Vec::new();

    for (tool, package) in REQUIRED_TOOLS {
        match which::which(tool) {
            Ok(path) => {
                result.local_env.push(
                    CheckResult::pass(*tool, format!("{} found", tool))
                        .with_details(path.display().to_string()),
                );
            }
            Err(_) => {
                missing.push((*tool, *package));
                result
                    .local_env
                    .push(CheckResult::fail(*tool, format!("{} not found in PATH", tool)));
            }
        }
    }

    if !missing.is_empty() {
        result.issues.push(PreflightIssue {
            title: "Missing host tools".to_string(),
            explanation: format!(
                "Required tools not found: {}",
                missing
                    .iter()
                    .map(|(t, _)| *t)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            fixes: missing
                .iter()
                .map(|(t, p)| format!("Install {} (package: {})", t, p))
                .collect(),
        });
    }
}

async fn check_volumes<R: CommandRunner>(
    result: &mut PreflightResult,
    runner: &R,
    request: &MigrationRequest,
    settings: &MigratorSettings,
) {
    let volumes = [
        ("source", request.source_volume.as_str()),
        ("output", settings.output_volume.as_str()),
    ];

    for (role, volume) in volumes {
        match runner
            .run(
                &volume_inspect(volume),
                &format!("{} volume '{}' not found", role, volume),
            )
            .await
        {
            Ok(_) => result.volumes.push(CheckResult::pass(
                role,
                format!("{} volume '{}' exists", role, volume),
            )),
            Err(e) => {
                result.volumes.push(
                    CheckResult::fail(role, format!("{} volume '{}' is not available", role, volume))
                        .with_details(e.to_string()),
                );
                let fixes = if role == "source" {
                    vec![
                        "Check the volume name with: docker volume ls".to_string(),
                        "Make sure the legacy validator package is installed".to_string(),
                    ]
                } else {
                    vec![
                        format!("Create it with: docker volume create {}", volume),
                        "Or point output_volume in the config file at an existing volume"
                            .to_string(),
                    ]
                };
                result.issues.push(PreflightIssue {
                    title: format!("Missing {} volume", role),
                    explanation: format!("Docker volume '{}' could not be inspected", volume),
                    fixes,
                });
            }
        }
    }
}

fn check_output_root(result: &mut PreflightResult, settings: &MigratorSettings) {
    let root = &settings.host_output_root;
    if root.is_dir() {
        result.output.push(
            CheckResult::pass("output_root", "Output root is a directory")
                .with_details(root.display().to_string()),
        );
    } else {
        result.output.push(
            CheckResult::fail("output_root", "Output root is not a directory")
                .with_details(root.display().to_string()),
        );
        result.issues.push(PreflightIssue {
            title: "Output root not reachable".to_string(),
            explanation: format!(
                "'{}' must be where volume '{}' is visible on this host",
                root.display(),
                settings.output_volume
            ),
            fixes: vec![
                format!(
                    "Find the mountpoint with: docker volume inspect -f '{{{{.Mountpoint}}}}' {}",
                    settings.output_volume
                ),
                "Set host_output_root in the config file or pass --host-output-root".to_string(),
            ],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::runner::CommandError;
    use async_trait::async_trait;

    /// Fails `docker volume inspect` for the listed volumes.
    struct VolumeRunner {
        missing: Vec<&'static str>,
    }

    #[async_trait]
    impl CommandRunner for VolumeRunner {
        async fn run(&self, tokens: &[String], failure_message: &str) -> Result<String, CommandError> {
            let volume = tokens.last().cloned().unwrap_or_default();
            if self.missing.contains(&volume.as_str()) {
                return Err(CommandError::NonZeroExit {
                    message: failure_message.to_string(),
                    command: tokens.join(" "),
                    code: Some(1),
                    stderr: format!("Error: No such volume: {}", volume),
                });
            }
            Ok("[]".to_string())
        }
    }

    fn request() -> MigrationRequest {
        MigrationRequest {
            network: Network::Mainnet,
            source_image: "prysm-validator:1.0.0".to_string(),
            source_volume: "validator-data".to_string(),
            wallet_dir: ".eth2validators".to_string(),
            utility_image: "alpine:3.15".to_string(),
        }
    }

    #[tokio::test]
    async fn test_volume_checks() {
        let temp = tempfile::tempdir().unwrap();
        let settings = MigratorSettings {
            output_volume: "migration-out".to_string(),
            host_output_root: temp.path().to_path_buf(),
            ..Default::default()
        };
        let mut result = PreflightResult::new();
        let runner = VolumeRunner {
            missing: vec!["migration-out"],
        };
        check_volumes(&mut result, &runner, &request(), &settings).await;

        assert_eq!(result.volumes.len(), 2);
        assert!(result.volumes[0].passed);
        assert!(!result.volumes[1].passed);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.issues[0].title, "Missing output volume");
    }

    #[test]
    fn test_output_root_check() {
        let temp = tempfile::tempdir().unwrap();
        let mut result = PreflightResult::new();
        let settings = MigratorSettings {
            host_output_root: temp.path().to_path_buf(),
            ..Default::default()
        };
        check_output_root(&mut result, &settings);
        assert!(result.all_passed());

        let mut result = PreflightResult::new();
        let settings = MigratorSettings {
            host_output_root: temp.path().join("missing"),
            ..Default::default()
        };
        check_output_root(&mut result, &settings);
        assert!(!result.all_passed());
        assert!(!result.output[0].passed);
    }
}
