// ABOUTME: Builder for `docker run` token lists used by the export steps
// ABOUTME: Keeps volume binds, entrypoint, image, and arguments in a fixed order

/// One ephemeral `docker run --rm` invocation.
///
/// Renders as:
/// `docker run --rm --name <name> [--volume <src>:<dst>]... [--entrypoint=<path>] <image> [args]...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerRun {
    name: String,
    image: String,
    volumes: Vec<(String, String)>,
    entrypoint: Option<String>,
    args: Vec<String>,
}

impl DockerRun {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            volumes: Vec::new(),
            entrypoint: None,
            args: Vec::new(),
        }
    }

    /// Bind a named volume at `target` inside the container.
    pub fn volume(mut self, volume: impl Into<String>, target: impl Into<String>) -> Self {
        self.volumes.push((volume.into(), target.into()));
        self
    }

    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn into_tokens(self) -> Vec<String> {
        let mut tokens = vec![
            "docker run".to_string(),
            "--rm".to_string(),
            format!("--name {}", self.name),
        ];
        tokens.extend(
            self.volumes
                .into_iter()
                .map(|(volume, target)| format!("--volume {}:{}", volume, target)),
        );
        if let Some(entrypoint) = self.entrypoint {
            tokens.push(format!("--entrypoint={}", entrypoint));
        }
        tokens.push(self.image);
        tokens.extend(self.args);
        tokens
    }
}

/// `docker volume inspect <name>`, which fails when the volume does not exist.
pub fn volume_inspect(volume: &str) -> Vec<String> {
    vec!["docker volume inspect".to_string(), volume.to_string()]
}

/// `docker rm -f <name>`, which stops and removes a container left behind
/// by a killed `docker run` client.
pub fn remove_container(name: &str) -> Vec<String> {
    vec!["docker rm -f".to_string(), name.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::command_line;

    #[test]
    fn test_render_full_invocation() {
        let tokens = DockerRun::new("prysm-migration", "prysm-validator:1.0.0")
            .volume("validator-data", "/root")
            .volume("migration-out", "/out")
            .entrypoint("/usr/local/bin/validator")
            .arg("accounts list")
            .args(["--prater", "--accept-terms-of-use"])
            .into_tokens();

        assert_eq!(
            command_line(&tokens),
            "docker run --rm --name prysm-migration \
             --volume validator-data:/root --volume migration-out:/out \
             --entrypoint=/usr/local/bin/validator prysm-validator:1.0.0 \
             accounts list --prater --accept-terms-of-use"
        );
    }

    #[test]
    fn test_render_without_entrypoint() {
        let tokens = DockerRun::new("c", "alpine:3.15")
            .volume("v", "/root")
            .arg("cp /root/a /out/b")
            .into_tokens();
        assert_eq!(
            tokens,
            vec![
                "docker run",
                "--rm",
                "--name c",
                "--volume v:/root",
                "alpine:3.15",
                "cp /root/a /out/b"
            ]
        );
    }

    #[test]
    fn test_remove_container() {
        assert_eq!(
            command_line(&remove_container("prysm-migration")),
            "docker rm -f prysm-migration"
        );
    }
}
