//! Docker plumbing for cross-platform resolution.
//!
//! The builder image is self-contained: its Dockerfile inlines the lock
//! script at build time, so nothing has to be shipped alongside the binary.

use crate::process::{run_command, subprocess_error};
use crate::ResolveError;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Tag the builder image is built under.
pub const BUILDER_IMAGE: &str = "envlock-builder";

/// Where the scratch directory appears inside the container.
pub const ARTIFACT_MOUNT: &str = "/app/artifacts";

const DOCKERFILE: &str = include_str!("../builder/Dockerfile");
const BUILD_SCRIPT: &str = include_str!("../builder/build_lockfile.sh");

/// Inline the lock script into the Dockerfile.
///
/// The script is collapsed onto one line so it survives being echoed from a
/// single `RUN` instruction. Comments and blank lines are dropped; `;;`
/// would otherwise end up in the command.
fn interpolate_dockerfile() -> String {
    let one_line = BUILD_SCRIPT
        .lines()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join(";");
    DOCKERFILE.replace("ONE_LINE_COMMAND", &one_line)
}

/// Interface to the container runtime.
///
/// `DockerCli` shells out to docker; `mock::MockContainer` stands in for
/// tests.
pub trait ContainerEngine {
    /// Build the builder image, returning its tag.
    fn build_builder(&self) -> Result<String, ResolveError>;

    /// Run the builder with `scratch` mounted at [`ARTIFACT_MOUNT`].
    fn run_builder(&self, image: &str, scratch: &Path) -> Result<(), ResolveError>;
}

/// The docker CLI found on `PATH`.
#[derive(Default)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerEngine for DockerCli {
    fn build_builder(&self) -> Result<String, ResolveError> {
        let dockerfile = interpolate_dockerfile();
        debug!("building {BUILDER_IMAGE} image");
        let mut child = Command::new("docker")
            .args(["build", "-t", BUILDER_IMAGE, "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // If docker exits early the pipe breaks; the status check below
            // reports it.
            let _ = stdin.write_all(dockerfile.as_bytes());
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(subprocess_error("docker", &["build", "-t", BUILDER_IMAGE, "-"], &output));
        }
        Ok(BUILDER_IMAGE.to_owned())
    }

    fn run_builder(&self, image: &str, scratch: &Path) -> Result<(), ResolveError> {
        let mount = format!("{}:{ARTIFACT_MOUNT}", scratch.display());
        let output = run_command("docker", &["run", "--rm", "-v", &mount, "-t", image])?;
        debug!(
            "builder output:\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_replaces_the_placeholder() {
        let dockerfile = interpolate_dockerfile();
        assert!(!dockerfile.contains("ONE_LINE_COMMAND"));
    }

    #[test]
    fn script_lands_on_a_single_echo_line() {
        let dockerfile = interpolate_dockerfile();
        let echo_line = dockerfile
            .lines()
            .find(|line| line.contains("build_lockfile.sh"))
            .unwrap();
        assert!(echo_line.contains("conda env create"));
        assert!(echo_line.contains("conda env export"));
        assert!(echo_line.contains("deps.lock.yml"));
    }

    #[test]
    fn script_comments_are_dropped() {
        let dockerfile = interpolate_dockerfile();
        assert!(!dockerfile.contains(";#"));
        assert!(!dockerfile.contains(";;"));
    }

    #[test]
    fn entrypoint_runs_the_inlined_script() {
        let dockerfile = interpolate_dockerfile();
        assert!(dockerfile.contains(r#"ENTRYPOINT ["/bin/bash", "./build_lockfile.sh"]"#));
    }
}
