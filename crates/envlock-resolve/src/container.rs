//! Cross-platform resolution through the builder container.
//!
//! The host stages the manifest and environment name in a scratch directory,
//! mounts it into the builder, and reads the lock body the builder leaves
//! behind. The handoff is purely filesystem-based so the container needs no
//! network access back to the host.

use crate::docker::ContainerEngine;
use crate::ResolveError;
use envlock_schema::{parse_manifest_str, superset_report, EnvManifest};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Where scratch directories are created. Docker Desktop shares `/tmp` with
/// the Linux VM by default, which is what makes the mount work from macOS.
pub const SCRATCH_ROOT: &str = "/tmp";

/// Manifest copy staged for the builder.
pub const SCRATCH_MANIFEST: &str = "deps.yml";

/// File carrying the environment name into the builder.
pub const SCRATCH_ENV_NAME: &str = "env_name";

/// Lock body the builder writes back.
pub const SCRATCH_ARTIFACT: &str = "deps.lock.yml";

/// Resolve `manifest` inside the builder container, returning the lock body.
///
/// The artifact is returned exactly as the builder wrote it; only parsing
/// and the superset check read it. The scratch directory is removed when
/// this returns, on success or failure.
pub fn resolve_in_container(
    engine: &dyn ContainerEngine,
    depsfile: &Path,
    manifest: &EnvManifest,
) -> Result<String, ResolveError> {
    let image = engine.build_builder()?;

    let scratch = tempfile::Builder::new()
        .prefix("envlock-")
        .tempdir_in(SCRATCH_ROOT)?;
    debug!("staging builder inputs in {}", scratch.path().display());
    fs::copy(depsfile, scratch.path().join(SCRATCH_MANIFEST))?;
    fs::write(scratch.path().join(SCRATCH_ENV_NAME), &manifest.name)?;

    engine.run_builder(&image, scratch.path())?;

    let body = fs::read_to_string(scratch.path().join(SCRATCH_ARTIFACT))?;
    let artifact = parse_manifest_str(&body)
        .map_err(|err| ResolveError::Export(format!("unparseable builder artifact: {err}")))?;
    let report = superset_report(manifest, &artifact);
    if !report.is_complete() {
        return Err(ResolveError::IncompleteResolution { report });
    }
    Ok(body)
}
