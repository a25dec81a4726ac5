//! Same-platform resolution through a transient conda environment.

use crate::conda::PackageManager;
use crate::ResolveError;
use envlock_schema::{parse_manifest_str, superset_report, EnvManifest};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

const TRANSIENT_PREFIX: &str = "___envlock-";

/// A solver-only environment that removes itself when dropped.
///
/// Names are unique per invocation, so concurrent freezes cannot collide and
/// a crashed run never blocks the next one.
pub struct TransientEnv<'a> {
    conda: &'a dyn PackageManager,
    name: String,
}

impl<'a> TransientEnv<'a> {
    /// Solve `depsfile` into a fresh uniquely-named environment.
    pub fn create(conda: &'a dyn PackageManager, depsfile: &Path) -> Result<Self, ResolveError> {
        let name = format!("{TRANSIENT_PREFIX}{}", Uuid::now_v7());
        debug!("creating transient environment {name}");
        if let Err(err) = conda.env_create(depsfile, &name) {
            // A failed solve can still leave a partial environment behind.
            let _ = conda.env_remove(&name);
            return Err(err);
        }
        Ok(Self { conda, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for TransientEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransientEnv")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drop for TransientEnv<'_> {
    fn drop(&mut self) {
        debug!("removing transient environment {}", self.name);
        if let Err(err) = self.conda.env_remove(&self.name) {
            warn!("failed to remove transient environment {}: {err}", self.name);
        }
    }
}

/// Resolve `manifest` on the host platform, returning the lock body.
///
/// The manifest is solved into a [`TransientEnv`], exported, and the export
/// rewritten to carry the manifest's own environment name. With `validate`
/// set, the export must pin every requested package or the resolution is
/// rejected.
pub fn resolve_native(
    conda: &dyn PackageManager,
    depsfile: &Path,
    manifest: &EnvManifest,
    validate: bool,
) -> Result<String, ResolveError> {
    let env = TransientEnv::create(conda, depsfile)?;
    let exported = conda.env_export(env.name())?;
    drop(env);

    let mut artifact = parse_manifest_str(&exported)
        .map_err(|err| ResolveError::Export(format!("unparseable export: {err}")))?;
    // The export names the transient environment; the lock carries the real
    // name so create can use it directly.
    artifact.name = manifest.name.clone();

    if validate {
        let report = superset_report(manifest, &artifact);
        if !report.is_complete() {
            return Err(ResolveError::IncompleteResolution { report });
        }
    }

    artifact
        .to_yaml()
        .map_err(|err| ResolveError::Export(format!("unserializable lock body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConda;
    use std::collections::BTreeSet;

    fn manifest(input: &str) -> EnvManifest {
        parse_manifest_str(input).expect("test manifest should parse")
    }

    #[test]
    fn transient_names_are_unique_and_prefixed() {
        let conda = MockConda::new("/envs");
        let first = TransientEnv::create(&conda, Path::new("deps.yml")).unwrap();
        let second = TransientEnv::create(&conda, Path::new("deps.yml")).unwrap();
        assert!(first.name().starts_with(TRANSIENT_PREFIX));
        assert!(second.name().starts_with(TRANSIENT_PREFIX));
        assert_ne!(first.name(), second.name());
    }

    #[test]
    fn environment_is_removed_on_drop() {
        let conda = MockConda::new("/envs");
        let name = {
            let env = TransientEnv::create(&conda, Path::new("deps.yml")).unwrap();
            env.name().to_owned()
        };
        assert!(conda.calls().contains(&format!("remove {name}")));
    }

    #[test]
    fn failed_create_still_attempts_removal() {
        let conda = MockConda::new("/envs").failing_create("no solution for python=9");
        let err = TransientEnv::create(&conda, Path::new("deps.yml")).unwrap_err();
        assert!(matches!(err, ResolveError::Subprocess { .. }));
        let calls = conda.calls();
        assert!(calls[0].starts_with("create "));
        assert!(calls[1].starts_with("remove "));
    }

    #[test]
    fn lock_body_carries_manifest_name_and_no_prefix() {
        let conda = MockConda::new("/envs");
        let request = manifest("name: analytics\ndependencies:\n- python=3.9\n");
        let body = resolve_native(&conda, Path::new("deps.yml"), &request, false).unwrap();
        assert!(body.contains("name: analytics"));
        assert!(!body.contains(TRANSIENT_PREFIX));
        assert!(!body.contains("prefix"));
    }

    #[test]
    fn transient_env_is_gone_before_resolution_returns() {
        let conda = MockConda::new("/envs");
        let request = manifest("name: analytics\ndependencies:\n- python=3.9\n");
        resolve_native(&conda, Path::new("deps.yml"), &request, false).unwrap();
        let calls = conda.calls();
        let export = calls.iter().position(|c| c.starts_with("export ")).unwrap();
        let remove = calls.iter().position(|c| c.starts_with("remove ")).unwrap();
        assert!(export < remove);
    }

    #[test]
    fn validation_rejects_a_dropped_package() {
        let conda = MockConda::new("/envs");
        let request = manifest(
            "name: analytics\ndependencies:\n- python=3.9\n- pip:\n  - requests==2.18\n",
        );
        let err = resolve_native(&conda, Path::new("deps.yml"), &request, true).unwrap_err();
        let ResolveError::IncompleteResolution { report } = err else {
            panic!("expected IncompleteResolution");
        };
        assert_eq!(report.missing_pip, BTreeSet::from(["requests".into()]));
    }

    #[test]
    fn without_validation_the_export_is_trusted() {
        let conda = MockConda::new("/envs");
        let request = manifest(
            "name: analytics\ndependencies:\n- python=3.9\n- pip:\n  - requests==2.18\n",
        );
        let body = resolve_native(&conda, Path::new("deps.yml"), &request, false).unwrap();
        assert!(body.contains("name: analytics"));
    }

    #[test]
    fn validation_passes_when_export_is_a_superset() {
        let conda = MockConda::new("/envs").with_export_body(
            "channels:\n- defaults\ndependencies:\n- python=3.9.2=h123_0\n- openssl=1.1.1=h456_0\n",
        );
        let request = manifest("name: analytics\ndependencies:\n- python=3.9\n");
        let body = resolve_native(&conda, Path::new("deps.yml"), &request, true).unwrap();
        assert!(body.contains("openssl=1.1.1"));
    }
}
