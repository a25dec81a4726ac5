use crate::CoreError;
use envlock_resolve::{
    resolve_in_container, resolve_native, select_strategy, ContainerEngine, PackageManager,
    Platform, Strategy,
};
use envlock_schema::{
    embed_digest, extract_digest, manifest_digest, parse_manifest_file, parse_manifest_slice,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the lock copy recorded inside an environment prefix.
pub const RECORD_FILE: &str = "deps.lock.yml";

/// Central orchestration engine for the envlock lifecycle.
///
/// Coordinates manifest parsing, hash signing, and the resolution strategies
/// to provide the freeze, create, and check operations. The package manager
/// and container engine are injected so every operation can run against the
/// mocks in tests.
pub struct Engine<'a> {
    conda: &'a dyn PackageManager,
    container: &'a dyn ContainerEngine,
    host: Platform,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FreezeOptions {
    /// Platform to resolve for. Defaults to the host.
    pub target: Option<Platform>,
    /// Reject native resolutions that drop a requested package.
    pub validate_native: bool,
}

/// Result of a successful freeze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeResult {
    pub lockfile: PathBuf,
    pub outcome: FreezeOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeOutcome {
    Written,
    UpToDate,
}

/// A materialized environment and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEnv {
    pub name: String,
    pub prefix: PathBuf,
}

/// Freshness of one lock file against the current manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Fresh,
    Stale { expected: String, found: String },
    Unsigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockVerdict {
    pub path: PathBuf,
    pub verdict: Verdict,
}

#[derive(Debug, Default)]
pub struct LockReport {
    pub checked: Vec<LockVerdict>,
}

impl LockReport {
    pub fn all_fresh(&self) -> bool {
        self.checked.iter().all(|v| v.verdict == Verdict::Fresh)
    }
}

/// Default lock path for a target platform, `deps.<platform>.lock.yml`.
pub fn default_lock_path(target: Platform) -> PathBuf {
    PathBuf::from(format!("deps.{target}.lock.yml"))
}

/// List the platform lock files in `dir`, sorted by name.
///
/// The record copy (`deps.lock.yml`) is not a platform lock and is skipped.
pub fn find_lockfiles(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with("deps.")
            && name.ends_with(".lock.yml")
            && name.len() > RECORD_FILE.len()
        {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

fn lock_is_current(lockfile: &Path, digest: &str) -> bool {
    let Ok(existing) = fs::read_to_string(lockfile) else {
        return false;
    };
    extract_digest(&existing).is_ok_and(|found| found == digest)
}

/// Write through a temp file and rename so readers never see a partial lock.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), CoreError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
    // Fsync parent directory to ensure rename durability on power loss.
    if let Ok(f) = fs::File::open(dir) {
        let _ = f.sync_all();
    }
    Ok(())
}

impl<'a> Engine<'a> {
    pub fn new(
        conda: &'a dyn PackageManager,
        container: &'a dyn ContainerEngine,
        host: Platform,
    ) -> Self {
        Self {
            conda,
            container,
            host,
        }
    }

    /// Resolve `depsfile` into a hash-signed lock artifact.
    ///
    /// Platform support is checked before anything is read, so an unsupported
    /// host/target pair can never leave partial state behind. When the
    /// existing lock already carries the manifest's digest nothing is
    /// resolved or written.
    pub fn freeze(
        &self,
        depsfile: &Path,
        lockfile: Option<&Path>,
        options: FreezeOptions,
    ) -> Result<FreezeResult, CoreError> {
        let target = options.target.unwrap_or(self.host);
        let strategy = select_strategy(self.host, target)?;
        let lockfile = lockfile.map_or_else(|| default_lock_path(target), Path::to_path_buf);

        let raw = fs::read(depsfile)?;
        let digest = manifest_digest(&raw);

        if lock_is_current(&lockfile, &digest) {
            info!("{} is already up to date", lockfile.display());
            return Ok(FreezeResult {
                lockfile,
                outcome: FreezeOutcome::UpToDate,
            });
        }

        let manifest = parse_manifest_slice(&raw)?;
        info!(
            "freezing {} for {target} as environment '{}'",
            depsfile.display(),
            manifest.name
        );
        let body = match strategy {
            Strategy::Native => {
                resolve_native(self.conda, depsfile, &manifest, options.validate_native)?
            }
            Strategy::Container => resolve_in_container(self.container, depsfile, &manifest)?,
        };

        write_atomic(&lockfile, embed_digest(&digest, &body).as_bytes())?;
        info!("wrote {}", lockfile.display());
        Ok(FreezeResult {
            lockfile,
            outcome: FreezeOutcome::Written,
        })
    }

    /// Materialize the environment a signed lock artifact describes.
    ///
    /// The artifact is installed under the name it carries and then copied
    /// into the environment prefix, signature included, so `check` can later
    /// compare it against the manifest.
    pub fn create(&self, lockfile: Option<&Path>) -> Result<CreatedEnv, CoreError> {
        let lockfile =
            lockfile.map_or_else(|| default_lock_path(self.host), Path::to_path_buf);
        info!("creating environment from {}", lockfile.display());

        let manifest = parse_manifest_file(&lockfile)?;
        self.conda.env_install(&lockfile, &manifest.name)?;

        let prefix = self.conda.envs_root()?.join(&manifest.name);
        fs::copy(&lockfile, prefix.join(RECORD_FILE))?;
        debug!("recorded {} in {}", RECORD_FILE, prefix.display());
        Ok(CreatedEnv {
            name: manifest.name,
            prefix,
        })
    }

    /// Verify that the environment named by `depsfile` was created from the
    /// exact bytes of `depsfile`.
    pub fn check(&self, depsfile: &Path) -> Result<(), CoreError> {
        let raw = fs::read(depsfile)?;
        let expected = manifest_digest(&raw);
        let manifest = parse_manifest_slice(&raw)?;

        let record = self
            .conda
            .envs_root()?
            .join(&manifest.name)
            .join(RECORD_FILE);
        debug!("checking {} against {}", depsfile.display(), record.display());
        let recorded = fs::read_to_string(&record)?;
        let found = extract_digest(&recorded).map_err(|_| CoreError::MissingSignature {
            path: record.clone(),
        })?;

        if expected != found {
            return Err(CoreError::HashMismatch {
                depsfile: depsfile.to_path_buf(),
                record,
                expected,
                found,
            });
        }
        Ok(())
    }
}

/// Report the freshness of each lock file against `depsfile`.
///
/// Unlike [`Engine::check`] this never consults the package manager; verdicts
/// come from file contents alone.
pub fn check_locks(depsfile: &Path, lockfiles: &[PathBuf]) -> Result<LockReport, CoreError> {
    let raw = fs::read(depsfile)?;
    let expected = manifest_digest(&raw);

    let mut report = LockReport::default();
    for path in lockfiles {
        let content = fs::read_to_string(path)?;
        let verdict = match extract_digest(&content) {
            Ok(found) if found == expected => Verdict::Fresh,
            Ok(found) => Verdict::Stale {
                expected: expected.clone(),
                found,
            },
            Err(_) => Verdict::Unsigned,
        };
        report.checked.push(LockVerdict {
            path: path.clone(),
            verdict,
        });
    }
    Ok(report)
}
