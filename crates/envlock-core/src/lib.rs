//! Orchestration engine for the envlock lifecycle.
//!
//! This crate ties together manifest parsing, hash signing, and the
//! resolution strategies into the `Engine`: the central API for freezing a
//! manifest into a lock artifact, materializing an environment from one, and
//! checking that manifest, locks, and environment still agree.

pub mod engine;

pub use engine::{
    check_locks, default_lock_path, find_lockfiles, CreatedEnv, Engine, FreezeOptions,
    FreezeOutcome, FreezeResult, LockReport, LockVerdict, Verdict, RECORD_FILE,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] envlock_schema::ManifestError),
    #[error("resolve error: {0}")]
    Resolve(#[from] envlock_resolve::ResolveError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no hash signature found in {}", .path.display())]
    MissingSignature { path: PathBuf },
    #[error(
        "deps file ({}) and environment ({}) do not match:\nexpected: {expected}\nfound:    {found}",
        .depsfile.display(),
        .record.display()
    )]
    HashMismatch {
        depsfile: PathBuf,
        record: PathBuf,
        expected: String,
        found: String,
    },
}
