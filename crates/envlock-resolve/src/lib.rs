//! Resolution strategies and external process plumbing for envlock.
//!
//! This crate implements the execution layer: the `PackageManager` trait over
//! the conda CLI, the `ContainerEngine` trait over docker, the native and
//! containerized freeze strategies with their scratch-directory handoff, and
//! mock implementations for tests.

pub mod conda;
pub mod container;
pub mod docker;
pub mod mock;
pub mod native;
pub mod platform;
pub mod process;

pub use conda::{CondaCli, PackageManager, CONDA_EXE_VARS};
pub use container::{resolve_in_container, SCRATCH_ROOT};
pub use docker::{ContainerEngine, DockerCli, ARTIFACT_MOUNT, BUILDER_IMAGE};
pub use native::{resolve_native, TransientEnv};
pub use platform::{select_strategy, Platform, Strategy};
pub use process::run_command;

use envlock_schema::SupersetReport;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolver I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Config(String),
    #[error(
        "command failed: {command}\n[status] {status}\n[stdout]\n{stdout}\n[stderr]\n{stderr}"
    )]
    Subprocess {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },
    #[error(
        "cannot target {target} from {host}; the only supported cross-platform freeze is Linux on Darwin"
    )]
    UnsupportedCrossPlatform { host: Platform, target: Platform },
    #[error("resolution is incomplete: {report}")]
    IncompleteResolution { report: SupersetReport },
    #[error("unusable conda output: {0}")]
    Export(String),
}
