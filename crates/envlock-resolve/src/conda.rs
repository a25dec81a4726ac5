use crate::process::run_command;
use crate::ResolveError;
use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variables consulted to locate the conda executable, in order.
pub const CONDA_EXE_VARS: [&str; 2] = ["CONDA_EXE", "_CONDA_EXE"];

/// Interface to the package manager that owns environments.
///
/// `CondaCli` is the real thing; `mock::MockConda` stands in for tests.
/// Methods mirror the conda invocations they wrap.
pub trait PackageManager {
    /// `conda env create -f <file> -n <name> --yes`, solving a loose
    /// manifest into a named environment.
    fn env_create(&self, file: &Path, name: &str) -> Result<(), ResolveError>;

    /// `conda env create --yes -q --json --name <name> -f <file>`, the quiet
    /// force-overwrite form used to materialize a lock file.
    fn env_install(&self, file: &Path, name: &str) -> Result<(), ResolveError>;

    /// `conda env export -n <name>`, captured stdout.
    fn env_export(&self, name: &str) -> Result<String, ResolveError>;

    /// `conda env remove -n <name> --yes`.
    fn env_remove(&self, name: &str) -> Result<(), ResolveError>;

    /// Directory named environments are installed under: the first
    /// `envs_dirs` entry reported by `conda info --json`.
    fn envs_root(&self) -> Result<PathBuf, ResolveError>;
}

/// The conda CLI, addressed through an explicit executable path.
#[derive(Debug)]
pub struct CondaCli {
    exe: PathBuf,
}

impl CondaCli {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// Locate conda through `CONDA_EXE`, then `_CONDA_EXE`.
    ///
    /// This is the only place the process environment is consulted; the
    /// resolved path travels with the value from here on.
    pub fn from_env() -> Result<Self, ResolveError> {
        Self::from_values(CONDA_EXE_VARS.iter().map(env::var_os))
    }

    fn from_values(
        values: impl IntoIterator<Item = Option<OsString>>,
    ) -> Result<Self, ResolveError> {
        for value in values.into_iter().flatten() {
            if !value.is_empty() {
                return Ok(Self::new(PathBuf::from(value)));
            }
        }
        Err(ResolveError::Config(
            "conda executable not found; set CONDA_EXE or _CONDA_EXE".to_owned(),
        ))
    }

    pub fn executable(&self) -> &Path {
        &self.exe
    }
}

#[derive(Debug, Deserialize)]
struct CondaInfo {
    envs_dirs: Vec<PathBuf>,
}

impl PackageManager for CondaCli {
    fn env_create(&self, file: &Path, name: &str) -> Result<(), ResolveError> {
        let file = file.to_string_lossy();
        run_command(&self.exe, &["env", "create", "-f", &file, "-n", name, "--yes"])?;
        Ok(())
    }

    fn env_install(&self, file: &Path, name: &str) -> Result<(), ResolveError> {
        let file = file.to_string_lossy();
        run_command(
            &self.exe,
            &[
                "env", "create", "--yes", "-q", "--json", "--name", name, "-f", &file,
            ],
        )?;
        Ok(())
    }

    fn env_export(&self, name: &str) -> Result<String, ResolveError> {
        let output = run_command(&self.exe, &["env", "export", "-n", name])?;
        String::from_utf8(output.stdout)
            .map_err(|err| ResolveError::Export(format!("non-UTF-8 export output: {err}")))
    }

    fn env_remove(&self, name: &str) -> Result<(), ResolveError> {
        run_command(&self.exe, &["env", "remove", "-n", name, "--yes"])?;
        Ok(())
    }

    fn envs_root(&self) -> Result<PathBuf, ResolveError> {
        let output = run_command(&self.exe, &["info", "--json"])?;
        let info: CondaInfo = serde_json::from_slice(&output.stdout).map_err(|err| {
            ResolveError::Export(format!("unparseable `conda info --json`: {err}"))
        })?;
        let root = info
            .envs_dirs
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::Config("conda info reported no envs_dirs".to_owned()))?;
        debug!("conda envs root: {}", root.display());
        Ok(root)
    }
}
