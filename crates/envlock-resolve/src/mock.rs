use crate::conda::PackageManager;
use crate::container::{SCRATCH_ARTIFACT, SCRATCH_ENV_NAME, SCRATCH_MANIFEST};
use crate::docker::{ContainerEngine, BUILDER_IMAGE};
use crate::ResolveError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// In-memory conda for tests. Records every call and synthesizes exports
/// the way `conda env export` formats them.
pub struct MockConda {
    envs_root: PathBuf,
    export_body: String,
    fail_create: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockConda {
    pub fn new(envs_root: impl Into<PathBuf>) -> Self {
        Self {
            envs_root: envs_root.into(),
            export_body: "channels:\n- defaults\ndependencies:\n- python=3.9.2=h123_0\n"
                .to_owned(),
            fail_create: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the channel and dependency lines of synthesized exports.
    #[must_use]
    pub fn with_export_body(mut self, body: impl Into<String>) -> Self {
        self.export_body = body.into();
        self
    }

    /// Make `env_create` fail with `stderr` as the solver diagnostic.
    #[must_use]
    pub fn failing_create(mut self, stderr: impl Into<String>) -> Self {
        self.fail_create = Some(stderr.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    fn record(&self, entry: String) -> Result<(), ResolveError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|e| ResolveError::Config(format!("mock mutex poisoned: {e}")))?;
        calls.push(entry);
        Ok(())
    }
}

impl PackageManager for MockConda {
    fn env_create(&self, file: &Path, name: &str) -> Result<(), ResolveError> {
        self.record(format!("create {} {name}", file.display()))?;
        if let Some(stderr) = &self.fail_create {
            return Err(ResolveError::Subprocess {
                command: "conda env create".to_owned(),
                status: "exit status: 1".to_owned(),
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }
        Ok(())
    }

    fn env_install(&self, file: &Path, name: &str) -> Result<(), ResolveError> {
        self.record(format!("install {} {name}", file.display()))?;
        fs::create_dir_all(self.envs_root.join(name))?;
        Ok(())
    }

    fn env_export(&self, name: &str) -> Result<String, ResolveError> {
        self.record(format!("export {name}"))?;
        Ok(format!(
            "name: {name}\n{}prefix: {}\n",
            self.export_body,
            self.envs_root.join(name).display()
        ))
    }

    fn env_remove(&self, name: &str) -> Result<(), ResolveError> {
        self.record(format!("remove {name}"))?;
        Ok(())
    }

    fn envs_root(&self) -> Result<PathBuf, ResolveError> {
        Ok(self.envs_root.clone())
    }
}

/// Container engine stand-in. Verifies the scratch handoff the real builder
/// depends on and writes a canned artifact.
pub struct MockContainer {
    artifact: Option<String>,
    fail_run: bool,
    calls: Mutex<Vec<String>>,
}

impl MockContainer {
    pub fn new(artifact: impl Into<String>) -> Self {
        Self {
            artifact: Some(artifact.into()),
            fail_run: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A builder that runs but leaves nothing behind.
    pub fn without_artifact() -> Self {
        Self {
            artifact: None,
            fail_run: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make `run_builder` fail after the handoff checks.
    #[must_use]
    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    fn record(&self, entry: String) -> Result<(), ResolveError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|e| ResolveError::Config(format!("mock mutex poisoned: {e}")))?;
        calls.push(entry);
        Ok(())
    }
}

impl ContainerEngine for MockContainer {
    fn build_builder(&self) -> Result<String, ResolveError> {
        self.record("build".to_owned())?;
        Ok(BUILDER_IMAGE.to_owned())
    }

    fn run_builder(&self, image: &str, scratch: &Path) -> Result<(), ResolveError> {
        if !scratch.join(SCRATCH_MANIFEST).exists() {
            return Err(ResolveError::Config("manifest was not staged".to_owned()));
        }
        let name = fs::read_to_string(scratch.join(SCRATCH_ENV_NAME))?;
        self.record(format!("run {image} name={name}"))?;
        if self.fail_run {
            return Err(ResolveError::Subprocess {
                command: "docker run".to_owned(),
                status: "exit status: 125".to_owned(),
                stdout: String::new(),
                stderr: "mock builder failure".to_owned(),
            });
        }
        if let Some(artifact) = &self.artifact {
            fs::write(scratch.join(SCRATCH_ARTIFACT), artifact)?;
        }
        Ok(())
    }
}
