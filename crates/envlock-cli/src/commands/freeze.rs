use super::{conda_from_env, host_platform, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use envlock_core::{Engine, FreezeOptions, FreezeOutcome};
use envlock_resolve::{DockerCli, Platform};
use std::path::Path;

pub fn run(
    depsfile: &Path,
    lockfile: Option<&Path>,
    target: Option<Platform>,
    validate_native: bool,
) -> Result<u8, String> {
    let conda = conda_from_env()?;
    let docker = DockerCli::new();
    let engine = Engine::new(&conda, &docker, host_platform()?);

    let pb = spinner("resolving lock file...");
    let options = FreezeOptions {
        target,
        validate_native,
    };
    match engine.freeze(depsfile, lockfile, options) {
        Ok(result) => {
            match result.outcome {
                FreezeOutcome::Written => {
                    spin_ok(&pb, &format!("wrote {}", result.lockfile.display()));
                }
                FreezeOutcome::UpToDate => {
                    spin_ok(&pb, &format!("{} is up to date", result.lockfile.display()));
                }
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            spin_fail(&pb, "freeze failed");
            Err(e.to_string())
        }
    }
}
