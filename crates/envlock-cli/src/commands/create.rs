use super::{conda_from_env, host_platform, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use envlock_core::Engine;
use envlock_resolve::DockerCli;
use std::path::Path;

pub fn run(lockfile: Option<&Path>) -> Result<u8, String> {
    let conda = conda_from_env()?;
    let docker = DockerCli::new();
    let engine = Engine::new(&conda, &docker, host_platform()?);

    let pb = spinner("creating environment...");
    match engine.create(lockfile) {
        Ok(created) => {
            spin_ok(&pb, &format!("created environment '{}'", created.name));
            println!("prefix: {}", created.prefix.display());
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            spin_fail(&pb, "create failed");
            Err(e.to_string())
        }
    }
}
