use super::{conda_from_env, host_platform, EXIT_SUCCESS};
use envlock_core::Engine;
use envlock_resolve::DockerCli;
use std::path::Path;

pub fn run(depsfile: &Path) -> Result<u8, String> {
    let conda = conda_from_env()?;
    let docker = DockerCli::new();
    let engine = Engine::new(&conda, &docker, host_platform()?);

    engine.check(depsfile).map_err(|e| e.to_string())?;
    println!("{} matches the environment", depsfile.display());
    Ok(EXIT_SUCCESS)
}
