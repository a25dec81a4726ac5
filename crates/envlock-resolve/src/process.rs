use crate::ResolveError;
use std::ffi::OsStr;
use std::process::{Command, Output};
use tracing::{debug, error};

/// Run a command to completion, capturing both output streams.
///
/// A nonzero exit becomes `ResolveError::Subprocess` carrying the full
/// command line, the exit status, and everything the process wrote, so a
/// failure deep inside conda or docker surfaces with enough to reproduce it.
pub fn run_command(program: impl AsRef<OsStr>, args: &[&str]) -> Result<Output, ResolveError> {
    let program = program.as_ref();
    debug!("running: {} {}", program.to_string_lossy(), args.join(" "));
    let output = Command::new(program).args(args).output()?;
    if output.status.success() {
        Ok(output)
    } else {
        error!("command failed: {} {}", program.to_string_lossy(), args.join(" "));
        Err(subprocess_error(&program.to_string_lossy(), args, &output))
    }
}

pub(crate) fn subprocess_error(program: &str, args: &[&str], output: &Output) -> ResolveError {
    ResolveError::Subprocess {
        command: format!("{program} {}", args.join(" ")),
        status: output.status.to_string(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
