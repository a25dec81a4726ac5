use super::{colorize_verdict, EXIT_FAILURE, EXIT_SUCCESS};
use envlock_core::{check_locks, find_lockfiles, Verdict};
use std::path::{Path, PathBuf};

pub fn run(depsfile: &Path, lockfiles: &[PathBuf]) -> Result<u8, String> {
    let lockfiles = if lockfiles.is_empty() {
        find_lockfiles(Path::new(".")).map_err(|e| e.to_string())?
    } else {
        lockfiles.to_vec()
    };
    if lockfiles.is_empty() {
        println!("no lock files found");
        return Ok(EXIT_SUCCESS);
    }

    let report = check_locks(depsfile, &lockfiles).map_err(|e| e.to_string())?;
    for item in &report.checked {
        match &item.verdict {
            Verdict::Fresh => {
                println!("{}: {}", item.path.display(), colorize_verdict("fresh"));
            }
            Verdict::Stale { expected, found } => {
                println!("{}: {}", item.path.display(), colorize_verdict("stale"));
                println!("  expected: {expected}");
                println!("  found:    {found}");
            }
            Verdict::Unsigned => {
                println!("{}: {}", item.path.display(), colorize_verdict("unsigned"));
            }
        }
    }

    if report.all_fresh() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}
