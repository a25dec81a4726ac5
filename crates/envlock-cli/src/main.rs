mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use commands::EXIT_FAILURE;
use envlock_resolve::Platform;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "envlock",
    version,
    about = "Hash-signed conda lockfiles and reproducible environments"
)]
struct Cli {
    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Platform a lock file can be resolved for. Values match what
/// `platform.system()` reports, which is also what lock file names carry.
#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "verbatim")]
enum PlatformArg {
    Linux,
    Darwin,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Linux => Platform::Linux,
            PlatformArg::Darwin => Platform::Darwin,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a deps manifest into a hash-signed lock file.
    Freeze {
        /// Path to the deps manifest.
        #[arg(short, long, default_value = "deps.yml")]
        depsfile: PathBuf,
        /// Lock file to write. Defaults to deps.<platform>.lock.yml.
        #[arg(short, long)]
        lockfile: Option<PathBuf>,
        /// Platform to resolve for. Defaults to the host platform.
        #[arg(short, long)]
        platform: Option<PlatformArg>,
        /// Fail if the resolved lock drops a requested package.
        #[arg(long, default_value_t = false)]
        validate_native: bool,
    },
    /// Materialize a conda environment from a signed lock file.
    Create {
        /// Lock file to install. Defaults to deps.<platform>.lock.yml.
        #[arg(short, long)]
        lockfile: Option<PathBuf>,
    },
    /// Verify the environment was created from the current deps manifest.
    Check {
        /// Path to the deps manifest.
        #[arg(short, long, default_value = "deps.yml")]
        depsfile: PathBuf,
    },
    /// Report which lock files are stale against the deps manifest.
    CheckLocks {
        /// Path to the deps manifest.
        #[arg(short, long, default_value = "deps.yml")]
        depsfile: PathBuf,
        /// Lock files to check. Defaults to every platform lock found here.
        lockfiles: Vec<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ENVLOCK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Freeze {
            depsfile,
            lockfile,
            platform,
            validate_native,
        } => commands::freeze::run(
            &depsfile,
            lockfile.as_deref(),
            platform.map(Into::into),
            validate_native,
        ),
        Commands::Create { lockfile } => commands::create::run(lockfile.as_deref()),
        Commands::Check { depsfile } => commands::check::run(&depsfile),
        Commands::CheckLocks {
            depsfile,
            lockfiles,
        } => commands::check_locks::run(&depsfile, &lockfiles),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn freeze_defaults() {
        let cli = Cli::parse_from(["envlock", "freeze"]);
        let Commands::Freeze {
            depsfile,
            lockfile,
            platform,
            validate_native,
        } = cli.command
        else {
            panic!("expected freeze");
        };
        assert_eq!(depsfile, PathBuf::from("deps.yml"));
        assert!(lockfile.is_none());
        assert!(platform.is_none());
        assert!(!validate_native);
    }

    #[test]
    fn freeze_accepts_platform_names_verbatim() {
        let cli = Cli::parse_from(["envlock", "freeze", "-p", "Linux"]);
        let Commands::Freeze { platform, .. } = cli.command else {
            panic!("expected freeze");
        };
        assert!(matches!(platform, Some(PlatformArg::Linux)));

        let err = Cli::try_parse_from(["envlock", "freeze", "-p", "linux"]);
        assert!(err.is_err());
    }

    #[test]
    fn freeze_short_flags() {
        let cli = Cli::parse_from([
            "envlock", "freeze", "-d", "other.yml", "-l", "out.lock.yml", "-p", "Darwin",
        ]);
        let Commands::Freeze {
            depsfile,
            lockfile,
            platform,
            ..
        } = cli.command
        else {
            panic!("expected freeze");
        };
        assert_eq!(depsfile, PathBuf::from("other.yml"));
        assert_eq!(lockfile, Some(PathBuf::from("out.lock.yml")));
        assert!(matches!(platform, Some(PlatformArg::Darwin)));
    }

    #[test]
    fn check_locks_accepts_positional_lockfiles() {
        let cli = Cli::parse_from(["envlock", "check-locks", "a.lock.yml", "b.lock.yml"]);
        let Commands::CheckLocks { lockfiles, .. } = cli.command else {
            panic!("expected check-locks");
        };
        assert_eq!(lockfiles.len(), 2);
    }

    #[test]
    fn platform_arg_maps_onto_platform() {
        assert_eq!(Platform::from(PlatformArg::Linux), Platform::Linux);
        assert_eq!(Platform::from(PlatformArg::Darwin), Platform::Darwin);
    }
}
