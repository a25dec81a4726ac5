use crate::ResolveError;
use std::fmt;
use std::str::FromStr;

/// Operating systems the freeze pipeline knows how to target.
///
/// Values render the way `uname -s` spells them, which is also how they
/// appear in default lock file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Darwin,
}

impl Platform {
    /// Platform of the running process, if it is one conda runs on.
    pub fn host() -> Option<Platform> {
        if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else if cfg!(target_os = "macos") {
            Some(Platform::Darwin)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::Darwin => "Darwin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Linux" => Ok(Platform::Linux),
            "Darwin" => Ok(Platform::Darwin),
            other => Err(format!(
                "unknown platform '{other}', expected Linux or Darwin"
            )),
        }
    }
}

/// How a freeze request will be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Solve with the host's own conda.
    Native,
    /// Solve inside the Linux builder container.
    Container,
}

/// Pick the strategy for a host/target pair.
///
/// Same platform resolves natively; Linux can be targeted from Darwin through
/// the builder container; every other pair is rejected here, before any side
/// effect.
pub fn select_strategy(host: Platform, target: Platform) -> Result<Strategy, ResolveError> {
    if host == target {
        return Ok(Strategy::Native);
    }
    match (host, target) {
        (Platform::Darwin, Platform::Linux) => Ok(Strategy::Container),
        _ => Err(ResolveError::UnsupportedCrossPlatform { host, target }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_platform_is_native() {
        assert_eq!(
            select_strategy(Platform::Linux, Platform::Linux).unwrap(),
            Strategy::Native
        );
        assert_eq!(
            select_strategy(Platform::Darwin, Platform::Darwin).unwrap(),
            Strategy::Native
        );
    }

    #[test]
    fn linux_from_darwin_is_containerized() {
        assert_eq!(
            select_strategy(Platform::Darwin, Platform::Linux).unwrap(),
            Strategy::Container
        );
    }

    #[test]
    fn darwin_from_linux_is_rejected() {
        let err = select_strategy(Platform::Linux, Platform::Darwin).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("Darwin"));
        assert!(rendered.contains("Linux"));
    }

    #[test]
    fn display_matches_lock_name_convention() {
        assert_eq!(Platform::Linux.to_string(), "Linux");
        assert_eq!(Platform::Darwin.to_string(), "Darwin");
    }

    #[test]
    fn parses_from_str() {
        assert_eq!("Linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("Darwin".parse::<Platform>().unwrap(), Platform::Darwin);
        assert!("Windows".parse::<Platform>().is_err());
    }

    #[test]
    fn host_is_known_on_supported_targets() {
        if cfg!(target_os = "linux") {
            assert_eq!(Platform::host(), Some(Platform::Linux));
        } else if cfg!(target_os = "macos") {
            assert_eq!(Platform::host(), Some(Platform::Darwin));
        }
    }
}
