use crate::manifest::{DependencyEntry, EnvManifest};
use std::collections::BTreeSet;
use std::fmt;

/// Key of the nested dependency block handed to pip.
const PIP_KEY: &str = "pip";

/// Bare package name of a dependency spec: everything before the first `=`.
///
/// This covers every pinning shape conda and pip write (`python=3.6`,
/// `numpy=1.14=py36_0`, `requests==2.18`). A spec without `=` is already a
/// bare name.
pub fn package_name(spec: &str) -> &str {
    match spec.find('=') {
        Some(idx) => &spec[..idx],
        None => spec,
    }
}

/// Dependency names split by installing universe.
///
/// conda and pip namespaces are independent; a name is never allowed to
/// satisfy a request from the other universe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSets {
    pub conda: BTreeSet<String>,
    pub pip: BTreeSet<String>,
}

/// Classify a dependency list into conda and pip name sets.
///
/// Bare specs feed the conda set. Every `pip:` nested block contributes to
/// the pip set (multiple blocks merge); other nested kinds are skipped.
pub fn classify(entries: &[DependencyEntry]) -> NameSets {
    let mut sets = NameSets::default();
    for entry in entries {
        match entry {
            DependencyEntry::Spec(spec) => {
                sets.conda.insert(package_name(spec).to_owned());
            }
            DependencyEntry::Nested(blocks) => {
                for (kind, specs) in blocks {
                    if kind != PIP_KEY {
                        continue;
                    }
                    for spec in specs {
                        sets.pip.insert(package_name(spec).to_owned());
                    }
                }
            }
        }
    }
    sets
}

/// Names requested by a manifest but absent from a resolved artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupersetReport {
    pub missing_conda: BTreeSet<String>,
    pub missing_pip: BTreeSet<String>,
}

impl SupersetReport {
    /// True when the artifact covers every requested name in both universes.
    pub fn is_complete(&self) -> bool {
        self.missing_conda.is_empty() && self.missing_pip.is_empty()
    }
}

impl fmt::Display for SupersetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete() {
            return write!(f, "all requested packages present");
        }
        let mut parts = Vec::new();
        if !self.missing_conda.is_empty() {
            parts.push(format!("missing conda packages: {}", join(&self.missing_conda)));
        }
        if !self.missing_pip.is_empty() {
            parts.push(format!("missing pip packages: {}", join(&self.missing_pip)));
        }
        write!(f, "{}", parts.join("; "))
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compare a resolved artifact against the manifest that requested it.
///
/// A correct resolution pins more than was asked for, never less: the
/// artifact's names must be a superset of the manifest's in each universe.
/// The report lists anything the resolution dropped.
pub fn superset_report(manifest: &EnvManifest, artifact: &EnvManifest) -> SupersetReport {
    let requested = classify(&manifest.dependencies);
    let resolved = classify(&artifact.dependencies);
    SupersetReport {
        missing_conda: requested
            .conda
            .difference(&resolved.conda)
            .cloned()
            .collect(),
        missing_pip: requested.pip.difference(&resolved.pip).cloned().collect(),
    }
}
