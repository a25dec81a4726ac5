use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("manifest has no environment name")]
    MissingName,
}

/// A conda environment file: either a loose `deps.yml` manifest or the body
/// of a resolved lock artifact.
///
/// Both roles share one shape. A manifest lists only the packages the author
/// cares about; an artifact produced by `conda env export` pins every
/// transitive dependency. conda appends a host-specific `prefix` entry on
/// export, so the field is accepted on input but never serialized.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EnvManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    #[serde(default, skip_serializing)]
    pub prefix: Option<String>,
}

/// One entry in a `dependencies:` list.
///
/// conda environment files mix bare package specs (`python=3.6`) with nested
/// blocks that hand a list of specs to another installer (`pip:`). Nested
/// kinds other than `pip` are preserved verbatim and ignored by
/// classification.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencyEntry {
    Spec(String),
    Nested(BTreeMap<String, Vec<String>>),
}

impl EnvManifest {
    fn validated(self) -> Result<Self, ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::MissingName);
        }
        Ok(self)
    }

    /// Serialize back to YAML. `prefix` is dropped here, which is what strips
    /// the exporting host's path from lock bodies.
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

pub fn parse_manifest_str(input: &str) -> Result<EnvManifest, ManifestError> {
    let manifest: EnvManifest = serde_yaml::from_str(input)?;
    manifest.validated()
}

pub fn parse_manifest_slice(input: &[u8]) -> Result<EnvManifest, ManifestError> {
    let manifest: EnvManifest = serde_yaml::from_slice(input)?;
    manifest.validated()
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<EnvManifest, ManifestError> {
    let content = fs::read(path)?;
    parse_manifest_slice(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_manifest() {
        let input = r"
name: analytics
channels:
- conda-forge
- defaults
dependencies:
- python=3.6
- numpy=1.14=py36_0
- pip:
  - requests==2.18
";
        let manifest = parse_manifest_str(input).expect("should parse");
        assert_eq!(manifest.name, "analytics");
        assert_eq!(manifest.channels, ["conda-forge", "defaults"]);
        assert_eq!(manifest.dependencies.len(), 3);
        assert_eq!(
            manifest.dependencies[0],
            DependencyEntry::Spec("python=3.6".to_owned())
        );
        let DependencyEntry::Nested(nested) = &manifest.dependencies[2] else {
            panic!("third entry should be the pip block");
        };
        assert_eq!(nested["pip"], ["requests==2.18"]);
    }

    #[test]
    fn parses_minimal_manifest() {
        let manifest = parse_manifest_str("name: tiny\n").expect("should parse");
        assert_eq!(manifest.name, "tiny");
        assert!(manifest.channels.is_empty());
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.prefix.is_none());
    }

    #[test]
    fn rejects_missing_name() {
        let input = "channels:\n- defaults\ndependencies:\n- python=3.6\n";
        let err = parse_manifest_str(input).unwrap_err();
        assert!(matches!(err, ManifestError::MissingName));
    }

    #[test]
    fn rejects_empty_name() {
        let err = parse_manifest_str("name: ''\ndependencies: []\n").unwrap_err();
        assert!(matches!(err, ManifestError::MissingName));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = parse_manifest_str("name: [unterminated\n").unwrap_err();
        assert!(matches!(err, ManifestError::Yaml(_)));
    }

    #[test]
    fn prefix_is_parsed_but_never_serialized() {
        let input = "name: test\ndependencies:\n- python=3.6\nprefix: /opt/conda/envs/test\n";
        let manifest = parse_manifest_str(input).expect("should parse");
        assert_eq!(manifest.prefix.as_deref(), Some("/opt/conda/envs/test"));

        let out = manifest.to_yaml().unwrap();
        assert!(!out.contains("prefix"));
        assert!(out.contains("name: test"));
    }

    #[test]
    fn signature_comment_is_ignored_by_the_parser() {
        // Lock artifacts carry a leading `# ENVHASH:` line; to YAML it is a
        // plain comment, so the artifact body parses without stripping it.
        let input = "# ENVHASH:d43c75e901a38edc8f01913b41bb3f757347a9b9\nname: test\ndependencies:\n- python=3.6\n";
        let manifest = parse_manifest_str(input).expect("should parse");
        assert_eq!(manifest.name, "test");
    }

    #[test]
    fn non_pip_nested_block_round_trips() {
        let input = "name: test\ndependencies:\n- conda-build=3.4\n- custom:\n  - something=1\n";
        let manifest = parse_manifest_str(input).expect("should parse");
        let out = manifest.to_yaml().unwrap();
        let reparsed = parse_manifest_str(&out).expect("should reparse");
        assert_eq!(manifest, reparsed);
    }

    #[test]
    fn parses_indented_document() {
        // Uniformly indented documents (as emitted by some templating) are
        // legal YAML and must parse like their dedented form.
        let input = b"\n        # name: not-test\n        name: test\n        channels:\n        - conda-forge\n        dependencies:\n        - python=3.6\n        ";
        let manifest = parse_manifest_slice(input).expect("should parse");
        assert_eq!(manifest.name, "test");
        assert_eq!(manifest.channels, ["conda-forge"]);
    }

    #[test]
    fn file_not_found_is_io_error() {
        let err = parse_manifest_file("/nonexistent/deps.yml").unwrap_err();
        assert!(matches!(err, ManifestError::Io(_)));
    }
}
