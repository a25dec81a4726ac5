//! Manifest model, integrity signatures, and dependency classification for envlock.
//!
//! This crate defines the schema layer: YAML environment manifests
//! (`EnvManifest`), the `# ENVHASH:` signature protocol binding a lock
//! artifact to the manifest bytes that produced it, and the classification
//! and superset checks used to validate resolved artifacts.

pub mod classify;
pub mod integrity;
pub mod manifest;

pub use classify::{classify, package_name, superset_report, NameSets, SupersetReport};
pub use integrity::{embed_digest, extract_digest, manifest_digest, SignatureError, ENVHASH_SIGIL};
pub use manifest::{
    parse_manifest_file, parse_manifest_slice, parse_manifest_str, DependencyEntry, EnvManifest,
    ManifestError,
};
