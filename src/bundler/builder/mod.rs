//! Artifact building: packaging, archiving, and checksums.
//!
//! # Module Organization
//!
//! - [`archive`] - `.tar.gz` / `.zip` creation for compressed artifacts
//! - [`checksum`] - SHA-256 calculation and the `checksums.txt` manifest
//! - [`orchestrator`] - [`ArtifactPackager`], the per-target batch
//! - [`tool_detection`] - External tool availability checking

mod archive;
mod checksum;
mod orchestrator;
pub mod tool_detection;

pub use archive::archive_artifact;
pub use checksum::{ChecksumWriter, ManifestEntry, calculate_sha256, parse_manifest, sha256_hex};
pub use orchestrator::ArtifactPackager;
