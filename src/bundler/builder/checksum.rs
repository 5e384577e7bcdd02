//! Checksum manifest handling.
//!
//! The manifest (`checksums.txt`) holds one `<sha256>  <filename>` line per
//! artifact, in the `sha256sum` text format. It is truncated once at the start
//! of a build and appended to as each artifact reaches its final form.

use crate::bundler::{
    Error, Result, error::ErrorExt, settings::MANIFEST_FILE_NAME,
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// One manifest line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManifestEntry {
    /// Lowercase hex SHA-256, 64 characters.
    pub sha256: String,
    /// Artifact file name relative to the distribution directory.
    pub file_name: String,
}

impl ManifestEntry {
    /// Renders the entry as a manifest line, without the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{}  {}", self.sha256, self.file_name)
    }
}

/// Parses manifest text into entries.
///
/// Blank lines are skipped. Anything else must be a 64 hex digit hash,
/// two spaces and a file name.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let (hash, name) = line.split_once("  ").ok_or_else(|| {
                Error::GenericError(format!("manifest line {} is malformed: {line}", idx + 1))
            })?;
            if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::GenericError(format!(
                    "manifest line {} has an invalid hash: {hash}",
                    idx + 1
                )));
            }
            Ok(ManifestEntry {
                sha256: hash.to_ascii_lowercase(),
                file_name: name.to_string(),
            })
        })
        .collect()
}

/// Hex SHA-256 of an in-memory buffer.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Calculates the SHA-256 of a file, reading it in 8KB chunks.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash (64 characters)
/// * `Err` - If the path cannot be opened or read
pub async fn calculate_sha256(file_path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening file for hashing", file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Writes and reads the checksum manifest of one distribution directory.
#[derive(Clone, Debug)]
pub struct ChecksumWriter {
    dist_dir: PathBuf,
}

impl ChecksumWriter {
    /// Creates a writer for `dist_dir`.
    pub fn new(dist_dir: impl Into<PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
        }
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.dist_dir.join(MANIFEST_FILE_NAME)
    }

    /// Empties the manifest, creating it if needed.
    pub async fn truncate(&self) -> Result<()> {
        let path = self.manifest_path();
        tokio::fs::write(&path, b"")
            .await
            .fs_context("truncating checksum manifest", &path)
    }

    /// Hashes `artifact` and appends its line to the manifest.
    ///
    /// The artifact must live directly inside the distribution directory.
    pub async fn append(&self, artifact: &Path) -> Result<ManifestEntry> {
        let file_name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::GenericError(format!("artifact has no usable file name: {}", artifact.display()))
            })?
            .to_string();
        if file_name == MANIFEST_FILE_NAME {
            crate::bail!("refusing to list the manifest in itself");
        }

        let entry = ManifestEntry {
            sha256: calculate_sha256(artifact).await?,
            file_name,
        };

        let path = self.manifest_path();
        let mut manifest = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .fs_context("opening checksum manifest", &path)?;
        manifest
            .write_all(format!("{}\n", entry.to_line()).as_bytes())
            .await
            .fs_context("appending to checksum manifest", &path)?;
        manifest
            .flush()
            .await
            .fs_context("flushing checksum manifest", &path)?;

        log::debug!("Recorded {}", entry.to_line());
        Ok(entry)
    }

    /// Reads and parses the manifest.
    pub async fn read(&self) -> Result<Vec<ManifestEntry>> {
        let path = self.manifest_path();
        let text = tokio::fs::read_to_string(&path)
            .await
            .fs_context("reading checksum manifest", &path)?;
        parse_manifest(&text)
    }

    /// Recomputes every listed hash and compares it with the manifest.
    pub async fn verify(&self) -> Result<Vec<ManifestEntry>> {
        let entries = self.read().await?;
        for entry in &entries {
            let actual = calculate_sha256(&self.dist_dir.join(&entry.file_name)).await?;
            if actual != entry.sha256 {
                return Err(Error::ChecksumMismatch {
                    file: entry.file_name.clone(),
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[tokio::test]
    async fn known_digest_for_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(calculate_sha256(&path).await.unwrap(), EMPTY_SHA256);
    }

    #[tokio::test]
    async fn verify_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("tool_v1.0.0_linux_amd64");
        std::fs::write(&artifact, b"payload").unwrap();
        let writer = ChecksumWriter::new(dir.path());
        writer.truncate().await.unwrap();
        writer.append(&artifact).await.unwrap();

        std::fs::write(&artifact, b"tampered").unwrap();
        let err = writer.verify().await.unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn parse_rejects_bad_lines() {
        assert!(parse_manifest("nothex  file\n").is_err());
        assert!(parse_manifest(&format!("{EMPTY_SHA256} file\n")).is_err());
        let parsed = parse_manifest(&format!("{EMPTY_SHA256}  file\n\n")).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].file_name, "file");
    }
}
