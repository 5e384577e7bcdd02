//! Archive creation for compressed artifacts.
//!
//! Windows targets are packed into `.zip`, everything else into `.tar.gz`.
//! Each archive holds exactly one entry: the raw artifact under its own name.

use crate::bundler::{ArchiveFormat, Error, Result, error::ErrorExt};
use flate2::{Compression, write::GzEncoder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Packs `raw` into an archive next to it and returns the archive path.
///
/// Archiving is blocking IO, so it runs on tokio's blocking pool.
pub async fn archive_artifact(raw: &Path, format: ArchiveFormat) -> Result<PathBuf> {
    let raw = raw.to_path_buf();
    tokio::task::spawn_blocking(move || archive_blocking(&raw, format))
        .await
        .map_err(|e| Error::GenericError(format!("archive task panicked: {e}")))?
}

fn archive_blocking(raw: &Path, format: ArchiveFormat) -> Result<PathBuf> {
    let entry_name = raw
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::GenericError(format!("invalid artifact path {}", raw.display())))?
        .to_string();
    let archive_path = raw.with_file_name(format!("{entry_name}{}", format.extension()));

    match format {
        ArchiveFormat::TarGz => write_tar_gz(raw, &entry_name, &archive_path)?,
        ArchiveFormat::Zip => write_zip(raw, &entry_name, &archive_path)?,
    }

    Ok(archive_path)
}

fn write_tar_gz(raw: &Path, entry_name: &str, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path).fs_context("creating archive", archive_path)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_path_with_name(raw, entry_name)
        .fs_context("adding artifact to tar archive", raw)?;
    let encoder = builder
        .into_inner()
        .fs_context("finishing tar archive", archive_path)?;
    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .fs_context("finishing gzip stream", archive_path)?;
    Ok(())
}

fn write_zip(raw: &Path, entry_name: &str, archive_path: &Path) -> Result<()> {
    let contents = std::fs::read(raw).fs_context("reading artifact", raw)?;
    let file = File::create(archive_path).fs_context("creating archive", archive_path)?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(entry_name, options)?;
    zip.write_all(&contents)
        .fs_context("writing zip entry", archive_path)?;
    zip.finish()?
        .flush()
        .fs_context("flushing zip archive", archive_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[tokio::test]
    async fn tar_gz_holds_single_named_entry() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("tool_v1.2.3_linux_amd64");
        std::fs::write(&raw, b"#!/bin/sh\necho foobar\n").unwrap();

        let archive = archive_artifact(&raw, ArchiveFormat::TarGz).await.unwrap();
        assert_eq!(archive, dir.path().join("tool_v1.2.3_linux_amd64.tar.gz"));

        let mut tar = tar::Archive::new(GzDecoder::new(File::open(&archive).unwrap()));
        let mut entries = tar.entries().unwrap();
        let mut entry = entries.next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_str(), Some("tool_v1.2.3_linux_amd64"));
        let mut body = String::new();
        entry.read_to_string(&mut body).unwrap();
        assert_eq!(body, "#!/bin/sh\necho foobar\n");
        drop(entry);
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn zip_holds_single_named_entry() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("tool_v1.2.3_windows_amd64.exe");
        std::fs::write(&raw, b"payload").unwrap();

        let archive = archive_artifact(&raw, ArchiveFormat::Zip).await.unwrap();
        assert_eq!(archive, dir.path().join("tool_v1.2.3_windows_amd64.exe.zip"));

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut entry = zip.by_index(0).unwrap();
        assert_eq!(entry.name(), "tool_v1.2.3_windows_amd64.exe");
        let mut body = Vec::new();
        entry.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"payload");
    }
}
