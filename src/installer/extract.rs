//! Archive extraction.
//!
//! Release archives hold exactly one file, the renamed payload. It is read
//! into memory; nothing from the archive touches the filesystem directly, so
//! entry paths are never trusted.

use super::error::{InstallError, Result};
use crate::bundler::ArchiveFormat;
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};

/// Returns the bytes of the only regular file in `archive`.
///
/// `name` is used for error messages.
pub fn extract_single_file(archive: &[u8], format: ArchiveFormat, name: &str) -> Result<Vec<u8>> {
    let invalid = |reason: String| InstallError::Archive {
        name: name.to_string(),
        reason,
    };

    let files = match format {
        ArchiveFormat::TarGz => read_tar_gz(archive).map_err(|e| invalid(e.to_string()))?,
        ArchiveFormat::Zip => read_zip(archive).map_err(|e| invalid(e.to_string()))?,
    };

    let mut files = files.into_iter();
    match (files.next(), files.next()) {
        (Some(contents), None) => Ok(contents),
        (None, _) => Err(invalid("archive contains no file".to_string())),
        (Some(_), Some(_)) => Err(invalid("archive contains more than one file".to_string())),
    }
}

fn read_tar_gz(archive: &[u8]) -> std::io::Result<Vec<Vec<u8>>> {
    let mut tar = tar::Archive::new(GzDecoder::new(archive));
    let mut files = Vec::new();
    for entry in tar.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_file() {
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            files.push(contents);
        }
    }
    Ok(files)
}

fn read_zip(archive: &[u8]) -> zip::result::ZipResult<Vec<Vec<u8>>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    let mut files = Vec::new();
    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        if file.is_file() {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.push(contents);
        }
    }
    Ok(files)
}
