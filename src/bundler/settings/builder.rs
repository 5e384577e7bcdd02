//! Builder for constructing Settings.

use super::{PlatformTarget, Settings, Version};
use crate::bundler::Error;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use foobar_release::bundler::{PlatformTarget, SettingsBuilder};
///
/// # fn example() -> foobar_release::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .source("foobar.sh")
///     .version("v1.2.3".parse()?)
///     .dist_dir("dist")
///     .targets(vec!["linux_amd64".parse()?, "windows_amd64".parse()?])
///     .compress(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    source: Option<PathBuf>,
    name: Option<String>,
    version: Option<Version>,
    dist_dir: Option<PathBuf>,
    targets: Option<Vec<PlatformTarget>>,
    compress: bool,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the payload path.
    ///
    /// # Required
    pub fn source<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the artifact base name.
    ///
    /// Default: payload file stem (`foobar.sh` → `foobar`)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the release version.
    ///
    /// # Required
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the distribution directory.
    ///
    /// # Required
    pub fn dist_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dist_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the targets to package.
    ///
    /// Default: the full matrix from [`PlatformTarget::all`]
    pub fn targets(mut self, targets: Vec<PlatformTarget>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Enables archiving.
    ///
    /// Default: false
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a required field is missing, the
    /// target list is empty, or the payload is not a regular file.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        let source = self
            .source
            .ok_or_else(|| Error::Validation("payload source is required".into()))?;
        let version = self
            .version
            .ok_or_else(|| Error::Validation("version is required".into()))?;
        let dist_dir = self
            .dist_dir
            .ok_or_else(|| Error::Validation("distribution directory is required".into()))?;
        let targets = self.targets.unwrap_or_else(PlatformTarget::all);

        if targets.is_empty() {
            return Err(Error::Validation("at least one platform target is required".into()));
        }
        if !source.is_file() {
            return Err(Error::Validation(format!(
                "payload {} does not exist or is not a file",
                source.display()
            )));
        }

        let name = match self.name {
            Some(name) => name,
            None => source
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Validation(format!("cannot derive a name from {}", source.display()))
                })?,
        };
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(Error::Validation(format!("invalid artifact name '{name}'")));
        }

        Ok(Settings::new(source, name, version, dist_dir, targets, self.compress))
    }
}
