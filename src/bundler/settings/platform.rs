//! Platform targets: the closed (OS, architecture) matrix.

use std::fmt;
use std::str::FromStr;

use super::Arch;
use crate::bundler::Error;

/// Operating system family of a platform target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux
    Linux,
    /// macOS
    Macos,
    /// Windows
    Windows,
}

impl Os {
    /// Every supported operating system, in matrix order.
    pub const ALL: [Os; 3] = [Os::Linux, Os::Macos, Os::Windows];

    /// Identifier used in artifact names.
    pub fn as_str(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Macos => "macos",
            Os::Windows => "windows",
        }
    }

    /// Operating system of the running host, if it is one we ship.
    pub fn host() -> Option<Self> {
        std::env::consts::OS.parse().ok()
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "macos" | "darwin" | "osx" => Ok(Os::Macos),
            "windows" | "win" => Ok(Os::Windows),
            other => Err(Error::Validation(format!(
                "unsupported operating system '{other}' (expected linux, macos or windows)"
            ))),
        }
    }
}

/// Archive format chosen for a target when compression is requested.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArchiveFormat {
    /// `.zip`, used for Windows targets
    Zip,
    /// `.tar.gz`, used everywhere else
    TarGz,
}

impl ArchiveFormat {
    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::TarGz => ".tar.gz",
        }
    }
}

/// One (operating system, architecture) build output variant.
///
/// Constructed only from the closed [`Os`] and [`Arch`] enums, so an invalid
/// pair can never reach the packager.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PlatformTarget {
    os: Os,
    arch: Arch,
}

impl PlatformTarget {
    /// Creates a target from its parts.
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The full release matrix: every OS crossed with every architecture.
    pub fn all() -> Vec<Self> {
        Os::ALL
            .iter()
            .flat_map(|os| Arch::ALL.iter().map(move |arch| Self::new(*os, *arch)))
            .collect()
    }

    /// Target matching the running host.
    pub fn host() -> Option<Self> {
        Some(Self::new(Os::host()?, Arch::host()?))
    }

    /// Operating system.
    pub fn os(&self) -> Os {
        self.os
    }

    /// Architecture.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Whether the target is in the Windows family.
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Executable suffix for this target (`.exe` on Windows, empty otherwise).
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Archive format used when compression is requested.
    pub fn archive_format(&self) -> ArchiveFormat {
        if self.is_windows() {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarGz
        }
    }

    /// Container platform string (`linux/amd64`), only for Linux targets.
    pub fn docker_platform(&self) -> Option<String> {
        (self.os == Os::Linux).then(|| format!("{}/{}", self.os, self.arch))
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

impl FromStr for PlatformTarget {
    type Err = Error;

    /// Accepts `linux_amd64`, `linux/amd64` and `linux-amd64`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the first separator only: `x86_64` carries an underscore of its own.
        let (os, arch) = s
            .split_once(['_', '/', '-'])
            .ok_or_else(|| Error::Validation(format!("invalid platform target '{s}'")))?;
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

/// Parses a comma separated list of targets, rejecting duplicates.
pub fn parse_target_list(list: &str) -> Result<Vec<PlatformTarget>, Error> {
    let mut targets = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let target: PlatformTarget = item.parse()?;
        if targets.contains(&target) {
            return Err(Error::Validation(format!("duplicate platform target '{target}'")));
        }
        targets.push(target);
    }
    if targets.is_empty() {
        return Err(Error::Validation("no platform targets given".to_string()));
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_covers_every_pair_once() {
        let all = PlatformTarget::all();
        assert_eq!(all.len(), Os::ALL.len() * Arch::ALL.len());
        let mut names: Vec<String> = all.iter().map(ToString::to_string).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn parses_separators_and_aliases() {
        let expected = PlatformTarget::new(Os::Macos, Arch::Arm64);
        assert_eq!("macos_arm64".parse::<PlatformTarget>().unwrap(), expected);
        assert_eq!("darwin/aarch64".parse::<PlatformTarget>().unwrap(), expected);
        assert_eq!("macos-arm64".parse::<PlatformTarget>().unwrap(), expected);
        assert_eq!(
            "linux_x86_64".parse::<PlatformTarget>().unwrap(),
            PlatformTarget::new(Os::Linux, Arch::Amd64)
        );
    }

    #[test]
    fn rejects_unknown_pairs() {
        assert!("plan9_amd64".parse::<PlatformTarget>().is_err());
        assert!("linux_mips".parse::<PlatformTarget>().is_err());
        assert!("linux".parse::<PlatformTarget>().is_err());
    }

    #[test]
    fn windows_gets_exe_and_zip() {
        let win = PlatformTarget::new(Os::Windows, Arch::Amd64);
        assert_eq!(win.exe_suffix(), ".exe");
        assert_eq!(win.archive_format(), ArchiveFormat::Zip);
        let linux = PlatformTarget::new(Os::Linux, Arch::Arm64);
        assert_eq!(linux.exe_suffix(), "");
        assert_eq!(linux.archive_format(), ArchiveFormat::TarGz);
        assert_eq!(linux.docker_platform().as_deref(), Some("linux/arm64"));
        assert_eq!(win.docker_platform(), None);
    }

    #[test]
    fn target_list_rejects_duplicates() {
        assert!(parse_target_list("linux_amd64,linux/amd64").is_err());
        assert_eq!(parse_target_list("linux_amd64, windows_amd64").unwrap().len(), 2);
        assert!(parse_target_list(" , ").is_err());
    }
}
