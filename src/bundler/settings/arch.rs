//! CPU architecture types and utilities.

use std::fmt;
use std::str::FromStr;

use crate::bundler::Error;

/// CPU architecture of a platform target.
///
/// # Examples
///
/// ```
/// use foobar_release::bundler::Arch;
///
/// let arch: Arch = "x86_64".parse().unwrap();
/// assert_eq!(arch, Arch::Amd64);
/// assert_eq!(arch.as_str(), "amd64");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    Amd64,
    /// AArch64 / ARM64 (64-bit)
    Arm64,
}

impl Arch {
    /// Every supported architecture, in matrix order.
    pub const ALL: [Arch; 2] = [Arch::Amd64, Arch::Arm64];

    /// Identifier used in artifact names and image platforms.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }

    /// Architecture of the running host, if it is one we ship.
    pub fn host() -> Option<Self> {
        std::env::consts::ARCH.parse().ok()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" => Ok(Arch::Amd64),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            other => Err(Error::Validation(format!(
                "unsupported architecture '{other}' (expected amd64 or arm64)"
            ))),
        }
    }
}
