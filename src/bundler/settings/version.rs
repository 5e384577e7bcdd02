//! Release version parsing.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::bundler::Error;

/// Accepted tag shape: `v<major>.<minor>.<patch>[-tag]`.
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)(-[0-9A-Za-z.-]+)?$")
        .unwrap_or_else(|e| unreachable!("static version pattern is valid: {e}"))
});

/// A release version such as `v1.2.3` or `v2.0.0-rc.1`.
///
/// Parsing is the only way to obtain one; the value is immutable afterwards
/// and displays back to the exact string it was parsed from.
///
/// ```
/// use foobar_release::bundler::Version;
///
/// let v: Version = "v1.2.3-rc.1".parse().unwrap();
/// assert_eq!(v.to_string(), "v1.2.3-rc.1");
/// assert!(v.is_prerelease());
/// assert!("1.2.3".parse::<Version>().is_err());
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Version {
    inner: semver::Version,
}

impl Version {
    /// Parsed semantic version without the leading `v`.
    pub fn semver(&self) -> &semver::Version {
        &self.inner
    }

    /// Whether a pre-release suffix is present.
    pub fn is_prerelease(&self) -> bool {
        !self.inner.pre.is_empty()
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !VERSION_PATTERN.is_match(s) {
            return Err(Error::Validation(format!(
                "invalid version '{s}': expected v<major>.<minor>.<patch>[-tag], e.g. v1.2.3"
            )));
        }
        let inner = semver::Version::parse(&s[1..])
            .map_err(|e| Error::Validation(format!("invalid version '{s}': {e}")))?;
        Ok(Self { inner })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_versions_round_trip() {
        for raw in ["v0.0.0", "v1.2.3", "v10.20.30", "v1.2.3-rc.1", "v2.0.0-beta", "v1.0.0-alpha-2"] {
            let parsed: Version = raw.parse().unwrap();
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn invalid_versions_are_validation_errors() {
        for raw in ["1.2.3", "v1.2", "v1.2.3.4", "V1.2.3", "v01.2.3", "v1.2.3-", "v1.2.3+build", "", "v1.2.3 "] {
            let err = raw.parse::<Version>().unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn exposes_prerelease() {
        assert!(!"v1.2.3".parse::<Version>().unwrap().is_prerelease());
        let rc: Version = "v1.2.3-rc.1".parse().unwrap();
        assert_eq!(rc.semver().pre.as_str(), "rc.1");
    }
}
