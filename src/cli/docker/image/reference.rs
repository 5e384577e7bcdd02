//! Image references.

use crate::bundler::{Error as BundlerError, Version};
use crate::error::Result;
use regex::Regex;
use std::sync::LazyLock;

/// `[host[:port]/]path` with lowercase path components, no tag or digest.
static REPOSITORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9.-]+(:[0-9]+)?/)?[a-z0-9]+([._-]+[a-z0-9]+)*(/[a-z0-9]+([._-]+[a-z0-9]+)*)*$")
        .unwrap_or_else(|e| unreachable!("repository pattern is valid: {e}"))
});

/// Floating tag pushed with every release
pub const LATEST_TAG: &str = "latest";

/// A repository plus the version and `latest` tags pushed together.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageRef {
    repository: String,
    version: Version,
}

impl ImageRef {
    /// Validates `repository` and pairs it with `version`.
    pub fn new(repository: &str, version: Version) -> Result<Self> {
        if !REPOSITORY.is_match(repository) {
            return Err(BundlerError::Validation(format!(
                "invalid image name '{repository}': expected [registry/]path in lowercase, without a tag"
            ))
            .into());
        }
        Ok(Self {
            repository: repository.to_string(),
            version,
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// `<repository>:<version>`
    pub fn version_tag(&self) -> String {
        format!("{}:{}", self.repository, self.version)
    }

    /// `<repository>:latest`
    pub fn latest_tag(&self) -> String {
        format!("{}:{LATEST_TAG}", self.repository)
    }

    /// Both tags, version first.
    pub fn tags(&self) -> [String; 2] {
        [self.version_tag(), self.latest_tag()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v() -> Version {
        "v1.2.3".parse().unwrap()
    }

    #[test]
    fn tags_share_repository() {
        let image = ImageRef::new("ghcr.io/acme/foobar", v()).unwrap();
        assert_eq!(image.tags(), ["ghcr.io/acme/foobar:v1.2.3", "ghcr.io/acme/foobar:latest"]);
    }

    #[test]
    fn accepts_registry_with_port() {
        assert!(ImageRef::new("localhost:5000/foobar", v()).is_ok());
        assert!(ImageRef::new("foobar", v()).is_ok());
    }

    #[test]
    fn rejects_tags_and_bad_names() {
        for bad in ["acme/foobar:v1", "Acme/Foobar", "", "acme//foobar", "acme/foo bar"] {
            assert!(ImageRef::new(bad, v()).is_err(), "{bad}");
        }
    }
}
