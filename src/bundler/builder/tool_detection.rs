//! External tool detection and availability checking.

use std::path::PathBuf;

use crate::bundler::{Error, Result};

/// GitHub CLI used for GitHub releases.
pub const GH: &str = "gh";
/// GitLab release CLI used for GitLab releases.
pub const RELEASE_CLI: &str = "release-cli";
/// Docker CLI used for image builds.
pub const DOCKER: &str = "docker";

/// Resolves `tool` on PATH.
///
/// # Errors
///
/// Returns [`Error::ToolMissing`] if the tool cannot be found.
pub fn require_tool(tool: &str) -> Result<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());
            Ok(path)
        }
        Err(e) => {
            log::debug!("{tool} not found in PATH: {e}");
            Err(Error::ToolMissing {
                tool: tool.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_reported_by_name() {
        let err = require_tool("definitely-not-a-real-tool-4f1c").unwrap_err();
        match err {
            Error::ToolMissing { tool } => assert_eq!(tool, "definitely-not-a-real-tool-4f1c"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
