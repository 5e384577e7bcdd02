//! Install locations.

use super::error::{InstallError, Result};
use crate::bundler::utils::fs::ensure_writable;
use std::path::{Path, PathBuf};

/// Installed command name, without the platform executable suffix
pub const BINARY_NAME: &str = "foobar";

/// Bash completion script shipped with every install
pub const COMPLETION_SCRIPT: &str = include_str!("../../completions/foobar.bash");

/// System-wide completion locations removed on uninstall
const SYSTEM_COMPLETION_PATHS: &[&str] = &[
    "/usr/share/bash-completion/completions/foobar",
    "/usr/local/share/bash-completion/completions/foobar",
    "/etc/bash_completion.d/foobar",
];

/// Candidate binary directories and known completion files.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Layout {
    /// Binary directories in priority order
    pub bin_dirs: Vec<PathBuf>,
    /// Completion files; the first is where installs write
    pub completion_paths: Vec<PathBuf>,
}

impl Layout {
    /// Layout for the current user.
    pub fn current_user(install_dir: Option<&Path>) -> Self {
        Self::for_home(dirs::home_dir().as_deref(), install_dir)
    }

    /// `install_dir`, `~/.local/bin`, `/usr/local/bin`, `~/bin`, and the
    /// per-user plus system completion paths.
    pub fn for_home(home: Option<&Path>, install_dir: Option<&Path>) -> Self {
        let mut bin_dirs = Vec::new();
        bin_dirs.extend(install_dir.map(Path::to_path_buf));
        bin_dirs.extend(home.map(|h| h.join(".local").join("bin")));
        bin_dirs.push(PathBuf::from("/usr/local/bin"));
        bin_dirs.extend(home.map(|h| h.join("bin")));

        let mut completion_paths = Vec::new();
        if let Some(home) = home {
            completion_paths.push(
                home.join(".local/share/bash-completion/completions")
                    .join(BINARY_NAME),
            );
            completion_paths.push(home.join(".bash_completion.d").join(BINARY_NAME));
        }
        completion_paths.extend(SYSTEM_COMPLETION_PATHS.iter().map(PathBuf::from));

        Self {
            bin_dirs,
            completion_paths,
        }
    }

    /// File name of the installed binary on this platform.
    pub fn binary_file_name() -> String {
        format!("{BINARY_NAME}{}", std::env::consts::EXE_SUFFIX)
    }

    /// Every place an installed binary may live.
    pub fn binary_paths(&self) -> Vec<PathBuf> {
        let name = Self::binary_file_name();
        self.bin_dirs.iter().map(|dir| dir.join(&name)).collect()
    }

    /// First candidate that exists (or can be created) and accepts writes.
    pub async fn writable_bin_dir(&self) -> Result<PathBuf> {
        for dir in &self.bin_dirs {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                log::debug!("skipping {}: {e}", dir.display());
                continue;
            }
            match ensure_writable(dir).await {
                Ok(()) => return Ok(dir.clone()),
                Err(e) => log::debug!("skipping {}: {e}", dir.display()),
            }
        }
        Err(InstallError::NoWritableDir {
            tried: self.bin_dirs.clone(),
        })
    }

    /// Where `install --completions` writes the script.
    pub fn completion_target(&self) -> Option<&Path> {
        self.completion_paths.first().map(PathBuf::as_path)
    }

    /// Whether `dir` is on `PATH`.
    pub fn on_path(dir: &Path) -> bool {
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|p| p == dir))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_comes_first_then_user_then_system() {
        let layout = Layout::for_home(Some(Path::new("/home/u")), Some(Path::new("/opt/foobar")));
        assert_eq!(
            layout.bin_dirs,
            [
                PathBuf::from("/opt/foobar"),
                PathBuf::from("/home/u/.local/bin"),
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/home/u/bin"),
            ]
        );
        assert_eq!(
            layout.completion_target(),
            Some(Path::new("/home/u/.local/share/bash-completion/completions/foobar"))
        );
    }

    #[test]
    fn without_home_only_system_locations_remain() {
        let layout = Layout::for_home(None, None);
        assert_eq!(layout.bin_dirs, [PathBuf::from("/usr/local/bin")]);
        assert_eq!(layout.completion_paths.len(), SYSTEM_COMPLETION_PATHS.len());
    }

    #[tokio::test]
    async fn first_writable_candidate_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let layout = Layout {
            // A directory cannot be created below a regular file
            bin_dirs: vec![blocker.join("bin"), tmp.path().join("fresh/bin")],
            completion_paths: Vec::new(),
        };
        let dir = layout.writable_bin_dir().await.unwrap();
        assert_eq!(dir, tmp.path().join("fresh/bin"));
        assert!(dir.is_dir());
    }

    #[test]
    fn completion_script_targets_foobar() {
        assert!(COMPLETION_SCRIPT.contains("complete"));
        assert!(COMPLETION_SCRIPT.contains("foobar"));
    }
}
