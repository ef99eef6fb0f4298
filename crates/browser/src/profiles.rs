use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    tracing::info,
};

/// Maps account ids to persistent browser profile directories.
///
/// A profile's `user-data` dir holds the provider-side session and
/// cookie state, so a previously-authenticated identity does not need
/// its web password on every rotation.
#[derive(Debug, Clone)]
pub struct ProfileLocator {
    base: PathBuf,
}

impl ProfileLocator {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Default base: `~/.swivel/profiles`.
    pub fn from_home() -> Result<Self> {
        let dirs =
            directories::BaseDirs::new().context("could not determine home directory")?;
        Ok(Self::new(dirs.home_dir().join(".swivel").join("profiles")))
    }

    pub fn profile_dir(&self, account_id: &str) -> PathBuf {
        self.base.join(account_id)
    }

    /// The Chrome `--user-data-dir` for one account.
    pub fn user_data_dir(&self, account_id: &str) -> PathBuf {
        self.profile_dir(account_id).join("user-data")
    }

    pub fn exists(&self, account_id: &str) -> bool {
        self.user_data_dir(account_id).is_dir()
    }

    pub fn create(&self, account_id: &str) -> Result<PathBuf> {
        let dir = self.user_data_dir(account_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating profile dir {}", dir.display()))?;
        Ok(dir)
    }

    /// Delete an account's session state so setup can start clean.
    pub fn remove(&self, account_id: &str) -> Result<()> {
        let dir = self.user_data_dir(account_id);
        if dir.exists() {
            info!(path = %dir.display(), "removing browser profile");
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("removing profile dir {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}
