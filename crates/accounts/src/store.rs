use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result, bail},
    chrono::Utc,
    tracing::debug,
};

use crate::types::Roster;

/// JSON-file-backed account roster.
///
/// The file is read fully at load time and rewritten fully on every
/// mutation; nothing is patched in place.
pub struct AccountStore {
    path: PathBuf,
    roster: Roster,
}

impl AccountStore {
    /// `~/.swivel/accounts.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dirs =
            directories::BaseDirs::new().context("could not determine home directory")?;
        Ok(dirs.home_dir().join(".swivel").join("accounts.json"))
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read roster at {}", path.display()))?;
        let roster: Roster = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse roster at {}", path.display()))?;
        debug!(path = %path.display(), accounts = roster.accounts.len(), "roster loaded");
        Ok(Self { path, roster })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole roster file.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.roster)?;
        std::fs::write(&self.path, json + "\n")
            .with_context(|| format!("failed to write roster at {}", self.path.display()))?;
        Ok(())
    }

    /// Stamp `id` with the current time and persist the full roster.
    pub fn mark_used(&mut self, id: &str) -> Result<()> {
        let Some(account) = self.roster.accounts.iter_mut().find(|a| a.id == id) else {
            bail!("account \"{id}\" is not in the roster");
        };
        account.last_used = Some(Utc::now());
        debug!(id, "marking account used");
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Account;

    fn write_roster(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("accounts.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    const TWO_ACCOUNTS: &str = r#"{
  "accounts": [
    { "id": "a", "email": "a@example.com", "lastUsed": null },
    { "id": "b", "email": "b@example.com", "lastUsed": "2024-01-01T00:00:00Z" }
  ]
}"#;

    #[test]
    fn load_parses_roster() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_roster(tmp.path(), TWO_ACCOUNTS);
        let store = AccountStore::load(&path).unwrap();
        assert_eq!(store.roster().accounts.len(), 2);
        assert!(store.roster().accounts[0].last_used.is_none());
        assert!(store.roster().accounts[1].last_used.is_some());
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(AccountStore::load(tmp.path().join("nope.json")).is_err());
    }

    #[test]
    fn mark_used_persists_and_fresh_read_sees_it() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_roster(tmp.path(), TWO_ACCOUNTS);
        let mut store = AccountStore::load(&path).unwrap();

        store.mark_used("a").unwrap();

        let reread = AccountStore::load(&path).unwrap();
        let a = reread.roster().by_id("a").unwrap();
        assert!(a.last_used.is_some());
        assert!(a.last_used.unwrap() <= Utc::now());
    }

    #[test]
    fn mark_used_leaves_other_records_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_roster(tmp.path(), TWO_ACCOUNTS);
        let mut store = AccountStore::load(&path).unwrap();

        let before = serde_json::to_string(store.roster().by_id("b").unwrap()).unwrap();
        store.mark_used("a").unwrap();

        let reread = AccountStore::load(&path).unwrap();
        let after = serde_json::to_string(reread.roster().by_id("b").unwrap()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn mark_used_unknown_id_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_roster(tmp.path(), TWO_ACCOUNTS);
        let mut store = AccountStore::load(&path).unwrap();
        assert!(store.mark_used("zz").is_err());
    }

    #[test]
    fn save_is_a_full_rewrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_roster(tmp.path(), TWO_ACCOUNTS);
        let mut store = AccountStore::load(&path).unwrap();
        store.roster.accounts.push(Account {
            id: "c".into(),
            email: "c@example.com".into(),
            last_used: None,
        });
        store.save().unwrap();

        let reread = AccountStore::load(&path).unwrap();
        assert_eq!(reread.roster().accounts.len(), 3);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
    }
}
