use std::{
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use {serde::Serialize, tracing::info};

use crate::types::TokenBundle;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OAuthRecord<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
    expires_at: i64,
    scopes: &'a [String],
}

#[derive(Serialize)]
struct CredentialFile<'a> {
    #[serde(rename = "claudeAiOauth")]
    claude_ai_oauth: OAuthRecord<'a>,
}

/// Writes the active identity's tokens to the well-known credential
/// file. Exactly one identity's bundle lives there at a time; a
/// rotation replaces the whole file.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.claude/.credentials.json`, the location the downstream CLI reads.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
        Ok(dirs.home_dir().join(".claude").join(".credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the credential file with this bundle.
    ///
    /// Written to a temp file in the same directory and renamed over
    /// the target, so a crash mid-write never leaves a truncated file.
    pub fn save(&self, bundle: &TokenBundle) -> io::Result<()> {
        let record = CredentialFile {
            claude_ai_oauth: OAuthRecord {
                access_token: &bundle.access_token,
                refresh_token: &bundle.refresh_token,
                expires_at: bundle.expires_at_ms,
                scopes: &bundle.scopes,
            },
        };
        let json = serde_json::to_string(&record)?;

        let dir = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;

        info!(path = %self.path.display(), "credentials saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> TokenBundle {
        TokenBundle {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at_ms: 1_700_000_000_000,
            scopes: vec!["user:profile".into(), "user:inference".into()],
        }
    }

    #[test]
    fn save_writes_expected_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(tmp.path().join(".credentials.json"));
        store.save(&bundle()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &value["claudeAiOauth"];
        assert_eq!(record["accessToken"], "at");
        assert_eq!(record["refreshToken"], "rt");
        assert_eq!(record["expiresAt"], 1_700_000_000_000i64);
        assert_eq!(record["scopes"][1], "user:inference");
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(tmp.path().join("deep/nested/.credentials.json"));
        store.save(&bundle()).unwrap();
        assert!(store.path().is_file());
    }

    #[test]
    fn save_fully_replaces_a_previous_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(tmp.path().join(".credentials.json"));
        store.save(&bundle()).unwrap();

        let mut second = bundle();
        second.access_token = "at-2".into();
        second.scopes = vec!["user:profile".into()];
        store.save(&second).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["claudeAiOauth"]["accessToken"], "at-2");
        assert_eq!(value["claudeAiOauth"]["scopes"].as_array().unwrap().len(), 1);
        // One top-level record, not a merge.
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn credential_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(tmp.path().join(".credentials.json"));
        store.save(&bundle()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
