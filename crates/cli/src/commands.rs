use std::path::Path;

use anyhow::{Context, Result, bail};

use {
    swivel_accounts::{
        store::AccountStore,
        types::{Account, Roster},
    },
    swivel_browser::{ChromiumConsentDriver, ProfileLocator, find_chrome, interactive_session},
    swivel_oauth::{CredentialStore, OAuthConfig, flow},
};

/// Where a fresh profile starts its interactive sign-in.
const SIGN_IN_URL: &str = "https://accounts.google.com";

pub async fn run_setup(roster_path: &Path, force: bool, account_id: Option<&str>) -> Result<()> {
    let store = AccountStore::load(roster_path)?;
    let profiles = ProfileLocator::from_home()?;
    let chrome = find_chrome()?;

    let targets: Vec<Account> = match account_id {
        Some(id) => vec![
            store
                .roster()
                .by_id(id)
                .cloned()
                .with_context(|| unknown_account_message(store.roster(), id))?,
        ],
        None => store.roster().accounts.clone(),
    };

    for account in &targets {
        if profiles.exists(&account.id) {
            if force {
                profiles.remove(&account.id)?;
            } else {
                println!(
                    "Profile already exists for {} ({}). Skipping (use --force to re-create).",
                    account.email, account.id
                );
                continue;
            }
        }
        let user_data = profiles.create(&account.id)?;

        println!("\nSetting up profile for {} ({})", account.email, account.id);
        println!("A browser window will open. Sign in to the provider, then close the window.");

        interactive_session(&chrome, &user_data, SIGN_IN_URL).await?;
        println!("Profile saved for {}", account.email);
    }

    println!("\nSetup complete.");
    Ok(())
}

pub async fn run_switch(roster_path: &Path, account_id: Option<&str>) -> Result<()> {
    let mut store = AccountStore::load(roster_path)?;
    let account = resolve_account(store.roster(), account_id)?;

    let profiles = ProfileLocator::from_home()?;
    if !profiles.exists(&account.id) {
        bail!(
            "no browser profile for {} ({}); run `swivel setup` first",
            account.email,
            account.id
        );
    }

    println!("Switching to account: {} ({})", account.email, account.id);
    match account.last_used {
        Some(ts) => println!("Last used: {ts}"),
        None => println!("Last used: never"),
    }

    let config = OAuthConfig::claude();
    let chrome = find_chrome()?;
    let driver = ChromiumConsentDriver::new(
        chrome,
        profiles.user_data_dir(&account.id),
        config.callback_pattern.clone(),
    );
    let credentials = CredentialStore::new(CredentialStore::default_path()?);

    flow::run_flow(&config, &account, &driver, &mut store, &credentials)
        .await
        .with_context(|| format!("failed to switch to {}", account.email))?;

    println!("Account {} is now active.", account.email);
    Ok(())
}

pub fn run_status(roster_path: &Path) -> Result<()> {
    let store = AccountStore::load(roster_path)?;
    if store.roster().accounts.is_empty() {
        println!("No accounts in the roster.");
        return Ok(());
    }
    for account in &store.roster().accounts {
        let last = account
            .last_used
            .map_or_else(|| "never".to_string(), |ts| ts.to_rfc3339());
        println!("{} <{}> [last used: {last}]", account.id, account.email);
    }
    Ok(())
}

/// Pick the rotation target: an explicit id must exist in the roster;
/// with no id, fall back to least-recently-used.
fn resolve_account(roster: &Roster, account_id: Option<&str>) -> Result<Account> {
    match account_id {
        Some(id) => roster
            .by_id(id)
            .cloned()
            .with_context(|| unknown_account_message(roster, id)),
        None => roster
            .least_recently_used()
            .cloned()
            .context("the roster has no accounts"),
    }
}

fn unknown_account_message(roster: &Roster, id: &str) -> String {
    let available = roster
        .accounts
        .iter()
        .map(|a| a.id.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("account \"{id}\" not found in the roster (available: {available})")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        serde_json::from_str(
            r#"{
  "accounts": [
    { "id": "a", "email": "a@example.com", "lastUsed": null },
    { "id": "b", "email": "b@example.com", "lastUsed": "2024-01-01T00:00:00Z" }
  ]
}"#,
        )
        .unwrap()
    }

    #[test]
    fn no_explicit_id_selects_the_never_used_account() {
        let account = resolve_account(&roster(), None).unwrap();
        assert_eq!(account.id, "a");
    }

    #[test]
    fn explicit_id_overrides_lru() {
        let account = resolve_account(&roster(), Some("b")).unwrap();
        assert_eq!(account.id, "b");
    }

    #[test]
    fn unknown_id_fails_and_lists_the_roster() {
        let err = resolve_account(&roster(), Some("c")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("\"c\" not found"));
        assert!(msg.contains("a, b"));
    }

    #[test]
    fn empty_roster_cannot_rotate() {
        assert!(resolve_account(&Roster::default(), None).is_err());
    }
}
