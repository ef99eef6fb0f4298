use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One rotatable identity in the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    /// When this account last completed a rotation, if ever.
    #[serde(rename = "lastUsed", default)]
    pub last_used: Option<DateTime<Utc>>,
}

/// The full on-disk roster document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Roster {
    /// Exact-match lookup by account id.
    pub fn by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Pick the rotation candidate.
    ///
    /// Never-used accounts sort before all used ones; among used
    /// accounts the earliest timestamp wins; exact ties fall back to
    /// roster order.
    pub fn least_recently_used(&self) -> Option<&Account> {
        self.accounts
            .iter()
            .enumerate()
            .min_by_key(|(idx, a)| (a.last_used, *idx))
            .map(|(_, a)| a)
    }
}
