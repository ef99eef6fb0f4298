use serde::{Deserialize, Serialize};

/// OAuth 2.0 provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    /// Substring of the redirect location the browser driver waits for.
    pub callback_pattern: String,
    /// Space-separated scope string requested at authorization.
    pub scopes: String,
}

impl OAuthConfig {
    /// The claude.ai consumer OAuth client.
    pub fn claude() -> Self {
        Self {
            client_id: "9d1c250a-e61b-44d9-88ed-5944d1962f5e".to_string(),
            authorize_url: "https://claude.ai/oauth/authorize".to_string(),
            token_url: "https://platform.claude.com/v1/oauth/token".to_string(),
            redirect_uri: "https://platform.claude.com/oauth/code/callback".to_string(),
            callback_pattern: "/oauth/code/callback".to_string(),
            scopes: "user:profile user:inference user:sessions:claude_code user:mcp_servers"
                .to_string(),
        }
    }
}

/// Tokens obtained from a successful code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at_ms: i64,
    /// Granted scopes, split from the provider's scope string.
    pub scopes: Vec<String>,
}
