use thiserror::Error;

/// Everything that can take a rotation to `Failed`.
///
/// No variant triggers an automatic retry; the operator re-runs the
/// command if they want another attempt.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Missing or invalid setup: unknown account id, no profile, bad URLs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The browser session could not be established at all.
    #[error("browser session failed: {0}")]
    Browser(anyhow::Error),

    /// The authorize page never loaded within its budget.
    #[error("timed out navigating to the authorize page")]
    NavigationTimeout,

    /// The provider never redirected to the callback URL.
    #[error("timed out waiting for the OAuth redirect")]
    RedirectTimeout,

    /// None of the extraction strategies yielded a usable code.
    #[error("no authorization code could be extracted from the callback page")]
    CodeExtraction,

    /// The state echoed back with the code is not the one we issued.
    #[error("returned state does not match the state issued for this flow")]
    StateMismatch,

    /// Non-200 or unparseable response from the token endpoint. The
    /// raw body is kept for diagnosis.
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    #[error("network error during token exchange: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to persist credentials or roster: {0}")]
    Persistence(#[from] std::io::Error),
}
