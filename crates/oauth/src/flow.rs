use {
    async_trait::async_trait,
    tracing::{debug, info, warn},
};

use swivel_accounts::{store::AccountStore, types::Account};

use crate::{
    authorize,
    credentials::CredentialStore,
    error::FlowError,
    exchange::TokenExchanger,
    pkce::PkceContext,
    types::OAuthConfig,
};

/// What a browser consent attempt resolved to.
///
/// Anything other than `Code` is an explicit negative result; the
/// driver reserves `Err` on the trait method for session-setup
/// failures (missing binary, launch failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    /// Raw extracted string, possibly still in `code#state` form.
    Code(String),
    NavigationTimeout,
    RedirectTimeout,
    NoCode,
}

/// Drives one browser consent interaction for an authorize URL.
#[async_trait]
pub trait ConsentDriver: Send + Sync {
    async fn complete_consent(&self, authorize_url: &str) -> anyhow::Result<ConsentOutcome>;
}

/// Progress of one rotation through the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Init,
    BuildingRequest,
    AwaitingBrowser,
    CodeExtracted,
    Exchanging,
    Persisted,
}

/// Split a raw `code#state` string into the bare authorization code.
///
/// The trailing state, when present, is validated against the one
/// issued for this flow before being discarded; only the prefix is
/// ever forwarded to the token endpoint.
pub fn split_code(raw: &str, expected_state: &str) -> Result<String, FlowError> {
    match raw.split_once('#') {
        Some((code, returned_state)) => {
            if returned_state != expected_state {
                warn!("returned state does not match the issued state");
                return Err(FlowError::StateMismatch);
            }
            Ok(code.to_string())
        },
        None => Ok(raw.to_string()),
    }
}

/// Run one end-to-end rotation for `account`.
///
/// The flow state is an explicit value threaded through the steps, and
/// every failure maps to a `FlowError` instead of hanging or
/// panicking. On `Persisted` the account is marked used as the final,
/// non-retractable side effect. The flow never retries itself.
pub async fn run_flow(
    config: &OAuthConfig,
    account: &Account,
    driver: &dyn ConsentDriver,
    store: &mut AccountStore,
    credentials: &CredentialStore,
) -> Result<(), FlowError> {
    let mut state = FlowState::Init;
    info!(?state, id = %account.id, email = %account.email, "starting account rotation");

    state = FlowState::BuildingRequest;
    let pkce = PkceContext::generate();
    let url = authorize::build_authorize_url(config, &pkce)?;
    debug!(?state, "authorize URL built");

    state = FlowState::AwaitingBrowser;
    debug!(?state, "handing off to the browser session driver");
    let outcome = driver
        .complete_consent(url.as_str())
        .await
        .map_err(FlowError::Browser)?;
    let raw = match outcome {
        ConsentOutcome::Code(raw) => raw,
        ConsentOutcome::NavigationTimeout => return Err(FlowError::NavigationTimeout),
        ConsentOutcome::RedirectTimeout => return Err(FlowError::RedirectTimeout),
        ConsentOutcome::NoCode => return Err(FlowError::CodeExtraction),
    };

    state = FlowState::CodeExtracted;
    let code = split_code(&raw, &pkce.state)?;
    debug!(?state, code_len = code.len(), "authorization code extracted");

    state = FlowState::Exchanging;
    debug!(?state, "exchanging code for tokens");
    let bundle = TokenExchanger::new(config.clone())
        .exchange(&code, &pkce.verifier)
        .await?;

    credentials.save(&bundle)?;
    state = FlowState::Persisted;
    info!(?state, id = %account.id, "credentials persisted");

    store
        .mark_used(&account.id)
        .map_err(|e| FlowError::Persistence(std::io::Error::other(e)))?;
    Ok(())
}
