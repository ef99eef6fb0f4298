use url::Url;

use crate::{error::FlowError, pkce::PkceContext, types::OAuthConfig};

/// Build the provider authorization URL for one PKCE context.
///
/// Deterministic; no network or disk access.
pub fn build_authorize_url(config: &OAuthConfig, pkce: &PkceContext) -> Result<Url, FlowError> {
    let mut url = Url::parse(&config.authorize_url)
        .map_err(|e| FlowError::Configuration(format!("invalid authorize URL: {e}")))?;
    url.query_pairs_mut()
        .append_pair("code", "true")
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scopes)
        .append_pair("code_challenge", &pkce.challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("state", &pkce.state);
    Ok(url)
}
