use {
    chrono::Utc,
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::{
    error::FlowError,
    types::{OAuthConfig, TokenBundle},
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    #[serde(default)]
    scope: Option<String>,
}

/// Exchanges an authorization code for tokens at the provider's token
/// endpoint. One POST per call; failures are surfaced, never retried.
pub struct TokenExchanger {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl TokenExchanger {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub async fn exchange(&self, code: &str, verifier: &str) -> Result<TokenBundle, FlowError> {
        let body = serde_json::json!({
            "grant_type": "authorization_code",
            "client_id": self.config.client_id,
            "code": code,
            "redirect_uri": self.config.redirect_uri,
            "code_verifier": verifier,
        });

        debug!(url = %self.config.token_url, "exchanging authorization code");
        let resp = self
            .client
            .post(&self.config.token_url)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), body = %text, "token exchange rejected");
            return Err(FlowError::TokenExchange {
                status: status.as_u16(),
                body: text,
            });
        }

        let received_at_ms = Utc::now().timestamp_millis();
        let parsed: TokenResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(%e, body = %text, "token response was not parseable");
            FlowError::TokenExchange {
                status: status.as_u16(),
                body: text.clone(),
            }
        })?;

        // Providers may omit the granted scope; fall back to what we asked for.
        let granted = parsed.scope.as_deref().unwrap_or(&self.config.scopes);
        Ok(TokenBundle {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            expires_at_ms: received_at_ms + parsed.expires_in as i64 * 1000,
            scopes: granted.split(' ').map(str::to_string).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server: &mockito::Server) -> OAuthConfig {
        let mut config = OAuthConfig::claude();
        config.token_url = format!("{}/v1/oauth/token", server.url());
        config
    }

    #[tokio::test]
    async fn ok_response_yields_bundle_with_absolute_expiry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/oauth/token")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(
                r#"{"access_token":"at-1","refresh_token":"rt-1","expires_in":3600,"token_type":"Bearer","scope":"user:profile user:inference"}"#,
            )
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(config_for(&server));
        let before = Utc::now().timestamp_millis();
        let bundle = exchanger.exchange("some-code", "some-verifier").await.unwrap();
        let after = Utc::now().timestamp_millis();

        mock.assert_async().await;
        assert_eq!(bundle.access_token, "at-1");
        assert_eq!(bundle.refresh_token, "rt-1");
        assert_eq!(bundle.scopes, vec!["user:profile", "user:inference"]);
        assert!(bundle.expires_at_ms >= before + 3_600_000);
        assert!(bundle.expires_at_ms <= after + 3_600_000);
    }

    #[tokio::test]
    async fn request_body_carries_the_pkce_verifier() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/oauth/token")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "grant_type": "authorization_code",
                "code": "the-code",
                "code_verifier": "the-verifier",
            })))
            .with_status(200)
            .with_body(r#"{"access_token":"a","refresh_token":"r","expires_in":60}"#)
            .create_async()
            .await;

        let exchanger = TokenExchanger::new(config_for(&server));
        exchanger.exchange("the-code", "the-verifier").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_scope_falls_back_to_requested_scopes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"a","refresh_token":"r","expires_in":60}"#)
            .create_async()
            .await;

        let config = config_for(&server);
        let requested: Vec<String> = config.scopes.split(' ').map(str::to_string).collect();
        let bundle = TokenExchanger::new(config)
            .exchange("c", "v")
            .await
            .unwrap();
        assert_eq!(bundle.scopes, requested);
    }

    #[tokio::test]
    async fn non_200_surfaces_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/oauth/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let err = TokenExchanger::new(config_for(&server))
            .exchange("stale-code", "v")
            .await
            .unwrap_err();
        match err {
            FlowError::TokenExchange { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            },
            other => panic!("expected TokenExchange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_200_body_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/oauth/token")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = TokenExchanger::new(config_for(&server))
            .exchange("c", "v")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::TokenExchange { status: 200, .. }));
    }
}
