use {
    base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD},
    rand::RngCore,
    sha2::{Digest, Sha256},
};

/// PKCE verifier/challenge/state triple for one authorization attempt.
///
/// The state is single-use: it validates the returned redirect and is
/// discarded with the context. Nothing here is ever persisted.
#[derive(Debug, Clone)]
pub struct PkceContext {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceContext {
    /// Draw a fresh context from the CSPRNG.
    pub fn generate() -> Self {
        let verifier = random_token();
        let challenge = challenge_for(&verifier);
        let state = random_token();
        Self {
            verifier,
            challenge,
            state,
        }
    }
}

/// 32 random bytes, URL-safe base64 without padding.
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 challenge over the verifier's *text* encoding.
///
/// The provider recomputes the challenge from the verifier string it
/// receives at the token endpoint, so the hash input must be the
/// encoded form, not the raw random bytes.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
