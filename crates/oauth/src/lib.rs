pub mod authorize;
pub mod credentials;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod pkce;
pub mod types;

pub use {
    credentials::CredentialStore,
    error::FlowError,
    exchange::TokenExchanger,
    flow::{ConsentDriver, ConsentOutcome, run_flow},
    pkce::PkceContext,
    types::{OAuthConfig, TokenBundle},
};
