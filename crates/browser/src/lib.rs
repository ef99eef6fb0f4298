pub mod chrome;
pub mod consent;
pub mod extract;
pub mod profiles;

pub use {
    chrome::find_chrome,
    consent::{ChromiumConsentDriver, interactive_session},
    profiles::ProfileLocator,
};
