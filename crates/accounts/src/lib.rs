pub mod store;
pub mod types;

pub use {
    store::AccountStore,
    types::{Account, Roster},
};
