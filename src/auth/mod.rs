mod provider;
mod service_account;
mod token;

pub use provider::{ServiceAccountProvider, TokenProvider, DRIVE_READONLY_SCOPE};
pub use token::AccessToken;
