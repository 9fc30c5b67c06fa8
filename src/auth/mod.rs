pub mod client_secret;
pub mod oauth;
pub mod token_manager;
pub mod tokens_file;

use crate::error::Result;

pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Scopes one token must carry to read mail and write the sheet.
pub const REQUIRED_SCOPES: [&str; 2] = [GMAIL_MODIFY_SCOPE, SPREADSHEETS_SCOPE];

/// Supplies bearer tokens to the remote clients.
pub trait CredentialProvider {
    /// A currently valid access token, refreshing it when needed.
    fn get(&self) -> Result<String>;

    /// Force a new access token from the refresh token.
    fn refresh(&self) -> Result<String>;
}

/// A fixed token, for tests and for callers that manage tokens themselves.
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn get(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn refresh(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
