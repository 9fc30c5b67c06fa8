use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Refreshable credentials stored in the token file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokensFile {
    #[serde(default, alias = "token")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at_epoch: Option<i64>, // epoch seconds
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokensFile {
    /// Access token usable at `now`, allowing `skew_secs` before expiry.
    pub fn valid_access_token(&self, now: i64, skew_secs: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at_epoch) {
            (Some(at), Some(exp)) if now + skew_secs < exp => Some(at.as_str()),
            _ => None,
        }
    }

    pub fn covers_scopes(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|scope| self.scopes.iter().any(|s| s == scope))
    }
}

pub fn save_tokens(path: &Path, tokens: &TokensFile) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;
    }
    let s = serde_json::to_string_pretty(tokens)
        .map_err(|e| SyncError::auth(format!("cannot serialize tokens: {e}")))?;
    fs::write(path, s).map_err(|e| SyncError::io(path, e))?;
    Ok(())
}

/// Load the token file if present. A file that exists but does not parse is an auth error.
pub fn load_tokens(path: &Path) -> Result<Option<TokensFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
    let tf: TokensFile = serde_json::from_str(&s).map_err(|e| {
        SyncError::auth(format!("token file {} is invalid: {e}", path.display()))
    })?;
    Ok(Some(tf))
}
