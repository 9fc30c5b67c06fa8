use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, SyncError};

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration, as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// The console wraps the registration in "installed" or "web".
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

pub fn load_client_secret(path: &Path) -> Result<ClientSecret> {
    let s = fs::read_to_string(path).map_err(|e| {
        SyncError::auth(format!(
            "cannot read client secret file {}: {e}",
            path.display()
        ))
    })?;
    parse_client_secret(&s)
        .map_err(|e| SyncError::auth(format!("client secret file {}: {e}", path.display())))
}

fn parse_client_secret(s: &str) -> std::result::Result<ClientSecret, String> {
    let file: ClientSecretFile = serde_json::from_str(s).map_err(|e| e.to_string())?;
    file.installed
        .or(file.web)
        .ok_or_else(|| "expected an \"installed\" or \"web\" client".to_string())
}
