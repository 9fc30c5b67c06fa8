use std::cell::RefCell;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::client_secret::{DEFAULT_TOKEN_URI, load_client_secret};
use crate::auth::tokens_file::{TokensFile, load_tokens, save_tokens};
use crate::auth::{CredentialProvider, REQUIRED_SCOPES, oauth};
use crate::config::Config;
use crate::error::{Result, SyncError};

// Refresh a little before the server-side expiry.
const EXPIRY_SKEW_SECS: i64 = 60;
// Used when the token endpoint omits expires_in.
const DEFAULT_LIFETIME_SECS: i64 = 3500;

/// File-backed credentials: the token file, refreshed through the OAuth token
/// endpoint, with the client-secret file used for first-run authorization.
pub struct TokenManager {
    token_file: PathBuf,
    client_secret_file: PathBuf,
    redirect_uri: String,
    cached: RefCell<Option<TokensFile>>,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            token_file: cfg.token_file.clone(),
            client_secret_file: cfg.client_secret_file.clone(),
            redirect_uri: cfg.redirect_uri.clone(),
            cached: RefCell::new(None),
        }
    }

    fn current(&self) -> Result<TokensFile> {
        if let Some(tf) = self.cached.borrow().as_ref() {
            return Ok(tf.clone());
        }

        let tf = match load_tokens(&self.token_file)? {
            Some(tf) => {
                if !tf.scopes.is_empty() && !tf.covers_scopes(&REQUIRED_SCOPES) {
                    log::warn!(
                        "token file {} does not list all required scopes {:?}",
                        self.token_file.display(),
                        REQUIRED_SCOPES
                    );
                }
                tf
            }
            None => self.authorize_interactively()?,
        };

        *self.cached.borrow_mut() = Some(tf.clone());
        Ok(tf)
    }

    fn authorize_interactively(&self) -> Result<TokensFile> {
        if !self.client_secret_file.exists() {
            return Err(SyncError::auth(format!(
                "no token file at {} and no client secret file at {}",
                self.token_file.display(),
                self.client_secret_file.display()
            )));
        }
        let registration = load_client_secret(&self.client_secret_file)?;
        log::info!(
            "no token file at {}; starting interactive authorization",
            self.token_file.display()
        );

        let t = oauth::perform_pkce_flow(&registration, &self.redirect_uri, &REQUIRED_SCOPES)?;
        let now = now_epoch()?;
        let tf = TokensFile {
            access_token: Some(t.access_token),
            refresh_token: t.refresh_token,
            expires_at_epoch: Some(expiry(now, t.expires_in)),
            client_id: Some(registration.client_id),
            client_secret: registration.client_secret,
            token_uri: Some(registration.token_uri),
            scopes: REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect(),
        };
        save_tokens(&self.token_file, &tf)?;
        Ok(tf)
    }

    fn refresh_from(&self, mut tf: TokensFile) -> Result<String> {
        let refresh_token = tf.refresh_token.clone().ok_or_else(|| {
            SyncError::auth(format!(
                "token file {} has no refresh token; delete it to re-authorize",
                self.token_file.display()
            ))
        })?;

        // Older token files may not carry the client registration.
        if tf.client_id.is_none() {
            let registration = load_client_secret(&self.client_secret_file)?;
            tf.client_id = Some(registration.client_id);
            tf.client_secret = registration.client_secret;
            tf.token_uri = Some(registration.token_uri);
        }
        let client_id = tf.client_id.clone().unwrap_or_default();
        let token_uri = tf
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        let t = oauth::refresh_access_token(
            &client_id,
            tf.client_secret.as_deref(),
            &token_uri,
            &refresh_token,
        )?;

        let now = now_epoch()?;
        tf.access_token = Some(t.access_token.clone());
        tf.expires_at_epoch = Some(expiry(now, t.expires_in));
        if let Some(rotated) = t.refresh_token {
            tf.refresh_token = Some(rotated);
        }
        save_tokens(&self.token_file, &tf)?;
        log::debug!("refreshed access token, valid until {:?}", tf.expires_at_epoch);

        *self.cached.borrow_mut() = Some(tf);
        Ok(t.access_token)
    }
}

impl CredentialProvider for TokenManager {
    fn get(&self) -> Result<String> {
        let tf = self.current()?;
        if let Some(at) = tf.valid_access_token(now_epoch()?, EXPIRY_SKEW_SECS) {
            return Ok(at.to_string());
        }
        self.refresh_from(tf)
    }

    fn refresh(&self) -> Result<String> {
        let tf = self.current()?;
        self.refresh_from(tf)
    }
}

fn now_epoch() -> Result<i64> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| SyncError::auth(format!("system clock before unix epoch: {e}")))?
        .as_secs();
    Ok(secs as i64)
}

fn expiry(now: i64, expires_in: Option<u64>) -> i64 {
    expires_in
        .map(|s| now + s as i64)
        .unwrap_or(now + DEFAULT_LIFETIME_SECS)
}
