use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

const TEMPLATE_SPREADSHEET_ID: &str = "YOUR_SPREADSHEET_ID";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Case-insensitive substring a subject must contain to be synced.
    #[serde(default = "default_subject_keyword")]
    pub subject_keyword: String,
    /// Also skip messages delivered at or before the stored watermark.
    #[serde(default)]
    pub watermark_filter: bool,

    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_client_secret_file")]
    pub client_secret_file: PathBuf,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_gmail_api_base")]
    pub gmail_api_base: String,
    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_subject_keyword() -> String {
    "invoice".to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_client_secret_file() -> PathBuf {
    PathBuf::from("credentials/credentials.json")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("state.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("app.log")
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:8080/callback".to_string()
}

fn default_gmail_api_base() -> String {
    DEFAULT_GMAIL_API_BASE.to_string()
}

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

impl Config {
    /// Defaults for everything but the spreadsheet.
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: default_sheet_name(),
            subject_keyword: default_subject_keyword(),
            watermark_filter: false,
            token_file: default_token_file(),
            client_secret_file: default_client_secret_file(),
            state_file: default_state_file(),
            log_file: default_log_file(),
            redirect_uri: default_redirect_uri(),
            gmail_api_base: default_gmail_api_base(),
            sheets_api_base: default_sheets_api_base(),
        }
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Config =
            toml::from_str(s).map_err(|e| SyncError::config(format!("cannot parse config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let id = self.spreadsheet_id.trim();
        if id.is_empty() || id == TEMPLATE_SPREADSHEET_ID {
            return Err(SyncError::config("spreadsheet_id is not set"));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(SyncError::config("sheet_name is empty"));
        }
        if self.subject_keyword.trim().is_empty() {
            return Err(SyncError::config("subject_keyword is empty"));
        }
        Ok(())
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| SyncError::config("no config dir available"))?
        .join("mail_to_sheet"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p).map_err(|e| SyncError::io(&p, e))?;
    p.push("config.toml");
    Ok(p)
}

/// Load the config from `path`, or from the user config dir when `None`.
///
/// A missing default config is replaced by a template and reported as an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path()?;
            if !p.exists() {
                write_template(&p)?;
                return Err(SyncError::config(format!(
                    "created template config at {}, edit it and run again",
                    p.display()
                )));
            }
            p
        }
    };
    let s = fs::read_to_string(&path).map_err(|e| SyncError::io(&path, e))?;
    Config::from_toml(&s)
}

fn write_template(path: &Path) -> Result<()> {
    let sample = Config::new(TEMPLATE_SPREADSHEET_ID);
    let tom = toml::to_string_pretty(&sample)
        .map_err(|e| SyncError::config(format!("cannot render template: {e}")))?;
    fs::write(path, tom).map_err(|e| SyncError::io(path, e))
}
