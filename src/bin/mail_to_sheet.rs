use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::rc::Rc;

use mail_to_sheet::auth::CredentialProvider;
use mail_to_sheet::auth::token_manager::TokenManager;
use mail_to_sheet::config::load_config;
use mail_to_sheet::journal::{FileJournal, Journal};
use mail_to_sheet::mail::gmail::GmailClient;
use mail_to_sheet::sheets::SheetsClient;
use mail_to_sheet::state::StateStore;
use mail_to_sheet::sync::{SyncDriver, SyncOptions};

#[derive(Parser)]
#[command(name = "mail_to_sheet")]
#[command(about = "Append matching unread emails to a Google Sheet", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/mail_to_sheet/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref()).context("Configuration error")?;

    let mut journal = FileJournal::open(&cfg.log_file)
        .with_context(|| format!("cannot open log file {}", cfg.log_file.display()))?;

    let token_mgr = Rc::new(TokenManager::from_config(&cfg));
    if let Err(e) = token_mgr.get() {
        journal.error(&format!("Authentication failed: {e}"));
        return Err(e).context("Authentication error");
    }

    let gmail = GmailClient::new(cfg.gmail_api_base.as_str(), token_mgr.clone());
    let sheets = SheetsClient::new(
        &cfg.sheets_api_base,
        &cfg.spreadsheet_id,
        &cfg.sheet_name,
        token_mgr,
    )?;
    let state = StateStore::new(&cfg.state_file);

    let driver = SyncDriver::new(&gmail, &sheets, &state, SyncOptions::from(&cfg));
    let report = driver.run(&mut journal).context("Sync aborted")?;

    println!(
        "Synced {} of {} unread emails (watermark {} -> {})",
        report.appended, report.listed, report.watermark_before, report.watermark_after
    );
    Ok(())
}
