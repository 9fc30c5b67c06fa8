//! One incremental sync pass: unread mail in, spreadsheet rows out.

use crate::config::Config;
use crate::domain::email::CandidateRef;
use crate::error::{Result, SyncError};
use crate::journal::Journal;
use crate::mail::parser;
use crate::mail::source::MessageSource;
use crate::sheets::RowSink;
use crate::state::{StateLoad, StateStore};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub subject_keyword: String,
    /// Skip candidates delivered at or before the loaded watermark.
    pub watermark_filter: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            subject_keyword: "invoice".to_string(),
            watermark_filter: false,
        }
    }
}

impl From<&Config> for SyncOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            subject_keyword: cfg.subject_keyword.clone(),
            watermark_filter: cfg.watermark_filter,
        }
    }
}

/// Counters for one pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub listed: usize,
    pub appended: usize,
    pub marked_read: usize,
    pub skipped_filtered: usize,
    pub skipped_not_found: usize,
    pub skipped_already_processed: usize,
    pub failed: usize,
    pub watermark_before: u64,
    pub watermark_after: u64,
}

enum Outcome {
    /// Appended and marked read.
    Done { timestamp: u64 },
    Filtered,
    AlreadyProcessed,
}

/// Case-insensitive substring match of `keyword` in `subject`.
pub fn subject_matches(subject: &str, keyword: &str) -> bool {
    subject.to_lowercase().contains(&keyword.to_lowercase())
}

pub struct SyncDriver<'a> {
    source: &'a dyn MessageSource,
    sink: &'a dyn RowSink,
    state: &'a StateStore,
    options: SyncOptions,
}

impl<'a> SyncDriver<'a> {
    pub fn new(
        source: &'a dyn MessageSource,
        sink: &'a dyn RowSink,
        state: &'a StateStore,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            sink,
            state,
            options,
        }
    }

    /// Run one pass. Per-candidate failures are logged and counted; only a
    /// fatal error (or failing to persist the watermark) is returned.
    pub fn run(&self, journal: &mut dyn Journal) -> Result<SyncReport> {
        let watermark = self.load_watermark(journal);
        let mut report = SyncReport {
            watermark_before: watermark,
            ..Default::default()
        };

        let candidates = match self.source.list_unread() {
            Ok(c) => c,
            Err(e) if e.is_fatal() => {
                journal.error(&format!("Listing unread emails failed: {e}"));
                return Err(e);
            }
            Err(e) => {
                journal.error(&format!("Listing unread emails failed: {e}"));
                Vec::new()
            }
        };
        report.listed = candidates.len();
        journal.info(&format!("Fetched {} unread emails", candidates.len()));

        let mut newest = watermark;
        let mut fatal = None;

        for candidate in &candidates {
            match self.process(candidate, watermark, &mut report, journal) {
                Ok(Outcome::Done { timestamp }) => newest = newest.max(timestamp),
                Ok(Outcome::Filtered) => report.skipped_filtered += 1,
                Ok(Outcome::AlreadyProcessed) => report.skipped_already_processed += 1,
                Err(SyncError::NotFound { id }) => {
                    report.skipped_not_found += 1;
                    journal.warn(&format!("Skipped email {id}: no longer exists"));
                }
                Err(e) if e.is_fatal() => {
                    report.failed += 1;
                    journal.error(&format!("Stopping sync at email {candidate}: {e}"));
                    fatal = Some(e);
                    break;
                }
                Err(e) => {
                    report.failed += 1;
                    journal.error(&format!("Failed to sync email {candidate}: {e}"));
                }
            }
        }

        if let Err(e) = self.state.save(newest) {
            journal.error(&format!("Could not save sync state: {e}"));
            return Err(fatal.unwrap_or(e));
        }
        report.watermark_after = newest;
        journal.info(&format!("Saved watermark {newest} (was {watermark})"));

        if let Some(e) = fatal {
            return Err(e);
        }

        journal.info(&format!(
            "Appended {}, skipped {} by subject, {} not found, {} already processed, {} failed",
            report.appended,
            report.skipped_filtered,
            report.skipped_not_found,
            report.skipped_already_processed,
            report.failed
        ));
        journal.info("Email sync complete.");
        Ok(report)
    }

    fn load_watermark(&self, journal: &mut dyn Journal) -> u64 {
        let outcome = self.state.load_outcome();
        match &outcome {
            StateLoad::Loaded(v) => journal.info(&format!("Loaded watermark {v}")),
            StateLoad::Absent => journal.info(&format!(
                "No sync state at {}, starting from 0",
                self.state.path().display()
            )),
            StateLoad::Corrupt(reason) => {
                journal.warn(&format!("Ignoring unreadable sync state: {reason}"))
            }
        }
        outcome.watermark()
    }

    fn process(
        &self,
        candidate: &CandidateRef,
        watermark: u64,
        report: &mut SyncReport,
        journal: &mut dyn Journal,
    ) -> Result<Outcome> {
        let raw = self.source.fetch(candidate)?;
        let email = parser::parse(&raw);

        if self.options.watermark_filter && email.timestamp <= watermark {
            journal.info(&format!(
                "Skipped already processed email: {} ({} <= {watermark})",
                email.subject, email.timestamp
            ));
            return Ok(Outcome::AlreadyProcessed);
        }

        if !subject_matches(&email.subject, &self.options.subject_keyword) {
            journal.info(&format!("Skipped email with subject: {}", email.subject));
            return Ok(Outcome::Filtered);
        }

        self.sink.append(&email.to_row())?;
        report.appended += 1;
        journal.info(&format!("Appended email: {}", email.subject));

        self.source.mark_read(candidate)?;
        report.marked_read += 1;
        journal.info(&format!("Marked email as read: {}", email.subject));

        Ok(Outcome::Done {
            timestamp: email.timestamp,
        })
    }
}
