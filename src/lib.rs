//! Sync unread mail whose subject matches a keyword into spreadsheet rows,
//! tracking progress across runs with a persisted watermark.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod journal;
pub mod mail;
mod remote;
pub mod sheets;
pub mod state;
pub mod sync;

pub use error::{Result, SyncError};
