use reqwest::blocking::Response;

use crate::error::{Result, SyncError};

/// Pass successful responses through; anything else becomes `SyncError::Remote`
/// carrying the status and the start of the error body.
pub(crate) fn check_status(resp: Response, operation: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(SyncError::remote(
        operation,
        format!("HTTP {status}: {}", snippet.trim()),
    ))
}
