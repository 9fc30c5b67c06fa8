use reqwest::blocking::Client;
use serde_json::json;
use std::rc::Rc;
use url::Url;

use crate::auth::CredentialProvider;
use crate::domain::email::Row;
use crate::error::{Result, SyncError};
use crate::remote::check_status;

/// Destination table for synced rows.
pub trait RowSink {
    /// Append one row after every row appended before it.
    fn append(&self, row: &Row) -> Result<()>;
}

/// Appends rows to one sheet of a Google spreadsheet.
pub struct SheetsClient {
    http: Client,
    append_url: Url,
    credentials: Rc<dyn CredentialProvider>,
}

impl SheetsClient {
    pub fn new(
        base: &str,
        spreadsheet_id: &str,
        sheet_name: &str,
        credentials: Rc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let append_url = append_url(base, spreadsheet_id, sheet_name)?;
        Ok(Self {
            http: Client::new(),
            append_url,
            credentials,
        })
    }
}

fn append_url(base: &str, spreadsheet_id: &str, sheet_name: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| SyncError::config(format!("invalid sheets API base '{base}': {e}")))?;
    let range = format!("{sheet_name}:append");
    url.path_segments_mut()
        .map_err(|_| SyncError::config(format!("sheets API base '{base}' cannot hold a path")))?
        .pop_if_empty()
        .extend(["spreadsheets", spreadsheet_id, "values", range.as_str()]);
    // RAW: values are stored as typed, never parsed as formulas.
    url.query_pairs_mut()
        .append_pair("valueInputOption", "RAW")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}

impl RowSink for SheetsClient {
    fn append(&self, row: &Row) -> Result<()> {
        let token = self.credentials.get()?;
        let resp = self
            .http
            .post(self.append_url.clone())
            .bearer_auth(token)
            .json(&json!({ "values": [row.cells()] }))
            .send()?;
        check_status(resp, "append row")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::remote::stub::StubServer;

    fn row() -> Row {
        Row([
            "jane@x.com".into(),
            "Invoice #4".into(),
            "Mon, 2 Mar 2026 09:15:00 +0100".into(),
            "=SUM(A1:A2) stays text".into(),
        ])
    }

    #[test]
    fn test_append_url() {
        let url = append_url("https://sheets.googleapis.com/v4/", "1yxe", "Sheet1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1yxe/values/Sheet1:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );

        let url = append_url("https://sheets.googleapis.com/v4", "1yxe", "My Invoices").unwrap();
        assert!(url.path().ends_with("/values/My%20Invoices:append"));

        assert!(matches!(
            append_url("not a url", "1yxe", "Sheet1").unwrap_err(),
            SyncError::Config { .. }
        ));
    }

    #[test]
    fn test_append_posts_single_row() {
        let server = StubServer::start(vec![(
            200,
            r#"{"spreadsheetId": "1yxe", "updates": {"updatedRows": 1}}"#.to_string(),
        )]);
        let sheets = SheetsClient::new(
            &server.base,
            "1yxe",
            "Sheet1",
            Rc::new(StaticToken("ya29.test".into())),
        )
        .unwrap();
        sheets.append(&row()).unwrap();

        let requests = server.finish();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].url,
            "/spreadsheets/1yxe/values/Sheet1:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer ya29.test"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(
            body,
            json!({ "values": [[
                "jane@x.com",
                "Invoice #4",
                "Mon, 2 Mar 2026 09:15:00 +0100",
                "=SUM(A1:A2) stays text"
            ]] })
        );
    }

    #[test]
    fn test_append_permission_denied_is_remote() {
        let server = StubServer::start(vec![(
            403,
            r#"{"error": {"code": 403, "status": "PERMISSION_DENIED"}}"#.to_string(),
        )]);
        let sheets = SheetsClient::new(
            &server.base,
            "1yxe",
            "Sheet1",
            Rc::new(StaticToken("ya29.test".into())),
        )
        .unwrap();
        let err = sheets.append(&row()).unwrap_err();
        assert!(matches!(err, SyncError::Remote { .. }));
        assert!(!err.is_fatal());
        server.finish();
    }
}
