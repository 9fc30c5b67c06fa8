use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::rc::Rc;

use crate::auth::CredentialProvider;
use crate::domain::email::CandidateRef;
use crate::error::{Result, SyncError};
use crate::mail::source::{MessageSource, RawMessage};
use crate::remote::check_status;

/// Unread mail in the inbox. Not bounded by the watermark.
pub const UNREAD_QUERY: &str = "is:unread in:inbox";

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

/// Gmail REST client for the signed-in user's mailbox.
pub struct GmailClient {
    http: Client,
    base: String,
    credentials: Rc<dyn CredentialProvider>,
}

impl GmailClient {
    pub fn new(base: impl Into<String>, credentials: Rc<dyn CredentialProvider>) -> Self {
        Self {
            http: Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn message_url(&self, id: &str) -> String {
        format!("{}/users/me/messages/{id}", self.base)
    }
}

impl MessageSource for GmailClient {
    fn list_unread(&self) -> Result<Vec<CandidateRef>> {
        let token = self.credentials.get()?;
        let resp = self
            .http
            .get(format!("{}/users/me/messages", self.base))
            .bearer_auth(token)
            .query(&[("q", UNREAD_QUERY)])
            .send()?;
        let list: MessageList = check_status(resp, "list unread messages")?.json()?;
        Ok(list
            .messages
            .into_iter()
            .map(|m| CandidateRef::new(m.id))
            .collect())
    }

    fn fetch(&self, candidate: &CandidateRef) -> Result<RawMessage> {
        let token = self.credentials.get()?;
        let resp = self
            .http
            .get(self.message_url(candidate.as_str()))
            .bearer_auth(token)
            .query(&[("format", "full")])
            .send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound {
                id: candidate.to_string(),
            });
        }
        let operation = format!("fetch message {candidate}");
        Ok(check_status(resp, &operation)?.json()?)
    }

    fn mark_read(&self, candidate: &CandidateRef) -> Result<()> {
        let token = self.credentials.get()?;
        let resp = self
            .http
            .post(format!("{}/modify", self.message_url(candidate.as_str())))
            .bearer_auth(token)
            .json(&json!({ "removeLabelIds": ["UNREAD"] }))
            .send()?;
        check_status(resp, &format!("mark message {candidate} read"))?;
        Ok(())
    }
}
