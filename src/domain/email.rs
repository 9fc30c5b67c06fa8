use std::fmt;

/// Longest body kept in a record; stays below the spreadsheet cell limit.
pub const MAX_BODY_CHARS: usize = 30_000;

/// Opaque message id returned by an unread listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateRef(pub String);

impl CandidateRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRecord {
    pub sender: String,
    pub subject: String,
    pub date: String,
    pub body: String,
    /// Delivery time in milliseconds since epoch.
    pub timestamp: u64,
}

impl EmailRecord {
    pub fn to_row(&self) -> Row {
        Row([
            self.sender.clone(),
            self.subject.clone(),
            self.date.clone(),
            self.body.clone(),
        ])
    }
}

/// sender, subject, date, body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row(pub [String; 4]);

impl Row {
    pub fn cells(&self) -> &[String] {
        &self.0
    }
}
