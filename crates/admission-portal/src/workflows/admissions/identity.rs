use std::fmt;

use serde::{Deserialize, Serialize};

const MAX_DOCUMENT_ID_LEN: usize = 128;

/// Resolved lookup key for a store record. Document identity survives re-imports; numeric ids
/// may be re-assigned, so they are only used when no document id exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecordKey {
    Document(String),
    Numeric(u64),
}

impl RecordKey {
    /// Parse a path segment: all-digit input is a numeric id, anything else must be a
    /// well-formed document id.
    pub fn parse(raw: &str) -> Result<Self, InvalidReference> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            let id = trimmed
                .parse::<u64>()
                .map_err(|_| InvalidReference::MalformedNumericId(trimmed.to_string()))?;
            return Self::numeric(id);
        }
        Self::document(trimmed)
    }

    pub fn document(raw: &str) -> Result<Self, InvalidReference> {
        validate_document_id(raw)?;
        Ok(Self::Document(raw.to_string()))
    }

    pub fn numeric(id: u64) -> Result<Self, InvalidReference> {
        if id == 0 {
            return Err(InvalidReference::ZeroId);
        }
        Ok(Self::Numeric(id))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Document(id) => write!(f, "{id}"),
            RecordKey::Numeric(id) => write!(f, "#{id}"),
        }
    }
}

/// Reference to a record carrying whichever identities the caller knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl RecordRef {
    pub fn new(id: Option<u64>, document_id: Option<&str>) -> Self {
        Self {
            document_id: document_id.map(str::to_string),
            id,
        }
    }

    pub fn from_document(document_id: &str) -> Self {
        Self::new(None, Some(document_id))
    }

    pub fn from_id(id: u64) -> Self {
        Self::new(Some(id), None)
    }

    /// Pick the key used for lookups. A present but malformed document id is an error rather
    /// than a silent fallback to the numeric id.
    pub fn preferred(&self) -> Result<RecordKey, InvalidReference> {
        match (&self.document_id, self.id) {
            (Some(document_id), _) => RecordKey::document(document_id),
            (None, Some(id)) => RecordKey::numeric(id),
            (None, None) => Err(InvalidReference::Missing),
        }
    }

    /// Whether this reference is addressed by `key`.
    pub fn matches(&self, key: &RecordKey) -> bool {
        match key {
            RecordKey::Document(document_id) => {
                self.document_id.as_deref() == Some(document_id.as_str())
            }
            RecordKey::Numeric(id) => self.id == Some(*id),
        }
    }

    /// Whether two references point at the same record, comparing document ids when both
    /// sides carry one and numeric ids otherwise.
    pub fn same_record(&self, other: &RecordRef) -> bool {
        match (&self.document_id, &other.document_id) {
            (Some(left), Some(right)) => left == right,
            _ => matches!((self.id, other.id), (Some(left), Some(right)) if left == right),
        }
    }
}

fn validate_document_id(raw: &str) -> Result<(), InvalidReference> {
    let valid = !raw.is_empty()
        && raw.len() <= MAX_DOCUMENT_ID_LEN
        && raw
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_');
    if valid {
        Ok(())
    } else {
        Err(InvalidReference::MalformedDocumentId(raw.to_string()))
    }
}

/// A record reference that cannot be turned into a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReference {
    #[error("reference carries neither a document id nor a numeric id")]
    Missing,
    #[error("malformed document id '{0}'")]
    MalformedDocumentId(String),
    #[error("malformed numeric id '{0}'")]
    MalformedNumericId(String),
    #[error("numeric ids start at 1")]
    ZeroId,
}
