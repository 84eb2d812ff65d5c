use sha2::{Digest, Sha256};

/// A quote extracted from a detail page
///
/// Records are content-addressed: `id` is derived from `body` alone, so two
/// pages carrying the same quote text produce the same id no matter which
/// URL they were found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Hex-encoded SHA-256 of the body's UTF-8 bytes
    pub id: String,

    /// Category label of the page (stored in the `type` column)
    pub kind: String,

    /// Title of the page the quote came from
    pub title: String,

    /// Cleaned quote text
    pub body: String,
}

impl Record {
    /// Creates a record, deriving its id from `body`
    pub fn new(kind: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            id: content_id(&body),
            kind: kind.into(),
            title: title.into(),
            body,
        }
    }
}

/// Computes the content identity of a quote body
pub fn content_id(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}
