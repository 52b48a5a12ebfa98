//! Error types shared across ParamScrub crates.

/// Errors surfaced by the core.
///
/// Unparsable filter lines and texts without URLs are not errors: the former
/// are dropped by the compiler, the latter simply leave the text unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `/.../` clause held a pattern the regex engine rejected.
    #[error("Invalid pattern /{pattern}/: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// The fetcher could not supply bytes for a source.
    #[error("Source '{source_id}' unavailable: {reason}")]
    SourceUnavailable { source_id: String, reason: String },
    /// The source bytes are not valid UTF-8.
    #[error("Source '{source_id}' is not valid UTF-8 (at byte {valid_up_to})")]
    SourceDecode { source_id: String, valid_up_to: usize },
}

impl Error {
    pub fn unavailable(source_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
