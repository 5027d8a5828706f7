//! Error taxonomy for article extraction.
//!
//! Extraction is all-or-nothing: any of these variants aborts the article
//! being processed and no [`ArticleDocument`](crate::models::ArticleDocument)
//! is produced.

use std::path::PathBuf;

/// Errors raised while fetching, extracting or persisting an article.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// Connection failure, timeout or non-success HTTP status.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A required selector matched nothing; usually a markup change on the site.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A paragraph or URL does not have the shape the extractor expects.
    #[error("malformed content: {0}")]
    MalformedContent(String),

    /// Writing an image or the QR code to the asset directory failed.
    #[error("asset I/O error at {path}: {reason}")]
    AssetIo { path: PathBuf, reason: String },
}

impl ExtractError {
    pub fn asset_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExtractError::AssetIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience result type.
pub type ExtractResult<T> = Result<T, ExtractError>;
