//! Data models for extracted articles.
//!
//! This module defines the structures handed to the downstream renderer:
//! - [`ArticleDocument`]: Title, volume, author, ordered content and QR code path
//! - [`ContentBlock`]: One unit of the article body in reading order
//! - [`ExportedArticle`]: The JSON envelope written to disk
//!
//! All string fields that end up in the typeset document are already
//! space-escaped (`"a b"` is stored as `"a\ b"`).

use serde::{Deserialize, Serialize};

/// A fully extracted article, ready for the renderer.
///
/// Every path in the document points at a file that exists on disk at
/// the time the document is returned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleDocument {
    /// The headline, whitespace-normalized and escaped.
    pub title: String,
    /// The issue label with its source prefix stripped.
    pub volume: String,
    /// The author with its source prefix stripped.
    pub author: String,
    /// Body blocks in reading order.
    pub content: Vec<ContentBlock>,
    /// Path of the QR code encoding the source URL.
    pub qrcode_path: String,
}

/// One block of article body.
///
/// An image is only ever emitted together with the text paragraph that
/// followed it in the source, so a block is never half filled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    /// An escaped prose paragraph.
    Text { value: String },
    /// A downloaded image and the escaped paragraph that follows it.
    Image { path: String, caption: String },
}

impl ContentBlock {
    /// The local image path, if this block carries one.
    pub fn image_path(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { .. } => None,
            ContentBlock::Image { path, .. } => Some(path),
        }
    }
}

/// The on-disk JSON form of an extracted article.
#[derive(Debug, Deserialize, Serialize)]
pub struct ExportedArticle {
    /// The URL the article was fetched from.
    pub source: String,
    /// Local extraction date in `YYYY-MM-DD` format.
    pub local_date: String,
    /// Local extraction time in `HH:MM:SS` format.
    pub local_time: String,
    pub article: ArticleDocument,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> ArticleDocument {
        ArticleDocument {
            title: r"Sample\ Title".to_string(),
            volume: "Vol1".to_string(),
            author: "Jane".to_string(),
            content: vec![
                ContentBlock::Image {
                    path: "img/1.png".to_string(),
                    caption: r"Hello\ world".to_string(),
                },
                ContentBlock::Text {
                    value: "plain".to_string(),
                },
            ],
            qrcode_path: "img/qrcode.png".to_string(),
        }
    }

    #[test]
    fn test_image_path_accessor() {
        let doc = sample_document();
        assert_eq!(doc.content[0].image_path(), Some("img/1.png"));
        assert_eq!(doc.content[1].image_path(), None);
    }

    #[test]
    fn test_content_block_serialization_is_tagged() {
        let block = ContentBlock::Text {
            value: "x".to_string(),
        };
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"kind":"text","value":"x"}"#);
    }

    #[test]
    fn test_exported_article_deserialization() {
        let json = r#"{
            "source": "http://www.qstheory.cn/dukan/qs/2022-06/15/c_1128739416.htm",
            "local_date": "2026-10-19",
            "local_time": "08:00:00",
            "article": {
                "title": "T",
                "volume": "V",
                "author": "A",
                "content": [{"kind": "image", "path": "img/a.jpg", "caption": "c"}],
                "qrcode_path": "img/qrcode.png"
            }
        }"#;

        let exported: ExportedArticle = serde_json::from_str(json).unwrap();
        assert_eq!(exported.local_date, "2026-10-19");
        assert_eq!(exported.article.content.len(), 1);
        assert_eq!(exported.article.content[0].image_path(), Some("img/a.jpg"));
    }

    #[test]
    fn test_escaped_title_survives_json() {
        let doc = sample_document();
        let json = serde_json::to_string(&doc).unwrap();
        let back: ArticleDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, r"Sample\ Title");
    }
}
