//! Title, volume and author extraction.
//!
//! Each field is the first direct text node of a positionally selected
//! element. The byline spans carry a fixed-length label (`来源：`,
//! `作者：`) that is removed before the value is escaped.

use crate::error::{ExtractError, ExtractResult};
use crate::policy::CompiledPolicy;
use crate::utils::{escape_spaces, normalize_whitespace, strip_label};
use scraper::node::Node;
use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

/// The metadata fields of an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFields {
    /// Escaped, whitespace-normalized title.
    pub title: String,
    /// Escaped volume label.
    pub volume: String,
    /// Escaped author.
    pub author: String,
    /// The author before escaping, compared against body paragraphs to find
    /// the duplicated byline.
    pub raw_author: String,
}

/// Extract title, volume and author from an article page.
///
/// # Errors
///
/// [`ExtractError::MissingField`] when the heading or either byline span is
/// absent or holds no text node.
#[instrument(level = "debug", skip_all)]
pub fn extract_fields(document: &Html, policy: &CompiledPolicy) -> ExtractResult<ArticleFields> {
    let raw_title = document
        .select(&policy.title)
        .find_map(first_text_node)
        .ok_or(ExtractError::MissingField("title"))?;
    let title = normalize_whitespace(&raw_title);

    let prefix = policy.source.label_prefix_chars;
    let volume = byline_value(document, policy, policy.source.volume_index, "volume")?;
    let volume = strip_label(&volume, prefix);
    let raw_author = byline_value(document, policy, policy.source.author_index, "author")?;
    let raw_author = strip_label(&raw_author, prefix);

    debug!(%title, %volume, author = %raw_author, "Extracted article fields");
    Ok(ArticleFields {
        title: escape_spaces(&title),
        volume: escape_spaces(&volume),
        author: escape_spaces(&raw_author),
        raw_author,
    })
}

fn byline_value(
    document: &Html,
    policy: &CompiledPolicy,
    index: usize,
    field: &'static str,
) -> ExtractResult<String> {
    document
        .select(&policy.appellation)
        .nth(index)
        .and_then(first_text_node)
        .ok_or(ExtractError::MissingField(field))
}

/// The first text node that is a direct child of `element`.
fn first_text_node(element: ElementRef<'_>) -> Option<String> {
    element.children().find_map(|child| match child.value() {
        Node::Text(text) => Some(text.text.to_string()),
        _ => None,
    })
}
