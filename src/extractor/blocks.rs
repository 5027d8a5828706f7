//! Ordered walk over the article body.
//!
//! Body paragraphs are visited in source order and folded into
//! [`ContentBlock`]s through a two-state accumulator:
//!
//! | State | Paragraph | Effect |
//! |-------|-----------|--------|
//! | any | byline | result cleared, state kept |
//! | any | image | image downloaded, state := `ImagePending` |
//! | `Empty` | text | `Text` block appended |
//! | `ImagePending` | text | `Image` block appended, state := `Empty` |
//!
//! An image still pending when the body ends is discarded. A byline
//! paragraph (text equal to the author) clears everything collected so
//! far, so introductory boilerplate above the in-body byline never reaches
//! the output.

use crate::assets::AssetAcquirer;
use crate::error::{ExtractError, ExtractResult};
use crate::extractor::markup::{flattened_text, has_text_or_child, inner_markup};
use crate::models::ContentBlock;
use crate::policy::CompiledPolicy;
use crate::utils::{escape_spaces, truncate_for_log};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};
use url::Url;

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// What a body paragraph turned out to be.
#[derive(Debug, PartialEq, Eq)]
enum Paragraph {
    /// The in-body repeat of the author line.
    Byline,
    /// An image paragraph with its resolved source URL.
    Image(Url),
    /// Escaped paragraph markup.
    Text(String),
}

#[derive(Debug)]
enum Pending {
    Empty,
    ImagePending(PathBuf),
}

/// Walk the body paragraphs and build the ordered content blocks.
///
/// Images are downloaded through `assets` as they are met, so the walk
/// performs one request per image paragraph.
///
/// # Errors
///
/// - [`ExtractError::MissingField`] when no body paragraph matches
/// - [`ExtractError::MalformedContent`] for an image paragraph without a usable `src`
/// - any error from the asset acquirer
#[instrument(level = "info", skip_all, fields(base_url = %base_url))]
pub async fn extract_blocks<A: AssetAcquirer>(
    document: &Html,
    base_url: &Url,
    author: &str,
    policy: &CompiledPolicy,
    assets: &A,
) -> ExtractResult<Vec<ContentBlock>> {
    let paragraphs: Vec<ElementRef<'_>> = document
        .select(&policy.body)
        .filter(|p| has_text_or_child(*p))
        .collect();
    if paragraphs.is_empty() {
        return Err(ExtractError::MissingField("body"));
    }

    let mut blocks = Vec::new();
    let mut pending = Pending::Empty;

    for (index, paragraph) in paragraphs.into_iter().enumerate() {
        match classify(paragraph, base_url, author, policy)? {
            Paragraph::Byline => {
                debug!(index, dropped = blocks.len(), "Byline paragraph; clearing earlier blocks");
                blocks.clear();
            }
            Paragraph::Image(url) => {
                let path = assets.download_image(&url).await?;
                if let Pending::ImagePending(previous) = &pending {
                    debug!(index, previous = %previous.display(), "Image replaced before any text");
                }
                pending = Pending::ImagePending(path);
            }
            Paragraph::Text(value) => {
                debug!(index, text = %truncate_for_log(&value, 40), "Text paragraph");
                let block = match std::mem::replace(&mut pending, Pending::Empty) {
                    Pending::Empty => ContentBlock::Text { value },
                    Pending::ImagePending(path) => ContentBlock::Image {
                        path: path.to_string_lossy().into_owned(),
                        caption: value,
                    },
                };
                blocks.push(block);
            }
        }
    }

    if let Pending::ImagePending(path) = pending {
        warn!(path = %path.display(), "Image without following text dropped");
    }
    info!(count = blocks.len(), "Extracted content blocks");
    Ok(blocks)
}

fn classify(
    paragraph: ElementRef<'_>,
    base_url: &Url,
    author: &str,
    policy: &CompiledPolicy,
) -> ExtractResult<Paragraph> {
    if flattened_text(paragraph) == author {
        return Ok(Paragraph::Byline);
    }

    let markup = inner_markup(paragraph, &policy.source.unwrap_tags);
    let markup = markup.trim();

    if markup.starts_with(policy.source.image_marker.as_str()) {
        let src = paragraph
            .select(&IMG)
            .next()
            .and_then(|img| img.value().attr("src"))
            .ok_or_else(|| {
                ExtractError::MalformedContent(format!("image paragraph without src: {}", truncate_for_log(markup, 80)))
            })?;
        let url = base_url
            .join(src.trim())
            .map_err(|e| ExtractError::MalformedContent(format!("bad image src {src}: {e}")))?;
        return Ok(Paragraph::Image(url));
    }

    Ok(Paragraph::Text(escape_spaces(markup)))
}
