//! Article extraction pipeline.
//!
//! Turns one article URL into an [`ArticleDocument`]:
//!
//! 1. **Fetching**: the page is downloaded and parsed ([`PageFetcher`])
//! 2. **Fields**: title, volume and author are read from the header ([`fields`])
//! 3. **Body**: paragraphs are walked into ordered blocks, downloading
//!    images as they appear ([`blocks`])
//! 4. **QR code**: the source URL is encoded for the printed page
//!
//! Extraction is all-or-nothing: the first error aborts the article and no
//! document is returned. Nothing is retried.

pub mod blocks;
pub mod fields;
pub mod markup;

use crate::assets::AssetAcquirer;
use crate::error::{ExtractError, ExtractResult};
use crate::fetcher::PageFetcher;
use crate::models::ArticleDocument;
use crate::policy::CompiledPolicy;
use scraper::Html;
use tracing::{info, instrument};
use url::Url;

pub use blocks::extract_blocks;
pub use fields::extract_fields;

/// Fetches article pages and extracts them under one policy.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    fetcher: PageFetcher,
    policy: CompiledPolicy,
}

impl ArticleExtractor {
    pub fn new(fetcher: PageFetcher, policy: CompiledPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    pub fn policy(&self) -> &CompiledPolicy {
        &self.policy
    }

    /// Fetch `url` and extract it, writing assets through `assets`.
    #[instrument(level = "info", skip(self, assets))]
    pub async fn extract_info<A: AssetAcquirer>(
        &self,
        url: &str,
        assets: &A,
    ) -> ExtractResult<ArticleDocument> {
        let document = self.fetcher.fetch(url).await?;
        extract_document(&document, url, &self.policy, assets).await
    }
}

/// Extract an already parsed article page.
///
/// `source_url` is both the base for relative image links and the text
/// encoded in the QR code.
pub async fn extract_document<A: AssetAcquirer>(
    document: &Html,
    source_url: &str,
    policy: &CompiledPolicy,
    assets: &A,
) -> ExtractResult<ArticleDocument> {
    let base_url = Url::parse(source_url)
        .map_err(|e| ExtractError::MalformedContent(format!("article URL {source_url}: {e}")))?;

    let fields = extract_fields(document, policy)?;
    let content = extract_blocks(document, &base_url, &fields.raw_author, policy, assets).await?;
    let qrcode_path = assets.generate_qr(source_url).await?;

    info!(title = %fields.title, blocks = content.len(), "Extracted article");
    Ok(ArticleDocument {
        title: fields.title,
        volume: fields.volume,
        author: fields.author,
        content,
        qrcode_path: qrcode_path.to_string_lossy().into_owned(),
    })
}
