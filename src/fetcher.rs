//! Page fetching and list-page indexing.
//!
//! One [`reqwest::Client`] is built per run and shared (cheaply cloned)
//! between the [`PageFetcher`] and the asset store, so connections are
//! reused across the article page and its images.
//!
//! The portal serves UTF-8 but does not always declare it, so response
//! bodies are always decoded as UTF-8 rather than trusting the headers.

use crate::error::{ExtractError, ExtractResult};
use itertools::Itertools;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("qstheory_fetch/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the fetcher and the asset store.
///
/// No timeout is configured beyond the client default.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Fetches pages and hands back parsed document trees.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GET a URL and return its body, failing on any non-success status.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_bytes(&self, url: &str) -> ExtractResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Fetched response body");
        Ok(bytes.to_vec())
    }

    /// GET a page and parse it into a queryable tree.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, url: &str) -> ExtractResult<Html> {
        let body = self.fetch_bytes(url).await?;
        let document = parse_page(&body);
        info!(bytes = body.len(), "Parsed page");
        Ok(document)
    }

    /// Index a list page for article URLs.
    ///
    /// Every element matching `link_selector` with an `href` is resolved
    /// against the list URL. Duplicates are dropped, keeping first-seen order.
    #[instrument(level = "info", skip(self, link_selector))]
    pub async fn index_articles(
        &self,
        list_url: &str,
        link_selector: &Selector,
    ) -> ExtractResult<Vec<String>> {
        let base = Url::parse(list_url)
            .map_err(|e| ExtractError::MalformedContent(format!("list URL {list_url}: {e}")))?;
        let document = self.fetch(list_url).await?;
        let article_urls = collect_article_links(&document, &base, link_selector);

        info!(count = article_urls.len(), source = list_url, "Indexed article URLs");
        debug!(urls = ?article_urls, "Article URLs");
        Ok(article_urls)
    }
}

/// Decode a body as UTF-8 (lossy) and parse it as an HTML document.
pub fn parse_page(body: &[u8]) -> Html {
    let html = String::from_utf8_lossy(body);
    Html::parse_document(&html)
}

/// Resolve and deduplicate the links matched on a list page.
pub fn collect_article_links(document: &Html, base: &Url, link_selector: &Selector) -> Vec<String> {
    document
        .select(link_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|resolved| resolved.to_string())
        .unique()
        .collect()
}
