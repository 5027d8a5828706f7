//! # qstheory_fetch
//!
//! Fetches articles from the Qiushi theory portal (`qstheory.cn`) and turns
//! them into an ordered, typeset-ready document model: title, volume,
//! author, body blocks with locally stored images, and a QR code pointing
//! back at the source.
//!
//! ## Usage
//!
//! ```sh
//! qstheory_fetch http://www.qstheory.cn/dukan/qs/2022-06/15/c_1128739416.htm
//! qstheory_fetch --list-url <issue-page> -a ./img -o ./json
//! ```
//!
//! ## Architecture
//!
//! The application follows a strictly sequential pipeline:
//! 1. **Fetching**: Download the article page, decoded as UTF-8
//! 2. **Extraction**: Read header fields and walk the body into blocks,
//!    downloading images inline
//! 3. **QR code**: Encode the source URL next to the images
//! 4. **Output**: Write the document as JSON for the renderer
//!
//! In list mode the article URLs are indexed from a list page first and
//! then processed one at a time, each with its own asset subdirectory.

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod assets;
mod cli;
mod error;
mod extractor;
mod fetcher;
mod models;
mod outputs;
mod policy;
mod utils;

use assets::AssetStore;
use cli::Cli;
use extractor::ArticleExtractor;
use fetcher::{PageFetcher, build_client};
use outputs::json;
use utils::{article_stem, ensure_writable_dir};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("qstheory_fetch starting up");

    let args = Cli::parse();
    debug!(?args.url, ?args.list_url, ?args.asset_dir, ?args.output_dir, "Parsed CLI arguments");

    // Assets must be writable before the first download.
    for dir in [&args.asset_dir, &args.output_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Directory is not writable (fix perms or choose a different path)");
            return Err(e);
        }
    }

    let extraction_policy = policy::load_policy(args.policy.as_deref()).await?;
    let compiled = extraction_policy.compile()?;

    let client = build_client()?;
    let extractor = ArticleExtractor::new(PageFetcher::new(client.clone()), compiled);
    let assets = AssetStore::new(client, &args.asset_dir, extraction_policy.qrcode_file.clone());

    let (processed, failed) = match (&args.url, &args.list_url) {
        (Some(url), _) => {
            if let Err(e) = process_article(&extractor, &assets, url, &args.output_dir).await {
                error!(%url, error = %e, "Article extraction failed");
                return Err(e);
            }
            (1, 0)
        }
        (None, Some(list_url)) => run_list(&extractor, &assets, list_url, &args.output_dir).await?,
        (None, None) => unreachable!("clap requires a url or --list-url"),
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        processed,
        failed,
        "Execution complete"
    );

    Ok(())
}

/// Extract one article and write its JSON.
#[instrument(level = "info", skip(extractor, assets, output_dir))]
async fn process_article(
    extractor: &ArticleExtractor,
    assets: &AssetStore,
    url: &str,
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    info!("Fetching article contents");
    let article = extractor.extract_info(url, assets).await?;

    let exported = json::export(url, article);
    let path = json::write_article(&exported, output_dir).await?;
    let images = exported
        .article
        .content
        .iter()
        .filter(|block| block.image_path().is_some())
        .count();
    info!(
        path = %path.display(),
        blocks = exported.article.content.len(),
        images,
        "Article ready for rendering"
    );
    Ok(path)
}

/// Index a list page and process every article on it, one at a time.
///
/// Failed articles are logged and skipped. Returns `(processed, failed)`.
#[instrument(level = "info", skip(extractor, assets, output_dir))]
async fn run_list(
    extractor: &ArticleExtractor,
    assets: &AssetStore,
    list_url: &str,
    output_dir: &str,
) -> Result<(usize, usize), Box<dyn Error>> {
    let urls = extractor
        .fetcher()
        .index_articles(list_url, &extractor.policy().list_link)
        .await?;
    let total = urls.len();

    let results: Vec<bool> = stream::iter(urls)
        .then(|url: String| async move {
            // Separate directories keep equal image basenames apart.
            let scoped = assets.scoped(&article_stem(&url));
            let dir = scoped.dir().to_string_lossy().into_owned();
            if let Err(e) = ensure_writable_dir(&dir).await {
                error!(%url, path = %dir, error = %e, "Asset directory not writable; skipping article");
                return false;
            }

            match process_article(extractor, &scoped, &url, output_dir).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(%url, error = %e, "Article failed; skipping");
                    false
                }
            }
        })
        .collect()
        .await;

    let processed = results.iter().filter(|ok| **ok).count();
    info!(total, processed, failed = total - processed, "Completed list processing");
    Ok((processed, total - processed))
}
