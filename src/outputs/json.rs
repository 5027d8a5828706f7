//! JSON hand-off to the renderer.
//!
//! Each extracted article is written to `{output_dir}/{article_stem}.json`,
//! wrapped with its source URL and the local extraction date and time.

use crate::models::{ArticleDocument, ExportedArticle};
use crate::utils::article_stem;
use chrono::Local;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Wrap an article with its source URL and the current local date/time.
pub fn export(source: &str, article: ArticleDocument) -> ExportedArticle {
    let now = Local::now();
    ExportedArticle {
        source: source.to_string(),
        local_date: now.date_naive().to_string(),
        local_time: now.time().format("%H:%M:%S").to_string(),
        article,
    }
}

/// Write an [`ExportedArticle`] as pretty-printed JSON.
///
/// The output directory is created if needed. An existing file for the
/// same article is replaced.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, source = %exported.source))]
pub async fn write_article(
    exported: &ExportedArticle,
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(exported)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = PathBuf::from(output_dir).join(format!("{}.json", article_stem(&exported.source)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote article JSON");

    Ok(path)
}
