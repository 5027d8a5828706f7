//! Command-line interface definitions.
//!
//! Either a single article URL or a list page URL is required. Everything
//! else has a default suited to running from the renderer's working
//! directory.

use clap::{ArgGroup, Parser};

/// Command-line arguments for qstheory_fetch.
///
/// # Examples
///
/// ```sh
/// # One article, assets in ./img, JSON in the current directory
/// qstheory_fetch http://www.qstheory.cn/dukan/qs/2022-06/15/c_1128739416.htm
///
/// # Every article linked from an issue's table of contents
/// qstheory_fetch --list-url http://www.qstheory.cn/dukan/qs/2022-06/15/c_1128739000.htm -o ./json
///
/// # With a custom selector table
/// qstheory_fetch --policy ./policy.yaml http://www.qstheory.cn/...
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "list_url"])))]
pub struct Cli {
    /// The URL of the target article
    pub url: Option<String>,

    /// A list page whose article links are fetched one by one
    #[arg(short, long)]
    pub list_url: Option<String>,

    /// Directory for downloaded images and the QR code
    #[arg(short, long, default_value = "img")]
    pub asset_dir: String,

    /// Output directory for the article JSON files
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Optional path to a YAML extraction policy
    #[arg(short, long)]
    pub policy: Option<String>,
}
