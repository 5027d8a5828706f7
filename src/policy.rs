//! Site-specific extraction policy.
//!
//! Everything that ties the extractor to the portal's markup lives here as
//! data: selectors, the label prefix length, which wrapper tags to unwrap.
//! A markup change on the site is a YAML edit, not a code change.
//!
//! ```yaml
//! title_selector: h1
//! appellation_selector: span[class="appellation"]
//! volume_index: 0
//! author_index: 1
//! label_prefix_chars: 3
//! body_selector: div[class="highlight"] > p
//! unwrap_tags: [font]
//! ```

use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Errors raised while loading or compiling a policy.
#[derive(thiserror::Error, Debug)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse policy YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Selector table and constants for one version of the site markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionPolicy {
    /// Selects the page heading; the first direct text node is the title.
    pub title_selector: String,
    /// Selects the byline spans holding volume and author.
    pub appellation_selector: String,
    /// Position of the volume span among appellation matches.
    pub volume_index: usize,
    /// Position of the author span among appellation matches.
    pub author_index: usize,
    /// Characters of source-language label (`来源：`, `作者：`) to drop.
    pub label_prefix_chars: usize,
    /// Selects the candidate body paragraphs.
    pub body_selector: String,
    /// Decorative tags removed from paragraph markup, children kept.
    pub unwrap_tags: Vec<String>,
    /// Serialized markup starting with this is an image paragraph.
    pub image_marker: String,
    /// File name of the QR code inside the asset directory.
    pub qrcode_file: String,
    /// Selects article links on a list page.
    pub list_link_selector: String,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            title_selector: "h1".to_string(),
            appellation_selector: r#"span[class="appellation"]"#.to_string(),
            volume_index: 0,
            author_index: 1,
            label_prefix_chars: 3,
            body_selector: r#"div[class="highlight"] > p"#.to_string(),
            unwrap_tags: vec!["font".to_string()],
            image_marker: "<img".to_string(),
            qrcode_file: "qrcode.png".to_string(),
            list_link_selector: r#"a[href*="/dukan/qs/"][href*="/c_"]"#.to_string(),
        }
    }
}

impl ExtractionPolicy {
    /// Parse a policy from YAML; absent keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Compile the selector strings once so extraction never re-parses them.
    pub fn compile(&self) -> Result<CompiledPolicy, PolicyError> {
        Ok(CompiledPolicy {
            title: parse_selector(&self.title_selector)?,
            appellation: parse_selector(&self.appellation_selector)?,
            body: parse_selector(&self.body_selector)?,
            list_link: parse_selector(&self.list_link_selector)?,
            source: self.clone(),
        })
    }
}

/// An [`ExtractionPolicy`] with its selectors parsed.
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    pub title: Selector,
    pub appellation: Selector,
    pub body: Selector,
    pub list_link: Selector,
    pub source: ExtractionPolicy,
}

fn parse_selector(selector: &str) -> Result<Selector, PolicyError> {
    Selector::parse(selector).map_err(|e| PolicyError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Load a policy file, or the built-in policy when no path is given.
#[instrument(level = "info")]
pub async fn load_policy(path: Option<&str>) -> Result<ExtractionPolicy, PolicyError> {
    match path {
        Some(path) => {
            let yaml = fs::read_to_string(Path::new(path)).await?;
            let policy = ExtractionPolicy::from_yaml(&yaml)?;
            info!(path, "Loaded extraction policy");
            Ok(policy)
        }
        None => {
            info!("Using built-in extraction policy");
            Ok(ExtractionPolicy::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_compiles() {
        let compiled = ExtractionPolicy::default().compile().unwrap();
        assert_eq!(compiled.source.label_prefix_chars, 3);
        assert_eq!(compiled.source.unwrap_tags, vec!["font".to_string()]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let policy = ExtractionPolicy::from_yaml("title_selector: h2\nlabel_prefix_chars: 4\n").unwrap();
        assert_eq!(policy.title_selector, "h2");
        assert_eq!(policy.label_prefix_chars, 4);
        assert_eq!(policy.body_selector, ExtractionPolicy::default().body_selector);
        assert_eq!(policy.qrcode_file, "qrcode.png");
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let policy = ExtractionPolicy {
            body_selector: "div[[".to_string(),
            ..ExtractionPolicy::default()
        };
        match policy.compile() {
            Err(PolicyError::Selector { selector, .. }) => assert_eq!(selector, "div[["),
            other => panic!("expected selector error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_list_link_matches_article_pages_only() {
        let compiled = ExtractionPolicy::default().compile().unwrap();
        let html = r#"<html><body>
            <a href="/dukan/qs/2022-06/15/c_1128739416.htm">article</a>
            <a href="/dukan/qs/2022-12/index.htm">issue index</a>
            <a href="/dukan/qs/">portal</a>
            <a href="http://www.qstheory.cn/dukan/qs/2022-06/01/c_1128695440.htm">absolute</a>
        </body></html>"#;
        let document = scraper::Html::parse_document(html);

        let hrefs: Vec<&str> = document
            .select(&compiled.list_link)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(
            hrefs,
            vec![
                "/dukan/qs/2022-06/15/c_1128739416.htm",
                "http://www.qstheory.cn/dukan/qs/2022-06/01/c_1128695440.htm",
            ]
        );
    }

    #[tokio::test]
    async fn test_load_policy_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, "unwrap_tags: [font, span]\n").unwrap();

        let policy = load_policy(path.to_str()).await.unwrap();
        assert_eq!(policy.unwrap_tags, vec!["font".to_string(), "span".to_string()]);
    }

    #[tokio::test]
    async fn test_load_policy_defaults_without_path() {
        let policy = load_policy(None).await.unwrap();
        assert_eq!(policy, ExtractionPolicy::default());
    }
}
