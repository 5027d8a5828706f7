//! Output generation for extracted articles.
//!
//! # Submodules
//!
//! - [`json`]: Writes an [`ExportedArticle`](crate::models::ExportedArticle)
//!   per article for the typesetting step
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── c_1128739416.json
//!
//! asset_dir/
//! ├── 1128739416_16551.jpg
//! └── qrcode.png
//! ```

pub mod json;
