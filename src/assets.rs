//! Image download and QR code generation.
//!
//! Assets are written into one directory that must exist before the first
//! call; the binary creates it at startup. Files are named after the last
//! segment of their URL and silently overwrite earlier files of the same
//! name, so articles processed side by side need separate directories
//! (see [`AssetStore::scoped`]).
//!
//! # Architecture
//!
//! - [`AssetAcquirer`]: the seam the body walker downloads through
//! - [`AssetStore`]: the HTTP + file system implementation

use crate::error::{ExtractError, ExtractResult};
use crate::utils::file_name_from_url;
use image::{GrayImage, ImageBuffer, Luma, imageops};
use qrcode::{EcLevel, QrCode};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Pixel size of one QR module.
const QR_MODULE_PX: u32 = 2;
/// White border around the symbol, in modules.
const QR_BORDER_MODULES: u32 = 1;

/// Fetches and persists the binary assets an article refers to.
pub trait AssetAcquirer {
    /// Download an image and return the local path it was written to.
    async fn download_image(&self, url: &Url) -> ExtractResult<PathBuf>;

    /// Encode `source_url` as a QR code image and return its local path.
    async fn generate_qr(&self, source_url: &str) -> ExtractResult<PathBuf>;
}

/// Writes assets into a fixed directory, downloading over a shared client.
#[derive(Debug, Clone)]
pub struct AssetStore {
    client: Client,
    dir: PathBuf,
    qrcode_file: String,
}

impl AssetStore {
    pub fn new(client: Client, dir: impl Into<PathBuf>, qrcode_file: impl Into<String>) -> Self {
        Self {
            client,
            dir: dir.into(),
            qrcode_file: qrcode_file.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A store writing into `<dir>/<name>`, sharing this store's client.
    ///
    /// The subdirectory is not created here.
    pub fn scoped(&self, name: &str) -> Self {
        Self {
            client: self.client.clone(),
            dir: self.dir.join(name),
            qrcode_file: self.qrcode_file.clone(),
        }
    }

    /// Where an image downloaded from `url` will be stored.
    pub fn image_path_for(&self, url: &Url) -> ExtractResult<PathBuf> {
        let name = file_name_from_url(url)
            .ok_or_else(|| ExtractError::MalformedContent(format!("image URL has no file name: {url}")))?;
        Ok(self.dir.join(name))
    }

    pub fn qrcode_path(&self) -> PathBuf {
        self.dir.join(&self.qrcode_file)
    }
}

impl AssetAcquirer for AssetStore {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn download_image(&self, url: &Url) -> ExtractResult<PathBuf> {
        let path = self.image_path_for(url)?;
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        fs::write(&path, &bytes)
            .await
            .map_err(|e| ExtractError::asset_io(&path, e))?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved image");
        Ok(path)
    }

    #[instrument(level = "info", skip(self))]
    async fn generate_qr(&self, source_url: &str) -> ExtractResult<PathBuf> {
        let path = self.qrcode_path();
        let image = render_qr(source_url).map_err(|e| ExtractError::asset_io(&path, e))?;
        image
            .save(&path)
            .map_err(|e| ExtractError::asset_io(&path, e))?;
        info!(path = %path.display(), width = image.width(), "Saved QR code");
        Ok(path)
    }
}

/// Render `data` as a black-on-white QR code.
///
/// Error correction level L, smallest version that fits, 2x2 pixel modules
/// and a one-module border.
pub fn render_qr(data: &str) -> Result<GrayImage, qrcode::types::QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)?;
    let symbol = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(QR_MODULE_PX, QR_MODULE_PX)
        .build();

    let border = QR_BORDER_MODULES * QR_MODULE_PX;
    let mut canvas: GrayImage = ImageBuffer::from_pixel(
        symbol.width() + 2 * border,
        symbol.height() + 2 * border,
        Luma([255u8]),
    );
    imageops::overlay(&mut canvas, &symbol, border as i64, border as i64);
    Ok(canvas)
}
