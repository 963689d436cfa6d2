//! Loading design assets into memory.
//!
//! [`AssetLoader`] is the seam the [`Compositor`](crate::Compositor) loads
//! through. [`DefaultAssetLoader`] decodes `data:` URLs in-process and
//! fetches everything else over HTTP with [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use printlab_core::text::is_text_asset;
use printlab_core::DesignFile;

use crate::data_url;
use crate::error::CompositeError;

/// HTTP timeout for a single asset fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A design asset ready to be drawn.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Image(RgbaImage),
    /// Inline text, rendered by the compositor.
    Text(String),
}

/// Loads the asset behind a design file.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load(&self, file: &DesignFile) -> Result<LoadedAsset, CompositeError>;
}

/// Loader for `data:` and `http(s)` URLs.
pub struct DefaultAssetLoader {
    client: reqwest::Client,
}

impl DefaultAssetLoader {
    pub fn new() -> Result<Self, CompositeError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| CompositeError::asset("<http client>", e))?;
        Ok(Self { client })
    }

    /// Reuse an existing [`reqwest::Client`] (shares its connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, file: &DesignFile) -> Result<Vec<u8>, CompositeError> {
        tracing::debug!(url = %file.url, filename = %file.filename, "Fetching design asset");

        let response = self
            .client
            .get(&file.url)
            .send()
            .await
            .map_err(|e| CompositeError::asset(&file.filename, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompositeError::asset(
                &file.filename,
                format!("HTTP {} from {}", status.as_u16(), file.url),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CompositeError::asset(&file.filename, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AssetLoader for DefaultAssetLoader {
    async fn load(&self, file: &DesignFile) -> Result<LoadedAsset, CompositeError> {
        if is_text_asset(file) {
            return decode_text(file).map(LoadedAsset::Text);
        }

        let bytes = if data_url::is_data_url(&file.url) {
            data_url::decode(&file.url)
                .map_err(|e| CompositeError::asset(&file.filename, e))?
                .bytes
        } else {
            self.fetch(file).await?
        };

        let image = image::load_from_memory(&bytes)
            .map_err(|e| CompositeError::asset(&file.filename, e))?;

        tracing::debug!(
            filename = %file.filename,
            width = image.width(),
            height = image.height(),
            "Design asset loaded",
        );

        Ok(LoadedAsset::Image(image.to_rgba8()))
    }
}

/// Decode the text payload of a `data:text/plain` asset.
pub fn decode_text(file: &DesignFile) -> Result<String, CompositeError> {
    let decoded =
        data_url::decode(&file.url).map_err(|e| CompositeError::asset(&file.filename, e))?;
    String::from_utf8(decoded.bytes).map_err(|e| CompositeError::asset(&file.filename, e))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;
    use base64::Engine;
    use image::{ImageFormat, Rgba};
    use printlab_core::{DesignFileId, Position};

    use super::*;

    fn design(filename: &str, url: String) -> DesignFile {
        DesignFile {
            id: DesignFileId(1),
            url,
            filename: filename.to_string(),
            placement: "front".to_string(),
            position: Position {
                area_width: 10.0,
                area_height: 10.0,
                width: 10.0,
                height: 10.0,
                top: 0.0,
                left: 0.0,
                limit_to_print_area: false,
            },
        }
    }

    fn png_data_url(color: Rgba<u8>) -> String {
        let img = RgbaImage::from_pixel(2, 3, color);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf)
        )
    }

    #[tokio::test]
    async fn loads_png_from_data_url() {
        let loader = DefaultAssetLoader::new().unwrap();
        let asset = loader
            .load(&design("red.png", png_data_url(Rgba([255, 0, 0, 255]))))
            .await
            .unwrap();

        assert_matches!(asset, LoadedAsset::Image(img) => {
            assert_eq!(img.dimensions(), (2, 3));
            assert_eq!(*img.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
        });
    }

    #[tokio::test]
    async fn text_assets_are_decoded_not_fetched() {
        let loader = DefaultAssetLoader::new().unwrap();
        let asset = loader
            .load(&design("note.txt", "data:text/plain,Hi%0Athere".to_string()))
            .await
            .unwrap();
        assert_matches!(asset, LoadedAsset::Text(t) if t == "Hi\nthere");
    }

    #[tokio::test]
    async fn undecodable_image_reports_filename() {
        let loader = DefaultAssetLoader::new().unwrap();
        let err = loader
            .load(&design("broken.png", "data:image/png;base64,AAAA".to_string()))
            .await
            .unwrap_err();
        assert_matches!(err, CompositeError::AssetLoad { ref filename, .. } if filename == "broken.png");
    }

    #[tokio::test]
    async fn unreachable_host_is_an_asset_error() {
        let loader = DefaultAssetLoader::new().unwrap();
        let err = loader
            .load(&design("remote.png", "http://127.0.0.1:1/remote.png".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("remote.png"));
    }

    #[tokio::test]
    async fn non_ascii_url_is_an_asset_error() {
        let loader = DefaultAssetLoader::new().unwrap();
        let err = loader
            .load(&design("tick.png", "http\u{2713}://x/tick.png".to_string()))
            .await
            .unwrap_err();
        assert_matches!(err, CompositeError::AssetLoad { ref filename, .. } if filename == "tick.png");
    }
}
