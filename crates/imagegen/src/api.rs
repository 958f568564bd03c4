//! REST client for the image generation provider.
//!
//! Wraps the provider's `POST /images/generations` (text-to-image) and
//! `POST /images/edits` (image-to-image, multipart) endpoints using
//! [`reqwest`]. Both return a `data` array whose first item carries either an
//! inline `b64_json` payload or a fetchable `url`.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;
use inkwell_core::generation::{GenerationError, ImageSize};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::ImageApiConfig;

/// Longest provider error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the image generation provider.
pub struct ImageApi {
    client: reqwest::Client,
    config: ImageApiConfig,
}

/// Response body of both image endpoints.
#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

/// Errors from the provider REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ImageApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Image API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated, for debugging.
        body: String,
    },

    /// The response parsed but held no usable image.
    #[error("Invalid image response: {0}")]
    InvalidResponse(String),
}

impl From<ImageApiError> for GenerationError {
    fn from(err: ImageApiError) -> Self {
        match err {
            ImageApiError::Request(e) => GenerationError::Transport(e.to_string()),
            ImageApiError::ApiError { status, body } => GenerationError::Provider { status, body },
            ImageApiError::InvalidResponse(msg) => GenerationError::InvalidResponse(msg),
        }
    }
}

impl ImageApi {
    /// Create a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: ImageApiConfig) -> Result<Self, ImageApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Generate an image from a text prompt. Returns the decoded image bytes.
    pub async fn text_to_image(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<Vec<u8>, ImageApiError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "size": size.to_string(),
            "n": 1,
        });

        let request = self
            .authorized(self.client.post(self.endpoint("images/generations")))
            .json(&body);

        let response = request.send().await?;
        let parsed: ImagesResponse = Self::parse_response(response).await?;
        self.extract_image(parsed).await
    }

    /// Edit `image` (the base character asset) according to `prompt`.
    /// Returns the decoded image bytes.
    pub async fn edit_image(
        &self,
        prompt: &str,
        size: ImageSize,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<Vec<u8>, ImageApiError> {
        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(mime_for_file(file_name))?;

        let form = Form::new()
            .text("model", self.config.model.clone())
            .text("prompt", prompt.to_string())
            .text("size", size.to_string())
            .text("n", "1")
            .part("image", part);

        let request = self
            .authorized(self.client.post(self.endpoint("images/edits")))
            .multipart(form);

        let response = request.send().await?;
        let parsed: ImagesResponse = Self::parse_response(response).await?;
        self.extract_image(parsed).await
    }

    /// Download an image the provider returned by URL.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageApiError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.api_key)
        }
    }

    /// Take the first image of a response, preferring the inline payload
    /// and falling back to fetching the URL.
    async fn extract_image(&self, response: ImagesResponse) -> Result<Vec<u8>, ImageApiError> {
        let datum = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ImageApiError::InvalidResponse("response contained no images".into()))?;

        let bytes = match (datum.b64_json, datum.url) {
            (Some(b64), _) => BASE64
                .decode(b64.trim().as_bytes())
                .map_err(|e| ImageApiError::InvalidResponse(format!("base64 decode failed: {e}")))?,
            (None, Some(url)) => {
                tracing::debug!(url = %url, "Fetching provider image by URL");
                self.fetch(&url).await?
            }
            (None, None) => {
                return Err(ImageApiError::InvalidResponse(
                    "image item has neither b64_json nor url".into(),
                ))
            }
        };

        ensure_png(bytes)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ImageApiError::ApiError`]
    /// containing the status and (truncated) body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ImageApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ImageApiError::ApiError {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ImageApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ImageApiError::InvalidResponse(format!("malformed JSON: {e}")))
    }
}

/// MIME type for an asset file, guessed from its extension.
fn mime_for_file(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Artifacts are always served as `.png`; other formats are re-encoded.
fn ensure_png(bytes: Vec<u8>) -> Result<Vec<u8>, ImageApiError> {
    let format = image::guess_format(&bytes).map_err(|_| {
        ImageApiError::InvalidResponse(format!(
            "payload of {} bytes is not a recognised image",
            bytes.len()
        ))
    })?;
    if format == ImageFormat::Png {
        return Ok(bytes);
    }

    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
        ImageApiError::InvalidResponse(format!("could not decode {format:?} payload: {e}"))
    })?;
    let mut png = Cursor::new(Vec::new());
    decoded
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| ImageApiError::InvalidResponse(format!("PNG re-encode failed: {e}")))?;

    tracing::debug!(from = ?format, "Provider image converted to PNG");
    Ok(png.into_inner())
}
