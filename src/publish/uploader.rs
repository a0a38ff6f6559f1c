//! Image host upload client

use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use reqwest::header::REFERER;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::{ApiKey, Endpoint};
use crate::error::{CompError, CompResult};

/// Multipart field carrying the image bytes
pub const FILE_FIELD: &str = "file-upload[0]";

/// Failure of a single upload; never fatal for the batch
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("unexpected response: {message}")]
    MalformedResponse { message: String },
}

/// Identifier the host assigned to an uploaded image
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteImage {
    pub code: String,
    pub ext: String,
}

impl RemoteImage {
    /// Public link on `host`
    pub fn link(&self, host: &str) -> String {
        format!("https://{}/{}.{}", host, self.code, self.ext)
    }
}

/// Extract the first uploaded image from a host response body
pub fn parse_upload_response(body: &str) -> Result<RemoteImage, UploadError> {
    let images: Vec<RemoteImage> =
        serde_json::from_str(body).map_err(|e| UploadError::MalformedResponse {
            message: e.to_string(),
        })?;

    let image = images
        .into_iter()
        .next()
        .ok_or_else(|| UploadError::MalformedResponse {
            message: "empty image list".to_string(),
        })?;

    if image.code.is_empty() || image.ext.is_empty() {
        return Err(UploadError::MalformedResponse {
            message: "missing code or extension".to_string(),
        });
    }

    Ok(image)
}

/// Sends image bytes to a remote host
pub trait Uploader {
    /// Upload one file and return the identifier the host assigned
    fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<RemoteImage, UploadError>;
}

impl<T: Uploader + ?Sized> Uploader for &T {
    fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<RemoteImage, UploadError> {
        (**self).upload(file_name, bytes)
    }
}

/// Uploader for ptpimg-compatible hosts
pub struct PtpImgUploader {
    client: Client,
    endpoint: Endpoint,
    api_key: ApiKey,
}

impl PtpImgUploader {
    /// Create an uploader with a bounded per-request timeout
    pub fn new(endpoint: Endpoint, api_key: ApiKey, timeout: Duration) -> CompResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompError::ClientError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

impl Uploader for PtpImgUploader {
    fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<RemoteImage, UploadError> {
        debug!("POST {} ({} bytes) to {}", file_name, bytes.len(), self.endpoint.upload_url);

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/png")?;
        let form = multipart::Form::new()
            .text("format", "json")
            .text("api_key", self.api_key.expose().to_string())
            .part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint.upload_url)
            .header(REFERER, &self.endpoint.referer)
            .multipart(form)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(UploadError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        parse_upload_response(&body)
    }
}
