// service/media.rs
use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;

use crate::config::MediaConfig;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
const PDF_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload rejected: {0}")]
    Rejected(String),
}

/// Which files an upload endpoint takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    ProductImage,
    Prescription,
}

impl UploadKind {
    fn folder(&self) -> &'static str {
        match self {
            UploadKind::ProductImage => "pharmacy/products",
            UploadKind::Prescription => "pharmacy/prescriptions",
        }
    }

    /// Rejects files by MIME type and size before anything is sent out.
    pub fn check(&self, content_type: &str, size: usize) -> Result<(), String> {
        if size == 0 {
            return Err("Uploaded file is empty".to_string());
        }
        if size > MAX_UPLOAD_BYTES {
            return Err("File is too large. Maximum size is 5MB".to_string());
        }

        let allowed = IMAGE_TYPES.contains(&content_type)
            || (*self == UploadKind::Prescription && content_type == PDF_TYPE);

        if !allowed {
            return Err(match self {
                UploadKind::ProductImage => "Only JPG, PNG or WEBP images are allowed",
                UploadKind::Prescription => "Only JPG, PNG, WEBP or PDF files are allowed",
            }
            .to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    config: MediaConfig,
}

impl MediaClient {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Sends the file to the media host and returns its public HTTPS URL.
    pub async fn upload(
        &self,
        kind: UploadKind,
        file_name: String,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, MediaError> {
        if self.config.cloud_name.is_empty() || self.config.upload_preset.is_empty() {
            return Err(MediaError::NotConfigured);
        }

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type)?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone())
            .text("folder", kind.folder());

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/auto/upload",
            self.config.cloud_name
        );

        let response = self.http.post(url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("{}: {}", status, body)));
        }

        let uploaded: UploadResponse = response.json().await?;
        Ok(uploaded.secure_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_images_take_images_only() {
        assert!(UploadKind::ProductImage.check("image/png", 1024).is_ok());
        assert!(UploadKind::ProductImage.check("application/pdf", 1024).is_err());
    }

    #[test]
    fn prescriptions_take_pdf() {
        assert!(UploadKind::Prescription.check("application/pdf", 1024).is_ok());
        assert!(UploadKind::Prescription.check("text/plain", 1024).is_err());
    }

    #[test]
    fn size_limits() {
        assert!(UploadKind::Prescription.check("image/jpeg", 0).is_err());
        assert!(UploadKind::Prescription
            .check("image/jpeg", MAX_UPLOAD_BYTES)
            .is_ok());
        assert!(UploadKind::Prescription
            .check("image/jpeg", MAX_UPLOAD_BYTES + 1)
            .is_err());
    }
}
