use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::{MediaError, MediaFile, MediaHost, MediaKind, UploadedMedia};
use crate::config::MediaConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed-upload client for the Cloudinary REST API.
pub struct CloudinaryHost {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl CloudinaryHost {
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            cloud_name: config.cloud_name.clone().ok_or(MediaError::NotConfigured("CLOUDINARY_CLOUD_NAME"))?,
            api_key: config.api_key.clone().ok_or(MediaError::NotConfigured("CLOUDINARY_API_KEY"))?,
            api_secret: config.api_secret.clone().ok_or(MediaError::NotConfigured("CLOUDINARY_API_SECRET"))?,
            folder: config.folder.clone(),
        })
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!("{}/{}/{}/{}", API_BASE, self.cloud_name, kind.resource_type(), action)
    }

    /// Adds the api key, timestamp and signature to a form carrying `params`.
    fn signed_form(&self, params: Vec<(&'static str, String)>) -> Form {
        let timestamp = Utc::now().timestamp().to_string();
        let mut signed = params;
        signed.push(("timestamp", timestamp));
        let signature = sign(&signed, &self.api_secret);

        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in signed {
            form = form.text(key, value);
        }
        form
    }

    async fn send(&self, url: String, form: Form) -> Result<reqwest::Response, MediaError> {
        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(MediaError::Rejected { status: status.as_u16(), message })
    }
}

/// SHA-256 request signature: parameters sorted by name, joined as
/// `k=v&k=v`, with the API secret appended.
pub(crate) fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, file: MediaFile, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        file.validate(kind)?;

        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = self
            .signed_form(vec![("folder", self.folder.clone())])
            .part("file", part);

        let body: UploadResponse = self
            .send(self.endpoint(kind, "upload"), form)
            .await?
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        tracing::info!("Uploaded {} asset {}", kind.resource_type(), body.public_id);
        Ok(UploadedMedia {
            url: body.secure_url,
            public_id: body.public_id,
            duration: body.duration,
        })
    }

    async fn destroy(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError> {
        let form = self.signed_form(vec![("public_id", public_id.to_string())]);
        let body: DestroyResponse = self
            .send(self.endpoint(kind, "destroy"), form)
            .await?
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::InvalidResponse(format!("destroy result '{}'", other))),
        }
    }
}
