//! Analysis gateway client
//!
//! Thin reqwest wrapper: builds requests, reads status and body, and
//! hands both to `model` for classification.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, header, multipart};
use tracing::{debug, warn};

use super::AnalysisBackend;
use super::model::{
    AskReply, AskRequest, HealthReport, UploadReply, to_ask_reply, to_upload_reply,
};
use crate::app::DatasetFile;
use crate::error::TransportError;
use crate::features::Settings;

/// Multipart field the gateway reads the dataset from
const UPLOAD_FIELD: &str = "dataset";

#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
}

impl fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("client", &"<HttpClient>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout: Duration, proxy_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(url) = proxy_url {
            debug!("Using proxy {}", url);
            builder = builder.proxy(reqwest::Proxy::all(&url)?);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from backend and network settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.backend.base_url,
            Duration::from_secs(settings.backend.timeout_secs),
            settings.network.proxy_url(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<(u16, String), TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            warn!("Gateway responded {}: {}", status, body);
        }
        Ok((status, body))
    }
}

#[async_trait]
impl AnalysisBackend for AnalysisClient {
    async fn upload(
        &self,
        file: &DatasetFile,
        contents: Vec<u8>,
    ) -> Result<UploadReply, TransportError> {
        debug!(
            "Uploading {} ({} bytes) to {}",
            file.name(),
            contents.len(),
            self.base_url
        );
        let part = multipart::Part::bytes(contents)
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.endpoint("/upload"))
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        to_upload_reply(status, &body)
    }

    async fn ask_ai(&self, request: &AskRequest) -> Result<AskReply, TransportError> {
        debug!("Asking AI ({} chars of context)", request.context.len());
        let response = self
            .client
            .post(self.endpoint("/ask-ai"))
            .header(header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        to_ask_reply(status, &body)
    }

    async fn health(&self) -> Result<HealthReport, TransportError> {
        let response = self
            .client
            .get(self.endpoint("/health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        if !(200..300).contains(&status) {
            return Err(TransportError::Status(status));
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
