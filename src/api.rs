//! Analysis service API module
//!
//! Provides the HTTP client for the analysis gateway and the trait the
//! controller talks through, so tests can swap in an in-process backend.

mod client;
pub mod model;

use async_trait::async_trait;

use crate::app::DatasetFile;
use crate::error::TransportError;

pub use client::AnalysisClient;
pub use model::{AskReply, AskRequest, HealthReport, UploadReply};

/// Request/response contract of the analysis gateway
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// `POST /upload` with the dataset as a single multipart field
    async fn upload(
        &self,
        file: &DatasetFile,
        contents: Vec<u8>,
    ) -> Result<UploadReply, TransportError>;

    /// `POST /ask-ai`
    async fn ask_ai(&self, request: &AskRequest) -> Result<AskReply, TransportError>;

    /// `GET /health`
    async fn health(&self) -> Result<HealthReport, TransportError>;
}
