//! In-process backend and fixtures for controller tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::{AnalysisBackend, AskReply, AskRequest, HealthReport, UploadReply};
use crate::app::{AnalysisResult, Chart, ChartImage, DatasetFile};
use crate::error::TransportError;

pub const TICK: Duration = Duration::from_millis(20);

/// 1x1 transparent PNG
pub const PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAACklEQVR4nGMAAQAABQABDQottAAAAABJRU5ErkJggg==";

pub fn csv_file(name: &str) -> DatasetFile {
    DatasetFile::from_bytes(name, b"month,revenue\n1,100\n2,140\n".to_vec())
}

pub fn analysis(score: u32, titles: &[&str]) -> AnalysisResult {
    let png = STANDARD.decode(PNG_BASE64).unwrap();
    AnalysisResult {
        score,
        charts: titles
            .iter()
            .map(|title| Chart {
                title: title.to_string(),
                image: ChartImage::from_bytes(png.clone()),
                description: format!("{} chart", title),
            })
            .collect(),
        dataset_summary: format!("summary of {}", score),
        ai_insights: None,
    }
}

/// Scripted backend: replies are queued up front, requests can be held
/// until the test releases them.
#[derive(Default)]
pub struct FakeBackend {
    uploads: Mutex<VecDeque<Result<UploadReply, TransportError>>>,
    asks: Mutex<VecDeque<Result<AskReply, TransportError>>>,
    upload_gate: Mutex<Option<Arc<Notify>>>,
    ask_gate: Mutex<Option<Arc<Notify>>>,
    upload_calls: AtomicUsize,
    ask_calls: AtomicUsize,
    last_upload: Mutex<Option<String>>,
    last_ask: Mutex<Option<AskRequest>>,
    unhealthy: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_upload(&self, reply: Result<UploadReply, TransportError>) {
        self.uploads.lock().push_back(reply);
    }

    pub fn push_ask(&self, reply: Result<AskReply, TransportError>) {
        self.asks.lock().push_back(reply);
    }

    /// Make uploads wait for a `notify_one` per request
    pub fn hold_uploads(&self) -> Arc<Notify> {
        self.upload_gate
            .lock()
            .get_or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    pub fn hold_asks(&self) -> Arc<Notify> {
        self.ask_gate
            .lock()
            .get_or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub fn last_upload_name(&self) -> Option<String> {
        self.last_upload.lock().clone()
    }

    pub fn last_ask(&self) -> Option<AskRequest> {
        self.last_ask.lock().clone()
    }

    /// Yield until `n` uploads have reached the backend
    pub async fn wait_for_uploads(&self, n: usize) {
        while self.upload_calls() < n {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_asks(&self, n: usize) {
        while self.ask_calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    async fn upload(
        &self,
        file: &DatasetFile,
        _contents: Vec<u8>,
    ) -> Result<UploadReply, TransportError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_upload.lock() = Some(file.name().to_string());

        let gate = self.upload_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.uploads
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unreachable("no reply queued".to_string())))
    }

    async fn ask_ai(&self, request: &AskRequest) -> Result<AskReply, TransportError> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ask.lock() = Some(request.clone());

        let gate = self.ask_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.asks
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(AskReply::default()))
    }

    async fn health(&self) -> Result<HealthReport, TransportError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("connection refused".to_string()));
        }
        Ok(HealthReport {
            gateway: "alive".to_string(),
            engine: "alive".to_string(),
        })
    }
}
