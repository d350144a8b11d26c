// src/app/state.rs
//! Session state definitions

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageFormat, ImageReader};

/// Dataset extensions offered by the file picker
pub const DATASET_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// Where the bytes of a dataset come from
#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// A user-chosen dataset file
#[derive(Debug, Clone)]
pub struct DatasetFile {
    name: String,
    source: FileSource,
}

impl DatasetFile {
    /// Reference a file on disk; contents are read at submission time
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    /// Wrap bytes already in memory under a file name
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(bytes.into().into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// Whether the picker would have offered this file
    pub fn has_recognized_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| DATASET_EXTENSIONS.contains(&ext.as_str()))
    }

    /// MIME type sent with the multipart part
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("csv") => "text/csv",
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some("xls") => "application/vnd.ms-excel",
            _ => "application/octet-stream",
        }
    }

    /// Read the full file contents
    pub async fn contents(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(p) => tokio::fs::read(p).await,
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// Decoded chart image bytes
#[derive(Clone)]
pub struct ChartImage {
    bytes: Arc<[u8]>,
    format: Option<ImageFormat>,
}

impl std::fmt::Debug for ChartImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartImage")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

impl ChartImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let format = image::guess_format(&bytes).ok();
        Self {
            bytes: bytes.into(),
            format,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Format sniffed from the magic bytes, if recognized
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// File extension matching the sniffed format
    pub fn extension(&self) -> &'static str {
        self.format()
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("bin")
    }

    /// Pixel size, read from the image header only
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let reader = ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()
            .ok()?;
        match reader.into_dimensions() {
            Ok(dims) => Some(dims),
            Err(e) => {
                tracing::debug!("Could not read chart image dimensions: {}", e);
                None
            }
        }
    }
}

/// One rendered visualization
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub image: ChartImage,
    pub description: String,
}

impl Chart {
    /// Figure tag shown above the active chart (`FIG_1` for index 0)
    pub fn tag(index: usize) -> String {
        format!("FIG_{}", index + 1)
    }
}

/// Outcome of a successful analysis
///
/// Replaced wholesale by each successful upload, never patched in place.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub score: u32,
    /// Never empty
    pub charts: Vec<Chart>,
    pub dataset_summary: String,
    /// Model-generated remarks attached by the gateway, when it has a key
    pub ai_insights: Option<String>,
}

/// Audio overview attached alongside the analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPreview {
    pub path: PathBuf,
    pub name: String,
}

impl AudioPreview {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }
}

/// Working state for one analysis cycle
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub selected_file: Option<DatasetFile>,
    /// True exactly while an upload is in flight
    pub is_busy: bool,
    pub error_message: Option<String>,
    pub analysis_result: Option<AnalysisResult>,
    pub animated_score: u32,
    pub selected_chart_index: usize,
    /// Summary from the last successful analysis, sent with AI questions
    pub conversation_context: String,

    // AI query flow, independent of `is_busy`
    pub is_asking: bool,
    /// Answer or error text, both share one display surface
    pub ai_answer: Option<String>,

    pub audio_preview: Option<AudioPreview>,

    /// Bumped whenever an in-flight upload reply must no longer apply
    pub(crate) upload_generation: u64,
    /// Identifies the score animation allowed to write `animated_score`
    pub(crate) animation_generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> &[Chart] {
        self.analysis_result
            .as_ref()
            .map(|r| r.charts.as_slice())
            .unwrap_or(&[])
    }

    /// The chart currently on display
    pub fn selected_chart(&self) -> Option<&Chart> {
        self.charts().get(self.selected_chart_index)
    }

    /// Labels for the chart picker, numbered from 1
    pub fn chart_options(&self) -> Vec<String> {
        self.charts()
            .iter()
            .enumerate()
            .map(|(idx, chart)| format!("{}. {}", idx + 1, chart.title))
            .collect()
    }
}
