//! Analysis service model types
//!
//! Wire structures for the gateway endpoints and the conversion of raw
//! replies into controller-level outcomes.
//!
//! Every reply is checked for an `error` field before anything else is
//! trusted: the gateway sometimes reports failures with a 2xx status.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::app::{AnalysisResult, Chart, ChartImage};
use crate::error::TransportError;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartPayload {
    #[serde(default)]
    pub title: String,
    /// Base64 image data, bare or as a `data:` URI
    pub image: String,
    #[serde(default, alias = "desc")]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisPayload {
    #[serde(deserialize_with = "de_score")]
    pub score: u32,
    pub charts: Vec<ChartPayload>,
    #[serde(default)]
    pub data_summary: String,
    #[serde(default)]
    pub ai_insights: Option<String>,
}

/// Scores arrive as JSON numbers, sometimes with a fractional part
fn de_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    if let Some(n) = v.as_u64() {
        return u32::try_from(n).map_err(serde::de::Error::custom);
    }
    match v.as_f64() {
        Some(f) if f >= 0.0 && f <= u32::MAX as f64 => Ok(f.round() as u32),
        _ => Err(serde::de::Error::custom(format!("invalid score: {}", v))),
    }
}

/// Standard alphabet, padding optional
const IMAGE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Strip an optional `data:image/png;base64,` header and decode
///
/// Line breaks and other ASCII whitespace inside the payload are ignored.
pub fn decode_image(data: &str) -> Result<ChartImage, base64::DecodeError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, b64)| b64).unwrap_or(rest),
        None => data,
    };
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = IMAGE_ENGINE.decode(compact)?;
    Ok(ChartImage::from_bytes(bytes))
}

impl AnalysisPayload {
    pub fn into_result(self) -> Result<AnalysisResult, TransportError> {
        if self.charts.is_empty() {
            return Err(TransportError::Malformed(
                "analysis contained no charts".to_string(),
            ));
        }
        let charts = self
            .charts
            .into_iter()
            .map(|c| {
                let image = decode_image(&c.image).map_err(|e| {
                    TransportError::Malformed(format!("chart '{}' image: {}", c.title, e))
                })?;
                Ok(Chart {
                    title: c.title,
                    image,
                    description: c.description,
                })
            })
            .collect::<Result<Vec<_>, TransportError>>()?;
        Ok(AnalysisResult {
            score: self.score,
            charts,
            dataset_summary: self.data_summary,
            ai_insights: self.ai_insights.filter(|s| !s.is_empty()),
        })
    }
}

/// Classified reply of `POST /upload`
#[derive(Debug, Clone)]
pub enum UploadReply {
    Analysis(AnalysisResult),
    /// Backend reached, refused with this message
    Rejected(String),
}

/// A present, non-empty `error` field
fn error_field(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_body(status: u16, body: &str) -> Result<Value, TransportError> {
    serde_json::from_str::<Value>(body).map_err(|e| {
        if (200..300).contains(&status) {
            TransportError::Malformed(e.to_string())
        } else {
            TransportError::Status(status)
        }
    })
}

pub fn to_upload_reply(status: u16, body: &str) -> Result<UploadReply, TransportError> {
    let value = parse_body(status, body)?;
    if let Some(message) = error_field(&value) {
        return Ok(UploadReply::Rejected(message));
    }
    if !(200..300).contains(&status) {
        return Err(TransportError::Status(status));
    }
    let payload: AnalysisPayload =
        serde_json::from_value(value).map_err(|e| TransportError::Malformed(e.to_string()))?;
    Ok(UploadReply::Analysis(payload.into_result()?))
}

/// Body of `POST /ask-ai`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AskRequest {
    pub prompt: String,
    pub context: String,
    /// User-supplied key for deployments without a server-side default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AskReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Same precedence as uploads: an `error` field wins, any other non-2xx
/// reply is a status failure.
pub fn to_ask_reply(status: u16, body: &str) -> Result<AskReply, TransportError> {
    let value = parse_body(status, body)?;
    let error = error_field(&value);
    if error.is_none() && !(200..300).contains(&status) {
        return Err(TransportError::Status(status));
    }
    Ok(AskReply {
        response: value
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string),
        error,
    })
}

/// `GET /health`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    /// Gateway process liveness
    #[serde(rename = "python", default)]
    pub gateway: String,
    /// Analysis engine liveness as seen by the gateway
    #[serde(rename = "r_backend", default)]
    pub engine: String,
}

impl HealthReport {
    pub fn is_ready(&self) -> bool {
        self.gateway == "alive" && self.engine == "alive"
    }
}
