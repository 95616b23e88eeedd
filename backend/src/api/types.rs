//! REST API types for dashboard integration.
//!
//! Request bodies are read as raw JSON first so a missing or mistyped
//! `leads` array becomes a 400 with a readable message instead of axum's
//! generic rejection.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::CsvValidation;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::{DedupKey, ExportFormat, Lead};

/// Response carrying a lead list (scrape, score, merge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadsResponse {
    pub leads: Vec<Lead>,
}

/// Response of `POST /api/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub leads: Vec<Lead>,
    /// Number of leads validated
    pub processed: usize,
    pub timestamp: DateTime<Utc>,
}

/// Response of `POST /api/import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// Identifier for correlating the upload with its log lines
    pub job_id: String,
    pub leads: Vec<Lead>,
    pub validation: CsvValidation,
}

/// Error body shared by every route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Pull the `leads` array out of a request body.
pub fn leads_from(body: &Value, message: &str) -> ServerResult<Vec<Lead>> {
    match body.get("leads") {
        Some(leads @ Value::Array(_)) => serde_json::from_value(leads.clone())
            .map_err(|e| ServerError::BadRequest(format!("{}: {}", message, e))),
        _ => Err(ServerError::BadRequest(message.to_string())),
    }
}

/// Dedup strategy from an optional `key` field.
///
/// Missing or empty means email; a value that names no simple strategy
/// selects the multi-key one.
pub fn dedup_key_from(body: &Value) -> DedupKey {
    match body.get("key").and_then(Value::as_str) {
        None | Some("") => DedupKey::Email,
        Some(key) => key.parse().unwrap_or(DedupKey::Advanced),
    }
}

/// Export format from an optional `format` field. Unknown names are rejected
/// here; `xlsx` is recognised and left for the exporter to refuse.
pub fn export_format_from(body: &Value) -> ServerResult<ExportFormat> {
    match body.get("format").and_then(Value::as_str) {
        None | Some("") | Some("csv") => Ok(ExportFormat::Csv),
        Some("xlsx") => Ok(ExportFormat::Xlsx),
        Some(_) => Err(ServerError::UnsupportedFormat(
            "Unsupported format. Use \"csv\" or \"xlsx\".".into(),
        )),
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::EmptyInput | PipelineError::InvalidCsv(_)) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
