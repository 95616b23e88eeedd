//! HTTP Server for the lead API.
//!
//! Every route is a thin adapter over the library: parse the body, call one
//! stage, serialize the result.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/scrape`     | Generate leads for keyword/URLs      |
//! | POST   | `/api/validate`   | Email format, provider and MX flags  |
//! | POST   | `/api/score`      | Rule-based scores                    |
//! | POST   | `/api/dedup`      | Drop duplicates (`key` optional)     |
//! | POST   | `/api/merge`      | Merge leads sharing an email         |
//! | POST   | `/api/stats`      | Dashboard counters                   |
//! | POST   | `/api/export`     | Download leads as CSV                |
//! | POST   | `/api/import`     | Upload a CSV file (multipart `file`) |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, State},
    http::{header, Method},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_info, log_info_indent, log_success, log_warning, LOG_BROADCASTER};
use super::types::{
    dedup_key_from, export_format_from, leads_from, ImportResponse, LeadsResponse, ValidateResponse,
};
use crate::codec::{decode_upload, export_filename, parse_csv, to_csv, validate_csv_format};
use crate::dedup::{dedup, merge_leads};
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::{DedupOutcome, ExportFormat, LeadStats};
use crate::pipeline::Pipeline;
use crate::scrape::{MockScraper, ScrapeRequest};
use crate::stats::calculate_lead_stats;

const LEADS_REQUIRED: &str = "leads array is required";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Build the router with every route and the CORS layer.
pub fn router(pipeline: Pipeline) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/scrape", post(scrape).get(scrape_usage))
        .route("/api/validate", post(validate).get(validate_usage))
        .route("/api/score", post(score))
        .route("/api/dedup", post(dedup_leads).get(dedup_usage))
        .route("/api/merge", post(merge))
        .route("/api/stats", post(stats))
        .route("/api/export", post(export).get(export_usage))
        .route("/api/import", post(import))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, pipeline: Pipeline) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🚀 Leadgen server running on http://localhost:{}", port);
    tracing::info!("   POST /api/validate - Flag lead emails");
    tracing::info!("   POST /api/export   - Download CSV");
    tracing::info!("   GET  /api/logs     - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "leadgen",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Stages
// =============================================================================

async fn scrape(Json(request): Json<ScrapeRequest>) -> ServerResult<Json<LeadsResponse>> {
    let leads = MockScraper::from_entropy().scrape(&request)?;
    log_success(format!("Scraped {} leads", leads.len()));
    Ok(Json(LeadsResponse { leads }))
}

async fn validate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ServerResult<Json<ValidateResponse>> {
    let leads = leads_from(&body, "Invalid input: leads must be an array")?;
    log_info(format!("✉️  Validating {} leads...", leads.len()));

    let leads = state.pipeline.validate(&leads).await;
    Ok(Json(ValidateResponse {
        processed: leads.len(),
        leads,
        timestamp: Utc::now(),
    }))
}

async fn score(State(state): State<AppState>, Json(body): Json<Value>) -> ServerResult<Json<LeadsResponse>> {
    let leads = leads_from(&body, LEADS_REQUIRED)?;
    Ok(Json(LeadsResponse {
        leads: state.pipeline.score(&leads),
    }))
}

async fn dedup_leads(Json(body): Json<Value>) -> ServerResult<Json<DedupOutcome>> {
    let leads = leads_from(&body, LEADS_REQUIRED)?;
    if leads.is_empty() {
        return Ok(Json(DedupOutcome::default()));
    }

    let key = dedup_key_from(&body);
    let outcome = dedup(&leads, key);
    log_success(format!("{} duplicates removed ({:?})", outcome.removed_count, key));
    Ok(Json(outcome))
}

async fn merge(Json(body): Json<Value>) -> ServerResult<Json<LeadsResponse>> {
    let leads = leads_from(&body, LEADS_REQUIRED)?;
    Ok(Json(LeadsResponse {
        leads: merge_leads(&leads),
    }))
}

async fn stats(Json(body): Json<Value>) -> ServerResult<Json<LeadStats>> {
    let leads = leads_from(&body, LEADS_REQUIRED)?;
    Ok(Json(calculate_lead_stats(&leads)))
}

async fn export(Json(body): Json<Value>) -> ServerResult<impl IntoResponse> {
    let leads = leads_from(&body, LEADS_REQUIRED)?;
    if leads.is_empty() {
        return Err(ServerError::BadRequest("No leads to export".into()));
    }

    match export_format_from(&body)? {
        ExportFormat::Csv => {}
        ExportFormat::Xlsx => {
            return Err(ServerError::UnsupportedFormat(
                "XLSX format is not yet supported. Please use CSV format.".into(),
            ))
        }
    }

    let content = to_csv(&leads);
    let filename = export_filename("leads-export", Utc::now());
    log_success(format!("Exported {} leads to {}", leads.len(), filename));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        content,
    ))
}

async fn import(mut multipart: Multipart) -> ServerResult<Json<ImportResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let job_id = Uuid::new_v4().to_string();
    log_info(format!(
        "📄 Import {}: {} ({} bytes)",
        job_id,
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let content = decode_upload(&bytes);
    let validation = validate_csv_format(&content);
    if !validation.is_valid {
        log_warning("CSV rejected");
        for error in &validation.errors {
            log_info_indent(error.clone(), 1);
        }
        return Err(PipelineError::InvalidCsv(validation.errors).into());
    }

    let leads = parse_csv(&content);
    log_success(format!("Imported {} leads", leads.len()));
    Ok(Json(ImportResponse {
        job_id,
        leads,
        validation,
    }))
}

// =============================================================================
// Usage
// =============================================================================

async fn scrape_usage() -> Json<Value> {
    Json(json!({
        "message": "Scrape API is working",
        "usage": "POST with { keyword?: string, urls?: string[] }"
    }))
}

async fn validate_usage() -> Json<Value> {
    Json(json!({
        "message": "Validate API is working",
        "usage": "POST with { leads: Lead[] }",
        "features": [
            "Email format validation",
            "MX record checking",
            "Generic email detection",
            "Domain extraction",
            "Flag assignment"
        ]
    }))
}

async fn dedup_usage() -> Json<Value> {
    Json(json!({
        "message": "Dedup API is working",
        "usage": "POST with { leads: Lead[], key?: \"email\" | \"domain\" | \"advanced\" }",
        "dedupKeys": {
            "email": "Remove leads with duplicate email addresses",
            "domain": "Remove leads with duplicate domains",
            "advanced": "Multi-criteria deduplication (email, domain, name, company)"
        }
    }))
}

async fn export_usage() -> Json<Value> {
    Json(json!({
        "message": "Export API is working",
        "usage": "POST with { leads: Lead[], format?: \"csv\" | \"xlsx\" }",
        "formats": {
            "csv": "Comma-separated values (supported)",
            "xlsx": "Excel format (not yet implemented)"
        }
    }))
}
