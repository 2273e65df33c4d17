// src/server.rs
use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::TickerMetaConfig;
use crate::error::TickerMetaError;
use crate::services::TickerMetaService;
use crate::source::TickerSource;
use crate::types::TickerRecord;

/// Upper bound on `limit` accepted from HTTP callers.
pub const MAX_HTTP_LIMIT: usize = 100;

pub struct AppState {
    pub config: TickerMetaConfig,
    pub service: TickerMetaService,
    pub source: Option<Box<dyn TickerSource>>,
    pub admin_token: Option<String>,
    pub session_id: Uuid,
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: TickerMetaConfig,
        service: TickerMetaService,
        source: Option<Box<dyn TickerSource>>,
    ) -> Self {
        Self {
            admin_token: config.admin_token.clone(),
            config,
            service,
            source,
            session_id: Uuid::new_v4(),
            start_time: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    pub q: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RebuildParams {
    pub clear: Option<bool>,
}

/// GET /autocomplete?q=&min=&max=&offset=&limit=
pub async fn autocomplete(
    params: web::Query<AutocompleteParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let defaults = state.config.search;
    let limit = params.limit.unwrap_or(defaults.limit).min(MAX_HTTP_LIMIT);

    let searched = state
        .service
        .autocomplete
        .search(
            &params.q,
            params.min.unwrap_or(defaults.min_score),
            params.max.unwrap_or(defaults.max_score),
            params.offset.unwrap_or(0),
            limit,
        )
        .await;

    Ok(match searched {
        Ok(names) => HttpResponse::Ok().json(json!({
            "query": params.q.trim(),
            "count": names.len(),
            "results": names,
        })),
        Err(e) => error_response(&e),
    })
}

/// GET /tickers/resolve?q= (company name, falling back to ticker)
pub async fn resolve(
    params: web::Query<ResolveParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let resolved = state.service.lookup.resolve_any(&params.q).await;
    Ok(record_response(&params.q, resolved))
}

/// GET /tickers/company/{name}
pub async fn resolve_by_company_name(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let name = path.into_inner();
    let resolved = state.service.lookup.resolve_by_company_name(&name).await;
    Ok(record_response(&name, resolved))
}

/// GET /tickers/symbol/{ticker}
pub async fn resolve_by_ticker(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let ticker = path.into_inner();
    let resolved = state.service.lookup.resolve_by_ticker(&ticker).await;
    Ok(record_response(&ticker, resolved))
}

/// POST /admin/rebuild?clear=
pub async fn rebuild(
    req: HttpRequest,
    params: web::Query<RebuildParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if let Some(expected) = &state.admin_token {
        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        if auth_header.strip_prefix("Bearer ") != Some(expected.as_str()) {
            return Ok(HttpResponse::Unauthorized().json(json!({
                "error": "Unauthorized",
                "message": "Invalid or missing authorization token"
            })));
        }
    }

    let Some(source) = state.source.as_deref() else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "No ticker source configured (set TICKER_SOURCE_FILE or TICKER_SOURCE_URL)"
        })));
    };

    let clear = params.clear.unwrap_or(state.config.clear_before_rebuild);
    info!("🔄 Rebuild requested (clear: {})", clear);

    Ok(match state.service.builder.rebuild(source, clear).await {
        Ok(report) => HttpResponse::Ok().json(json!({
            "success": report.is_clean(),
            "report": report,
        })),
        Err(e) => error_response(&e),
    })
}

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store_ok = state.service.health_check().await;
    let body = json!({
        "status": if store_ok { "healthy" } else { "degraded" },
        "service": "ticker-meta-cache",
        "store": if store_ok { "reachable" } else { "unreachable" },
        "namespace": state.config.namespace,
        "session_id": state.session_id,
        "uptime_seconds": (Utc::now() - state.start_time).num_seconds(),
        "version": env!("CARGO_PKG_VERSION"),
    });

    Ok(if store_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    })
}

pub async fn cors_handler() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Methods", "POST, GET, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .finish()
}

fn record_response(
    query: &str,
    resolved: std::result::Result<Option<TickerRecord>, TickerMetaError>,
) -> HttpResponse {
    match resolved {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "error": "Not found",
            "query": query.trim(),
        })),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &TickerMetaError) -> HttpResponse {
    error!("Request failed: {}", e);
    let body = json!({ "success": false, "error": e.to_string() });
    match e {
        TickerMetaError::StoreRead { .. } | TickerMetaError::StoreWrite { .. } => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Route table shared by the server binary and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/autocomplete", web::get().to(autocomplete))
        .route("/tickers/resolve", web::get().to(resolve))
        .route("/tickers/company/{name}", web::get().to(resolve_by_company_name))
        .route("/tickers/symbol/{ticker}", web::get().to(resolve_by_ticker))
        .route("/admin/rebuild", web::post().to(rebuild))
        .route("/health", web::get().to(health_check));
}
