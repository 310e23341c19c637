use anyhow::Context as _;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use civic_core::health::{health_json, healthz};
use civic_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::config::ComplaintsConfig;
use crate::handlers::{
    analytics::get_analytics,
    autofill::autofill,
    complaint::{
        all_complaints, create_complaint, get_complaint, list_complaints, list_updates,
        update_complaint,
    },
    health::readyz,
    mail::send_mail,
    user::{list_users, register},
    worker::{get_worker, list_workers},
};
use crate::infra::storage::UPLOADS_ROUTE;
use crate::state::AppState;

/// HTTP-level settings that are not part of [`AppState`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// `None` allows any origin.
    pub cors_origin: Option<HeaderValue>,
    pub max_upload_bytes: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            cors_origin: None,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl HttpOptions {
    pub fn from_config(config: &ComplaintsConfig) -> anyhow::Result<Self> {
        let cors_origin = config
            .cors_origin
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .context("CORS_ORIGIN is not a valid header value")?;
        Ok(Self {
            cors_origin,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    fn cors(&self) -> CorsLayer {
        match &self.cors_origin {
            Some(origin) => CorsLayer::new()
                .allow_origin(origin.clone())
                .allow_methods(Any)
                .allow_headers(Any),
            None => CorsLayer::permissive(),
        }
    }
}

pub fn build_router(state: AppState, http: &HttpOptions) -> Router {
    let uploads = ServeDir::new(&state.images.dir);

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/health", get(health_json))
        // Accounts
        .route("/api/register", post(register))
        .route("/api/users", get(list_users))
        // Complaints
        .route("/api/complaints", get(list_complaints).post(create_complaint))
        .route("/api/allcomplaints", get(all_complaints))
        .route(
            "/api/complaints/{id}",
            get(get_complaint).put(update_complaint),
        )
        .route("/api/complaints/{id}/updates", get(list_updates))
        // Workers
        .route("/api/workers", get(list_workers))
        .route("/api/worker/{id}", get(get_worker))
        // Dashboard
        .route("/api/analytics", get(get_analytics))
        // Outbound dependencies
        .route("/api/autofill", post(autofill))
        .route("/send-mail", post(send_mail))
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(http.max_upload_bytes))
                .layer(http.cors()),
        )
        .with_state(state)
}
