use crate::auth::{admin_auth, API_KEY_HEADER};
use crate::engine::LinkEngine;
use crate::model::{
    CreateLinkResponse, HealthResponse, LinkList, LinkMetadata, LinkSpecification,
    MessageResponse, RedeemQuery, RedeemedLink,
};
use crate::utils::{api_error, bad_request, json_rejection, ApiError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderName, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LinkEngine>,
    pub admin_api_key_sha3: Option<Arc<str>>,
}

impl AppState {
    pub fn new(engine: Arc<LinkEngine>) -> Self {
        Self {
            engine,
            admin_api_key_sha3: None,
        }
    }

    pub fn with_admin_key_sha3(mut self, digest: impl Into<Arc<str>>) -> Self {
        self.admin_api_key_sha3 = Some(digest.into());
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/stats/:secure_id", get(link_stats))
        .route("/api/delete/:secure_id", delete(delete_link))
        .route("/api/admin/links", get(list_links))
        .route_layer(from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .route("/api/create-secure-link", post(create_link))
        .route("/api/get-video", get(redeem_link_by_query))
        .route("/api/get-video/:secure_id", get(redeem_link))
        .route("/api/health", get(health))
        .merge(admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}

pub async fn create_link(
    State(state): State<AppState>,
    link_specification: Result<Json<LinkSpecification>, JsonRejection>,
) -> Result<Json<CreateLinkResponse>, ApiError> {
    let Json(link_specification) = link_specification.map_err(json_rejection)?;
    let url = link_specification.url().map_err(bad_request)?;
    let expiry = link_specification
        .expiry()
        .map_err(|message| bad_request(&message))?;
    let link = state.engine.create(url, expiry).await.map_err(api_error)?;
    Ok(Json(CreateLinkResponse {
        link,
        message: "Secure link created successfully",
    }))
}

pub async fn redeem_link(
    State(state): State<AppState>,
    Path(secure_id): Path<String>,
) -> Result<Json<RedeemedLink>, ApiError> {
    let link = state.engine.redeem(&secure_id).await.map_err(api_error)?;
    Ok(Json(link))
}

pub async fn redeem_link_by_query(
    State(state): State<AppState>,
    Query(query): Query<RedeemQuery>,
) -> Result<Json<RedeemedLink>, ApiError> {
    let secure_id = query.secure_id.unwrap_or_default();
    let link = state.engine.redeem(&secure_id).await.map_err(api_error)?;
    Ok(Json(link))
}

pub async fn link_stats(
    State(state): State<AppState>,
    Path(secure_id): Path<String>,
) -> Result<Json<LinkMetadata>, ApiError> {
    let metadata = state.engine.inspect(&secure_id).await.map_err(api_error)?;
    Ok(Json(metadata))
}

pub async fn delete_link(
    State(state): State<AppState>,
    Path(secure_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.delete(&secure_id).await.map_err(api_error)?;
    Ok(Json(MessageResponse {
        message: "Secure link deleted successfully",
    }))
}

pub async fn list_links(State(state): State<AppState>) -> Result<Json<LinkList>, ApiError> {
    let links = state.engine.list().await.map_err(api_error)?;
    Ok(Json(links))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
