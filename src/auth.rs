use crate::model::ErrorResponse;
use crate::routes::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Guards the admin routes when an admin key digest is configured; open
/// otherwise.
pub async fn admin_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.admin_api_key_sha3.as_deref() else {
        return next.run(request).await;
    };

    let Some(api_key) = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        tracing::warn!("Unauthorized call to admin api (missing key)");
        return unauthorized();
    };

    if !digest_matches(&hash_api_key(api_key), expected) {
        tracing::warn!("Unauthorized call to admin api (invalid key)");
        return unauthorized();
    }
    next.run(request).await
}

pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(api_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn digest_matches(actual: &str, expected: &str) -> bool {
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Unauthorized".into(),
        }),
    )
        .into_response()
}
