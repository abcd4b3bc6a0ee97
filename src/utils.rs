use crate::error::LinkError;
use crate::model::ErrorResponse;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use std::env;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(err: LinkError) -> ApiError {
    let status = match &err {
        LinkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LinkError::NotFound => StatusCode::NOT_FOUND,
        LinkError::Expired => StatusCode::GONE,
        LinkError::DecryptionFailure | LinkError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let message = match &err {
        LinkError::Storage(_) => {
            tracing::error!("{}", err);
            "Internal server error".to_string()
        }
        _ => err.to_string(),
    };
    (status, Json(ErrorResponse { error: message }))
}

pub fn bad_request(message: &str) -> ApiError {
    api_error(LinkError::InvalidInput(message.into()))
}

/// Answers any body the JSON extractor refuses with 400 and a JSON error.
pub fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected request body: {}", rejection.body_text());
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON body",
        _ => "Invalid request body",
    };
    bad_request(message)
}

pub fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}
