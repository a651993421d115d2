use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::db::DbError;
use crate::models::ValidationError;
use crate::upload::UploadError;

/// Errores de los endpoints de alta y listado. Todos responden `{message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Formulario mal formado o campo inválido.
    #[error("{0}")]
    Validation(String),

    /// El store rechazó el alta.
    #[error("{0}")]
    Persist(DbError),

    /// Falló la subida de la imagen; no se guarda nada.
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// Falló la lectura del store.
    #[error("{0}")]
    Store(DbError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.0)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::Persist(_) => StatusCode::BAD_REQUEST,
            Self::Upload(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Errores de `/removearticle` y `/removeproduct`: `{success:false, error}`.
#[derive(Debug, Error)]
pub enum RemoveError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Error del servidor.")]
    Store(#[from] DbError),
}

impl IntoResponse for RemoveError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}
