use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::db::RecordStore;
use crate::error::{ApiError, RemoveError};
use crate::models::RemoveRequest;
use crate::upload::{read_form, FormData, Uploader};

pub mod articles;
pub mod products;

/// Lo que comparten todos los handlers. Se construye una vez en `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub uploader: Arc<Uploader>,
}

pub fn router(state: AppState) -> Router {
    let public_prefix = state.uploader.public_prefix().to_string();
    let static_files = ServeDir::new(state.uploader.dir());

    Router::new()
        .route("/addarticles", post(articles::create))
        .route("/articles", get(articles::list))
        .route("/removearticle", post(articles::remove))
        .route("/addproduct", post(products::create))
        .route("/products", get(products::list))
        .route("/removeproduct", post(products::remove))
        .nest_service(&public_prefix, static_files)
        .layer(DefaultBodyLimit::disable())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Lee el multipart completo; cualquier fallo es un 400.
async fn read_multipart(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<FormData, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;
    read_form(multipart)
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))
}

/// Un id que no es UUID no puede existir en el store, así que se trata como
/// "no encontrado" (`None`).
fn remove_target(
    body: Result<Json<RemoveRequest>, JsonRejection>,
) -> Result<Option<Uuid>, RemoveError> {
    let Json(req) = body.map_err(|e| RemoveError::BadRequest(e.body_text()))?;
    Ok(Uuid::parse_str(req.id.trim()).ok())
}
