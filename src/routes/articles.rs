use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{read_multipart, remove_target, AppState};
use crate::error::{ApiError, RemoveError};
use crate::models::{Article, ArticleForm, RemoveRequest};

const NOT_FOUND: &str = "Artículo no encontrado";

/// POST /addarticles -> multipart `title`, `domain`, `content`, `image`
pub async fn create(
    Extension(state): Extension<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let form = read_multipart(multipart).await?;
    let fields = ArticleForm::from_fields(form.fields);

    let image = state.uploader.store(form.file).await?;

    let article = state
        .store
        .insert_article(fields.into_new_article(image))
        .await
        .map_err(|e| {
            warn!(error = %e, "falló el alta del artículo");
            ApiError::Persist(e)
        })?;

    info!(id = %article.id, "artículo añadido");
    Ok((StatusCode::CREATED, Json(article)))
}

/// GET /articles
pub async fn list(Extension(state): Extension<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state.store.list_articles().await.map_err(|e| {
        warn!(error = %e, "falló el listado de artículos");
        ApiError::Store(e)
    })?;
    Ok(Json(articles))
}

/// POST /removearticle -> `{id}`
pub async fn remove(
    Extension(state): Extension<AppState>,
    body: Result<Json<RemoveRequest>, JsonRejection>,
) -> Result<Json<Value>, RemoveError> {
    let Some(id) = remove_target(body)? else {
        return Err(RemoveError::NotFound(NOT_FOUND));
    };

    let deleted = state.store.delete_article(id).await.inspect_err(|e| {
        warn!(error = %e, %id, "falló el borrado del artículo");
    })?;
    if !deleted {
        return Err(RemoveError::NotFound(NOT_FOUND));
    }

    info!(%id, "artículo eliminado");
    Ok(Json(json!({ "success": true })))
}
