use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{read_multipart, remove_target, AppState};
use crate::error::{ApiError, RemoveError};
use crate::models::{Product, ProductForm, RemoveRequest};

const NOT_FOUND: &str = "Producto no encontrado";

/// POST /addproduct
///
/// `dimensions` llega como JSON en texto (`{"length":..,"width":..,"height":..}`).
/// El formulario se valida entero antes de escribir la imagen.
pub async fn create(
    Extension(state): Extension<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let form = read_multipart(multipart).await?;
    let mut product = ProductForm::from_fields(form.fields).validate()?;

    product.image = state.uploader.store(form.file).await?;

    let product = state.store.insert_product(product).await.map_err(|e| {
        warn!(error = %e, "falló el alta del producto");
        ApiError::Persist(e)
    })?;

    info!(id = %product.id, name = %product.name, "producto añadido");
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products
pub async fn list(Extension(state): Extension<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_products().await.map_err(|e| {
        warn!(error = %e, "falló el listado de productos");
        ApiError::Store(e)
    })?;
    Ok(Json(products))
}

/// POST /removeproduct -> `{id}`
pub async fn remove(
    Extension(state): Extension<AppState>,
    body: Result<Json<RemoveRequest>, JsonRejection>,
) -> Result<Json<Value>, RemoveError> {
    let Some(id) = remove_target(body)? else {
        return Err(RemoveError::NotFound(NOT_FOUND));
    };

    let deleted = state.store.delete_product(id).await.inspect_err(|e| {
        warn!(error = %e, %id, "falló el borrado del producto");
    })?;
    if !deleted {
        return Err(RemoveError::NotFound(NOT_FOUND));
    }

    info!(%id, "producto eliminado");
    Ok(Json(json!({ "success": true })))
}
