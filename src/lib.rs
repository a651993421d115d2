//! Backend JSON para artículos y productos prefabricados, con subida de imágenes.

pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod models;
pub mod routes;
pub mod upload;

pub use routes::{router, AppState};
