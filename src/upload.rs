use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::{UploadConfig, UploadMode};

/// Nombre del campo multipart que trae la imagen.
pub const IMAGE_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("no se pudo guardar la imagen: {0}")]
    Io(#[from] io::Error),
    #[error("falló la petición al servidor de imágenes: {0}")]
    Remote(#[from] reqwest::Error),
    #[error("el servidor de imágenes no devolvió imageUrl")]
    MissingUrl,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Formulario multipart ya leído entero: campos de texto y, como mucho, un archivo.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

/// Lee todo el multipart antes de validar nada, así un formulario inválido
/// no deja archivos en disco.
pub async fn read_form(mut multipart: Multipart) -> Result<FormData, MultipartError> {
    let mut form = FormData::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if name == IMAGE_FIELD {
            if let Some(file_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await?;
                // input file vacío del navegador
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.file = Some(UploadedFile { file_name, bytes });
                continue;
            }
        }
        let value = field.text().await?;
        form.fields.insert(name, value);
    }

    Ok(form)
}

/// `.png`, `.jpeg`... o vacío si el nombre original no tiene extensión.
fn extension_of(original: &str) -> String {
    Path::new(original)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteUpload {
    image_url: Option<String>,
}

pub struct Uploader {
    config: UploadConfig,
    client: reqwest::Client,
}

impl Uploader {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.config.public_prefix
    }

    /// Crea el directorio de staging si no existe.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.config.dir).await
    }

    /// Guarda la imagen (si hay) y devuelve la referencia que va al registro.
    /// El archivo local se queda en disco también en modo remoto.
    pub async fn store(&self, file: Option<UploadedFile>) -> Result<Option<String>, UploadError> {
        let Some(file) = file else {
            return Ok(None);
        };

        let (name, path) = self.stage(&file).await?;

        let reference = match &self.config.mode {
            UploadMode::Local => format!("{}/{}", self.config.public_prefix, name),
            UploadMode::Remote { endpoint } => {
                self.forward(endpoint, &name, file.bytes)
                    .await
                    .inspect_err(|e| {
                        warn!(
                            error = %e,
                            staged = %path.display(),
                            "falló el reenvío de la imagen"
                        );
                    })?
            }
        };

        Ok(Some(reference))
    }

    /// Escribe el archivo como `<millis><ext>`. Nunca pisa uno existente: si el
    /// nombre ya está ocupado se prueba con el milisegundo siguiente.
    async fn stage(&self, file: &UploadedFile) -> Result<(String, PathBuf), UploadError> {
        let ext = extension_of(&file.file_name);
        let mut stamp = Utc::now().timestamp_millis();

        loop {
            let name = format!("{stamp}{ext}");
            let path = self.config.dir.join(&name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut out) => {
                    out.write_all(&file.bytes).await?;
                    out.flush().await?;
                    info!(file = %name, size = file.bytes.len(), "imagen guardada");
                    return Ok((name, path));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn forward(
        &self,
        endpoint: &str,
        name: &str,
        bytes: Bytes,
    ) -> Result<String, UploadError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(name.to_string());
        let form = reqwest::multipart::Form::new().part(IMAGE_FIELD, part);

        let body: RemoteUpload = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let url = body
            .image_url
            .filter(|u| !u.is_empty())
            .ok_or(UploadError::MissingUrl)?;
        info!(file = %name, url = %url, "imagen reenviada");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_uploader(dir: PathBuf) -> Uploader {
        Uploader::new(UploadConfig {
            dir,
            public_prefix: "/uploads".into(),
            mode: UploadMode::Local,
        })
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("precast-upload-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn extension_is_kept() {
        assert_eq!(extension_of("photo.JPG"), ".JPG");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("../../etc/x.png"), ".png");
    }

    #[tokio::test]
    async fn no_file_gives_none() {
        let uploader = local_uploader(scratch_dir());
        assert!(uploader.store(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_upload_is_served_under_prefix() {
        let dir = scratch_dir();
        let uploader = local_uploader(dir.clone());
        uploader.ensure_dir().await.unwrap();

        let file = UploadedFile {
            file_name: "wall.png".into(),
            bytes: Bytes::from_static(b"png-bytes"),
        };
        let reference = uploader.store(Some(file)).await.unwrap().unwrap();

        let name = reference.strip_prefix("/uploads/").unwrap();
        assert!(name.ends_with(".png"));
        assert!(name.trim_end_matches(".png").parse::<i64>().is_ok());
        let stored = tokio::fs::read(dir.join(name)).await.unwrap();
        assert_eq!(stored, b"png-bytes");

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn same_millisecond_does_not_overwrite() {
        let dir = scratch_dir();
        let uploader = local_uploader(dir.clone());
        uploader.ensure_dir().await.unwrap();

        let mut names = Vec::new();
        for body in [&b"first"[..], &b"second"[..], &b"third"[..]] {
            let file = UploadedFile {
                file_name: "a.jpg".into(),
                bytes: Bytes::copy_from_slice(body),
            };
            names.push(uploader.store(Some(file)).await.unwrap().unwrap());
        }
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
