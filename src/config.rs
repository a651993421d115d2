use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("variable de entorno {name}: {source}")]
    EnvVar {
        name: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("valor inválido para {name}: `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres {
        url: String,
        max_connections: u32,
    },
    Memory,
}

/// Dónde termina la imagen subida.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadMode {
    /// Se sirve desde el directorio local bajo el prefijo público.
    Local,
    /// Se reenvía a un servicio remoto que devuelve `imageUrl`.
    Remote { endpoint: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub public_prefix: String,
    pub mode: UploadMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub store: StoreConfig,
    pub upload: UploadConfig,
}

fn var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar { name, source }),
    }
}

impl AppConfig {
    /// Lee la configuración del entorno (`.env` ya cargado por `main`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(var)
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<Option<String>, ConfigError>,
    {
        let host = lookup("HOST")?.unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT")?.unwrap_or_else(|| "5000".to_string());
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST/PORT",
                value: format!("{host}:{port}"),
            })?;

        let store = match lookup("RECORD_STORE")?.as_deref() {
            None | Some("postgres") => {
                let url = lookup("DATABASE_URL")?.ok_or(ConfigError::EnvVar {
                    name: "DATABASE_URL",
                    source: env::VarError::NotPresent,
                })?;
                let max_connections = match lookup("DATABASE_MAX_CONNECTIONS")? {
                    Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        value: raw,
                    })?,
                    None => 5,
                };
                StoreConfig::Postgres {
                    url,
                    max_connections,
                }
            }
            Some("memory") => StoreConfig::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "RECORD_STORE",
                    value: other.to_string(),
                })
            }
        };

        let dir = PathBuf::from(lookup("UPLOAD_DIR")?.unwrap_or_else(|| "uploads".to_string()));
        let public_prefix = lookup("UPLOAD_PUBLIC_PREFIX")?
            .unwrap_or_else(|| "/uploads".to_string())
            .trim_end_matches('/')
            .to_string();
        if !public_prefix.starts_with('/') || public_prefix.len() < 2 {
            return Err(ConfigError::Invalid {
                name: "UPLOAD_PUBLIC_PREFIX",
                value: public_prefix,
            });
        }
        let mode = match lookup("UPLOAD_ENDPOINT")? {
            Some(endpoint) => UploadMode::Remote { endpoint },
            None => UploadMode::Local,
        };

        Ok(AppConfig {
            addr,
            store,
            upload: UploadConfig {
                dir,
                public_prefix,
                mode,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&'static str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        AppConfig::from_lookup(|name| Ok(vars.get(name).cloned()))
    }

    #[test]
    fn defaults_with_database_url() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/catalog")]).unwrap();
        assert_eq!(cfg.addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(
            cfg.store,
            StoreConfig::Postgres {
                url: "postgres://localhost/catalog".into(),
                max_connections: 5
            }
        );
        assert_eq!(cfg.upload.dir, PathBuf::from("uploads"));
        assert_eq!(cfg.upload.public_prefix, "/uploads");
        assert_eq!(cfg.upload.mode, UploadMode::Local);
    }

    #[test]
    fn postgres_needs_database_url() {
        let err = config(&[]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVar {
                name: "DATABASE_URL",
                ..
            }
        ));
    }

    #[test]
    fn memory_store_and_remote_upload() {
        let cfg = config(&[
            ("RECORD_STORE", "memory"),
            ("PORT", "8080"),
            ("UPLOAD_PUBLIC_PREFIX", "/media/"),
            ("UPLOAD_ENDPOINT", "http://images.local/upload"),
        ])
        .unwrap();
        assert_eq!(cfg.store, StoreConfig::Memory);
        assert_eq!(cfg.addr.port(), 8080);
        assert_eq!(cfg.upload.public_prefix, "/media");
        assert_eq!(
            cfg.upload.mode,
            UploadMode::Remote {
                endpoint: "http://images.local/upload".into()
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("RECORD_STORE", "mongo")]).is_err());
        assert!(config(&[("RECORD_STORE", "memory"), ("PORT", "abc")]).is_err());
        assert!(config(&[
            ("RECORD_STORE", "memory"),
            ("UPLOAD_PUBLIC_PREFIX", "uploads")
        ])
        .is_err());
    }
}
