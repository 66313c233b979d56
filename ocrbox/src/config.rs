use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse `OCRBOX_API_KEYS`.
/// Format: comma-separated entries, each either `key` or `user_id:key`.
fn parse_api_keys() -> Vec<ApiKey> {
    match env::var("OCRBOX_API_KEYS") {
        Ok(val) if !val.trim().is_empty() => val
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let parsed = ApiKey::parse(entry);
                if parsed.is_none() {
                    tracing::warn!("Invalid API key entry in OCRBOX_API_KEYS, skipping");
                }
                parsed
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<ApiKey>,
    pub max_body_bytes: usize,
}

/// A bearer token together with the user identity it authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub user_id: String,
}

impl ApiKey {
    /// Parses `key` or `user_id:key`. Bare keys get a stable user id derived
    /// from a hash of the key so the key itself never lands in the database.
    pub fn parse(entry: &str) -> Option<Self> {
        match entry.split_once(':') {
            Some((user_id, key)) => {
                let user_id = user_id.trim();
                let key = key.trim();
                if user_id.is_empty() || key.is_empty() {
                    return None;
                }
                Some(Self {
                    key: key.to_string(),
                    user_id: user_id.to_string(),
                })
            }
            None => Some(Self {
                key: entry.to_string(),
                user_id: user_id_from_api_key(entry),
            }),
        }
    }
}

pub fn user_id_from_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    let digest = hasher.finalize();
    let hash = format!("{digest:x}");
    format!("api_key_{}", &hash[..16])
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub enabled: bool,
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Local,
    Http,
}

impl std::str::FromStr for StorageBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Ok(Self::Local),
            "http" | "remote" => Ok(Self::Http),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    pub local_dir: String,
    pub public_url: String,
    pub http_url: Option<String>,
    pub http_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Tesseract `tessdata` directory; `None` uses the system default.
    pub data_path: Option<String>,
    pub default_language: String,
    pub timeout_secs: u64,
    pub max_file_size: usize,
    pub max_image_dimension: u32,
    pub max_batch_size: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: "local/tesseract".to_string(),
            api_key: None,
            base_url: None,
            data_path: None,
            default_language: "eng".to_string(),
            timeout_secs: 60,
            max_file_size: 10 * 1024 * 1024,
            max_image_dimension: 4000,
            max_batch_size: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let port = parse_env_or("OCRBOX_PORT", 3000);
        Self {
            server: ServerConfig {
                host: env::var("OCRBOX_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
                api_keys: parse_api_keys(),
                max_body_bytes: parse_env_or("SERVER_MAX_BODY_BYTES", 64 * 1024 * 1024),
            },
            database: DatabaseConfig {
                enabled: parse_env_or("DATABASE_ENABLED", true),
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:ocrbox.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
            },
            storage: StorageConfig {
                backend: parse_env_or("STORAGE_BACKEND", StorageBackendKind::Local),
                local_dir: env::var("STORAGE_LOCAL_DIR").unwrap_or_else(|_| "./uploads".to_string()),
                public_url: env::var("STORAGE_PUBLIC_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{port}/files")),
                http_url: env::var("STORAGE_HTTP_URL").ok(),
                http_token: env::var("STORAGE_HTTP_TOKEN").ok(),
                timeout_secs: parse_env_or("STORAGE_TIMEOUT", 30),
            },
            ocr: OcrConfig {
                model: env::var("OCR_MODEL").unwrap_or_else(|_| "local/tesseract".to_string()),
                api_key: env::var("OCR_API_KEY").ok(),
                base_url: env::var("OCR_BASE_URL").ok(),
                data_path: env::var("OCR_DATA_PATH").ok(),
                default_language: env::var("OCR_DEFAULT_LANGUAGE")
                    .unwrap_or_else(|_| "eng".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
                max_file_size: parse_env_or("OCR_MAX_FILE_SIZE", 10 * 1024 * 1024),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 4000),
                max_batch_size: parse_env_or("OCR_MAX_BATCH_SIZE", 20),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Split an OCR model name into `(provider, model)`.
///
/// Unknown or missing prefixes fall back to the local Tesseract engine.
pub fn parse_ocr_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        if prefix.eq_ignore_ascii_case("openai") || prefix.eq_ignore_ascii_case("local") {
            return (prefix, rest);
        }
    }
    ("local", model)
}
