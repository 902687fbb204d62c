pub mod api;
pub mod auth;
pub mod db;
pub mod env;
mod error_code;
pub mod image_store;
pub mod oauth;
pub mod seed;

use anyhow::Context as _;
use aws_config::{BehaviorVersion, Region};
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use db::Database;
use image_store::{ImageStore, S3ImageStore};
use oauth::IdentityProviders;
use serde::Deserialize;
use serde_json::json;
use std::{path::PathBuf, sync::Arc};

pub use error_code::ErrorCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub enum Error {
    Http(StatusCode, String, HeaderMap),
    Domain(ErrorCode),
    Database(sea_orm::error::DbErr),
    Internal(anyhow::Error),
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Self::Domain(code)
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error)
    }
}

impl From<sea_orm::error::DbErr> for Error {
    fn from(error: sea_orm::error::DbErr) -> Self {
        Self::Database(error)
    }
}

impl From<axum::Error> for Error {
    fn from(error: axum::Error) -> Self {
        Self::Internal(error.into())
    }
}

impl From<axum::http::Error> for Error {
    fn from(error: axum::http::Error) -> Self {
        Self::Internal(error.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal(error.into())
    }
}

impl Error {
    pub fn http(code: StatusCode, message: String) -> Self {
        Self::Http(code, message, HeaderMap::default())
    }

    /// The domain error code carried by this error, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Domain(code) => Some(*code),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Http(code, message, headers) => {
                log::error!("HTTP error {}: {}", code, &message);
                (code, headers, message).into_response()
            }
            Error::Domain(error_code) => {
                let status = error_code.status();
                if status.is_server_error() {
                    log::error!("HTTP error {}: {}", status, error_code.code());
                } else {
                    log::debug!("HTTP error {}: {}", status, error_code.code());
                }
                (
                    status,
                    Json(json!({
                        "errorCode": error_code.code(),
                        "errorMessage": error_code.to_string(),
                    })),
                )
                    .into_response()
            }
            Error::Database(error) => {
                log::error!(
                    "HTTP error {}: {:?}",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &error
                );
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", &error)).into_response()
            }
            Error::Internal(error) => {
                log::error!(
                    "HTTP error {}: {:?}",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &error
                );
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", &error)).into_response()
            }
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(code, message, _headers) => (code, message).fmt(f),
            Error::Domain(code) => code.fmt(f),
            Error::Database(error) => error.fmt(f),
            Error::Internal(error) => error.fmt(f),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(code, message, _) => write!(f, "{code}: {message}"),
            Error::Domain(code) => write!(f, "{}: {}", code.code(), code),
            Error::Database(error) => error.fmt(f),
            Error::Internal(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub http_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub migrations_path: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub access_token_ttl_secs: Option<u64>,
    pub refresh_token_ttl_secs: Option<u64>,
    pub sign_up_token_ttl_secs: Option<u64>,
    pub rust_log: Option<String>,
    pub log_json: Option<bool>,
    pub blob_store_url: Option<String>,
    pub blob_store_region: Option<String>,
    pub blob_store_access_key: Option<String>,
    pub blob_store_secret_key: Option<String>,
    pub blob_store_bucket: Option<String>,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub togather_environment: Arc<str>,
}

impl Config {
    #[cfg(any(test, feature = "test-support"))]
    pub fn test() -> Self {
        Self {
            http_port: 0,
            database_url: "".into(),
            database_max_connections: 0,
            migrations_path: None,
            seed_path: None,
            jwt_secret: "togather-test-secret".into(),
            access_token_ttl_secs: None,
            refresh_token_ttl_secs: None,
            sign_up_token_ttl_secs: None,
            rust_log: None,
            log_json: None,
            blob_store_url: None,
            blob_store_region: None,
            blob_store_access_key: None,
            blob_store_secret_key: None,
            blob_store_bucket: Some("togather-test".into()),
            github_client_id: None,
            github_client_secret: None,
            google_client_id: None,
            google_client_secret: None,
            google_redirect_uri: None,
            togather_environment: "test".into(),
        }
    }
}

#[derive(Default, Deserialize)]
pub struct MigrateConfig {
    pub database_url: String,
    pub migrations_path: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
}

pub struct AppState {
    pub db: Arc<Database>,
    pub image_store: Option<Arc<dyn ImageStore>>,
    pub identity_providers: IdentityProviders,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let mut db_options = db::ConnectOptions::new(config.database_url.clone());
        db_options.max_connections(config.database_max_connections);
        let db = Database::new(db_options).await?;

        let image_store = match build_blob_store_client(&config).await {
            Ok(client) => {
                let bucket = config
                    .blob_store_bucket
                    .clone()
                    .context("missing blob_store_bucket")?;
                Some(Arc::new(S3ImageStore::new(
                    client,
                    bucket,
                    config.blob_store_url.clone(),
                    config.blob_store_region.clone(),
                )) as Arc<dyn ImageStore>)
            }
            Err(error) => {
                log::warn!("image uploads are disabled: {error:#}");
                None
            }
        };

        let this = Self {
            db: Arc::new(db),
            image_store,
            identity_providers: IdentityProviders::from_config(&config),
            config,
        };
        Ok(Arc::new(this))
    }
}

async fn build_blob_store_client(config: &Config) -> anyhow::Result<aws_sdk_s3::Client> {
    let keys = aws_sdk_s3::config::Credentials::new(
        config
            .blob_store_access_key
            .clone()
            .context("missing blob_store_access_key")?,
        config
            .blob_store_secret_key
            .clone()
            .context("missing blob_store_secret_key")?,
        None,
        None,
        "env",
    );

    let mut s3_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(
            config
                .blob_store_region
                .clone()
                .context("missing blob_store_region")?,
        ))
        .credentials_provider(keys);
    if let Some(url) = config.blob_store_url.as_ref() {
        s3_config = s3_config.endpoint_url(url);
    }

    Ok(aws_sdk_s3::Client::new(&s3_config.load().await))
}
