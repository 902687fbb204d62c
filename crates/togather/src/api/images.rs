use crate::{image_store, AppState, Error, ErrorCode, Result};
use axum::{extract::Multipart, http::StatusCode, Extension, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    pub url: String,
}

/// Accepts a multipart form whose `file` field holds the image.
pub async fn upload_image(
    Extension(app): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadImageResponse>> {
    let Some(store) = app.image_store.as_ref() else {
        return Err(Error::http(
            StatusCode::SERVICE_UNAVAILABLE,
            "image uploads are not configured".to_string(),
        ));
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::http(StatusCode::BAD_REQUEST, error.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| Error::http(StatusCode::BAD_REQUEST, error.to_string()))?;
        let url = image_store::upload_image(store.as_ref(), &file_name, bytes.to_vec()).await?;
        return Ok(Json(UploadImageResponse { url }));
    }

    Err(ErrorCode::NotFoundImage.into())
}
