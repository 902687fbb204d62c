use crate::{db::tech_stack, AppState, Result};
use axum::{Extension, Json};
use std::sync::Arc;

pub async fn list_tech_stacks(
    Extension(app): Extension<Arc<AppState>>,
) -> Result<Json<Vec<tech_stack::Model>>> {
    Ok(Json(app.db.get_tech_stacks().await?))
}
