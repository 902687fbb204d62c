use super::MemberResponse;
use crate::{auth::Principal, AppState, Result};
use axum::{Extension, Json};
use std::sync::Arc;

pub async fn get_me(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MemberResponse>> {
    let profile = app.db.get_member(principal.member_id).await?;
    Ok(Json(profile.into()))
}
