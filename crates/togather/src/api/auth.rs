use super::MemberResponse;
use crate::{
    auth::TokenPair,
    db::{member::ProviderType, MemberId, TechStackId},
    oauth::{self, LoginOutcome, SignUpParams},
    AppState, ErrorCode, Result,
};
use axum::{extract::Path, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub code: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub needs_sign_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_up_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<MemberId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub sign_up_token: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    #[serde(default)]
    pub tech_stack_ids: Vec<TechStackId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub member: MemberResponse,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[instrument(skip(app, request))]
pub async fn login(
    Extension(app): Extension<Arc<AppState>>,
    Path(provider): Path<String>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let provider_type = provider
        .parse::<ProviderType>()
        .map_err(|_| ErrorCode::UnsupportedProvider)?;
    let outcome = oauth::login(
        &app.db,
        &app.identity_providers,
        &app.config,
        provider_type,
        &request.code,
    )
    .await?;

    Ok(Json(match outcome {
        LoginOutcome::Member { member, tokens } => LoginResponse {
            needs_sign_up: false,
            member_id: Some(member.id),
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            ..Default::default()
        },
        LoginOutcome::SignUp {
            email,
            sign_up_token,
        } => LoginResponse {
            needs_sign_up: true,
            email: Some(email),
            sign_up_token: Some(sign_up_token),
            ..Default::default()
        },
    }))
}

#[instrument(skip(app, request))]
pub async fn sign_up(
    Extension(app): Extension<Arc<AppState>>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<SignUpResponse>> {
    let outcome = oauth::sign_up(
        &app.db,
        &app.config,
        SignUpParams {
            sign_up_token: request.sign_up_token,
            nickname: request.nickname,
            profile_image: request.profile_image,
            tech_stack_ids: request.tech_stack_ids,
        },
    )
    .await?;
    Ok(Json(SignUpResponse {
        member: outcome.profile.into(),
        tokens: outcome.tokens,
    }))
}

pub async fn refresh(
    Extension(app): Extension<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    Ok(Json(
        oauth::refresh(&app.db, &app.config, &request.refresh_token).await?,
    ))
}
