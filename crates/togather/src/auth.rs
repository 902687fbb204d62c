use crate::{
    db::{member, MemberId},
    AppState, Config, Error, ErrorCode, Result,
};
use axum::{
    http::{self, Request, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use member::{ProviderType, Role};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

const ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);
const REFRESH_TOKEN_LIFETIME: Duration = Duration::from_secs(14 * 24 * 60 * 60);
const SIGN_UP_TOKEN_LIFETIME: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    /// Issued after an OAuth login for an email with no member yet. It
    /// carries the verified email until the member picks a nickname.
    SignUp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
    pub kind: TokenKind,
    pub member_id: Option<MemberId>,
    #[serde(default)]
    pub role: Role,
    pub email: Option<String>,
    pub provider_type: Option<ProviderType>,
}

impl TokenClaims {
    fn new(kind: TokenKind, config: &Config) -> Self {
        let lifetime = match kind {
            TokenKind::Access => config
                .access_token_ttl_secs
                .map_or(ACCESS_TOKEN_LIFETIME, Duration::from_secs),
            TokenKind::Refresh => config
                .refresh_token_ttl_secs
                .map_or(REFRESH_TOKEN_LIFETIME, Duration::from_secs),
            TokenKind::SignUp => config
                .sign_up_token_ttl_secs
                .map_or(SIGN_UP_TOKEN_LIFETIME, Duration::from_secs),
        };
        let now = Utc::now().timestamp() as u64;
        Self {
            iat: now,
            exp: now + lifetime.as_secs(),
            jti: uuid::Uuid::new_v4().to_string(),
            kind,
            member_id: None,
            role: Role::User,
            email: None,
            provider_type: None,
        }
    }

    pub fn for_member(kind: TokenKind, member: &member::Model, config: &Config) -> Self {
        Self {
            member_id: Some(member.id),
            role: member.role,
            ..Self::new(kind, config)
        }
    }

    pub fn for_sign_up(email: &str, provider_type: ProviderType, config: &Config) -> Self {
        Self {
            email: Some(email.to_string()),
            provider_type: Some(provider_type),
            ..Self::new(TokenKind::SignUp, config)
        }
    }

    pub fn encode(&self, config: &Config) -> Result<String> {
        Ok(jsonwebtoken::encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(config.jwt_secret.as_ref()),
        )
        .map_err(anyhow::Error::from)?)
    }

    /// Decodes a token, checking its signature, expiry and kind.
    pub fn validate(
        token: &str,
        kind: TokenKind,
        config: &Config,
    ) -> Result<TokenClaims, ValidateTokenError> {
        let claims = match jsonwebtoken::decode::<Self>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_ref()),
            &Validation::default(),
        ) {
            Ok(token) => token.claims,
            Err(e) => {
                if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature {
                    return Err(ValidateTokenError::Expired);
                } else {
                    return Err(ValidateTokenError::Jwt(e));
                }
            }
        };

        if claims.kind != kind {
            return Err(ValidateTokenError::WrongKind {
                expected: kind,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }
}

#[derive(Error, Debug)]
pub enum ValidateTokenError {
    #[error("token is expired")]
    Expired,
    #[error("token validation error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("expected {expected:?} token, got {actual:?}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
}

impl From<ValidateTokenError> for Error {
    fn from(error: ValidateTokenError) -> Self {
        log::debug!("rejected token: {error}");
        match error {
            ValidateTokenError::Expired => ErrorCode::ExpiredToken.into(),
            ValidateTokenError::Jwt(_) | ValidateTokenError::WrongKind { .. } => {
                ErrorCode::InvalidToken.into()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn issue(member: &member::Model, config: &Config) -> Result<Self> {
        Ok(Self {
            access_token: TokenClaims::for_member(TokenKind::Access, member, config)
                .encode(config)?,
            refresh_token: TokenClaims::for_member(TokenKind::Refresh, member, config)
                .encode(config)?,
        })
    }
}

/// The member on whose behalf a protected request runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub member_id: MemberId,
    pub role: Role,
}

pub async fn validate_access_token<B>(mut req: Request<B>, next: Next<B>) -> impl IntoResponse {
    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            Error::http(
                StatusCode::UNAUTHORIZED,
                "missing authorization header".to_string(),
            )
        })?
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            Error::http(
                StatusCode::UNAUTHORIZED,
                "invalid authorization header".to_string(),
            )
        })?;

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| anyhow::anyhow!("missing application state"))?;
    let claims = TokenClaims::validate(token, TokenKind::Access, &state.config)?;
    let member_id = claims.member_id.ok_or(ErrorCode::InvalidToken)?;

    req.extensions_mut().insert(Principal {
        member_id,
        role: claims.role,
    });
    Ok::<_, Error>(next.run(req).await)
}
