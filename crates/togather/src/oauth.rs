use crate::{
    auth::{TokenClaims, TokenKind, TokenPair},
    db::{member, Database, MemberProfile, NewMemberParams, TechStackId},
    Config, Error, ErrorCode, Result,
};
use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use axum::http::StatusCode;
use member::ProviderType;
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};

/// Exchanges an OAuth authorization code for the email of the account that
/// granted it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    async fn fetch_email(&self, code: &str) -> anyhow::Result<String>;
}

#[derive(Clone, Default)]
pub struct IdentityProviders {
    providers: HashMap<ProviderType, Arc<dyn IdentityProvider>>,
}

impl IdentityProviders {
    /// Registers every provider whose client credentials are configured.
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        let mut this = Self::default();
        if let (Some(client_id), Some(client_secret)) = (
            config.github_client_id.clone(),
            config.github_client_secret.clone(),
        ) {
            this.insert(Arc::new(GithubIdentityProvider {
                http: http.clone(),
                client_id,
                client_secret,
            }));
        }
        if let (Some(client_id), Some(client_secret), Some(redirect_uri)) = (
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_redirect_uri.clone(),
        ) {
            this.insert(Arc::new(GoogleIdentityProvider {
                http,
                client_id,
                client_secret,
                redirect_uri,
            }));
        }
        this
    }

    pub fn insert(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.providers.insert(provider.provider_type(), provider);
    }

    pub fn get(&self, provider_type: ProviderType) -> Result<&Arc<dyn IdentityProvider>> {
        Ok(self
            .providers
            .get(&provider_type)
            .ok_or(ErrorCode::UnsupportedProvider)?)
    }
}

pub struct GithubIdentityProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

#[async_trait]
impl IdentityProvider for GithubIdentityProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Github
    }

    async fn fetch_email(&self, code: &str) -> anyhow::Result<String> {
        let token = self
            .http
            .post("https://github.com/login/oauth/access_token")
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<AccessTokenResponse>()
            .await
            .context("failed to exchange github authorization code")?;

        let emails = self
            .http
            .get("https://api.github.com/user/emails")
            .bearer_auth(&token.access_token)
            .header(reqwest::header::USER_AGENT, "togather")
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<GithubEmail>>()
            .await
            .context("failed to fetch github emails")?;

        emails
            .into_iter()
            .find(|email| email.primary && email.verified)
            .map(|email| email.email)
            .ok_or_else(|| anyhow!("github account has no verified primary email"))
    }
}

pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    email: String,
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Google
    }

    async fn fetch_email(&self, code: &str) -> anyhow::Result<String> {
        let token = self
            .http
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<AccessTokenResponse>()
            .await
            .context("failed to exchange google authorization code")?;

        let user = self
            .http
            .get("https://www.googleapis.com/oauth2/v2/userinfo")
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<GoogleUserInfo>()
            .await
            .context("failed to fetch google user info")?;
        Ok(user.email)
    }
}

#[derive(Debug)]
pub enum LoginOutcome {
    Member {
        member: member::Model,
        tokens: TokenPair,
    },
    /// No member owns this email yet; the token lets the client finish
    /// signing up.
    SignUp { email: String, sign_up_token: String },
}

pub async fn login(
    db: &Database,
    providers: &IdentityProviders,
    config: &Config,
    provider_type: ProviderType,
    code: &str,
) -> Result<LoginOutcome> {
    let provider = providers.get(provider_type)?;
    let email = provider.fetch_email(code).await.map_err(|error| {
        log::warn!("{provider_type} login failed: {error:#}");
        Error::http(
            StatusCode::UNAUTHORIZED,
            format!("{provider_type} login failed"),
        )
    })?;

    match db.get_member_by_email(&email).await? {
        Some(member) => {
            let tokens = TokenPair::issue(&member, config)?;
            tracing::info!(member_id = %member.id, %provider_type, "member logged in");
            Ok(LoginOutcome::Member { member, tokens })
        }
        None => {
            let sign_up_token =
                TokenClaims::for_sign_up(&email, provider_type, config).encode(config)?;
            Ok(LoginOutcome::SignUp {
                email,
                sign_up_token,
            })
        }
    }
}

#[derive(Clone, Debug)]
pub struct SignUpParams {
    pub sign_up_token: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub tech_stack_ids: Vec<TechStackId>,
}

#[derive(Debug)]
pub struct SignUpOutcome {
    pub profile: MemberProfile,
    pub tokens: TokenPair,
}

/// Completes sign-up for an email verified by a provider.
pub async fn sign_up(db: &Database, config: &Config, params: SignUpParams) -> Result<SignUpOutcome> {
    let claims = TokenClaims::validate(&params.sign_up_token, TokenKind::SignUp, config)?;
    let (Some(email), Some(provider_type)) = (claims.email, claims.provider_type) else {
        return Err(ErrorCode::InvalidToken.into());
    };

    let profile = db
        .create_member(NewMemberParams {
            email,
            nickname: params.nickname,
            profile_image: params.profile_image,
            provider_type,
            tech_stack_ids: params.tech_stack_ids,
        })
        .await?;
    let tokens = TokenPair::issue(&profile.member, config)?;
    tracing::info!(member_id = %profile.member.id, "member signed up");
    Ok(SignUpOutcome { profile, tokens })
}

pub async fn refresh(db: &Database, config: &Config, refresh_token: &str) -> Result<TokenPair> {
    let claims = TokenClaims::validate(refresh_token, TokenKind::Refresh, config)?;
    let member_id = claims.member_id.ok_or(ErrorCode::InvalidToken)?;
    let profile = db.get_member(member_id).await?;
    TokenPair::issue(&profile.member, config)
}
