pub mod auth;
pub mod chats;
pub mod images;
pub mod members;
pub mod projects;
pub mod tech_stacks;

#[cfg(test)]
mod tests;

use crate::{
    auth::validate_access_token,
    db::{member, tech_stack, MemberId},
    AppState,
};
use axum::{
    body::Body,
    middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;

pub fn routes(state: Arc<AppState>) -> Router<(), Body> {
    let public = Router::new()
        .route("/auth/login/:provider", post(auth::login))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/refresh", post(auth::refresh))
        .route("/projects", get(projects::list_projects))
        .route("/projects/map", get(projects::list_projects_by_distance))
        .route("/projects/:id", get(projects::get_project))
        .route("/tech-stacks", get(tech_stacks::list_tech_stacks));

    let protected = Router::new()
        .route("/projects", post(projects::create_project))
        .route(
            "/projects/:id",
            put(projects::update_project).delete(projects::delete_project),
        )
        .route("/projects/mine", get(projects::list_my_projects))
        .route(
            "/projects/participating",
            get(projects::list_participating_projects),
        )
        .route("/projects/:id/members", post(projects::join_project))
        .route("/projects/:id/comments", post(projects::create_comment))
        .route(
            "/projects/:id/comments/:comment_id",
            delete(projects::delete_comment),
        )
        .route(
            "/projects/:id/chats",
            post(chats::create_chat_room).get(chats::list_chat_rooms),
        )
        .route("/projects/:id/chats/:room_id", get(chats::get_chat_room))
        .route(
            "/projects/:id/chats/:room_id/messages",
            post(chats::send_chat_message),
        )
        .route("/images", post(images::upload_image))
        .route("/members/me", get(members::get_me))
        .layer(middleware::from_fn(validate_access_token));

    public
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(state)))
}

/// How a member appears next to the things they wrote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: MemberId,
    pub nickname: String,
    pub profile_image: Option<String>,
}

impl From<member::Model> for MemberSummary {
    fn from(member: member::Model) -> Self {
        Self {
            id: member.id,
            nickname: member.nickname,
            profile_image: member.profile_image,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: MemberId,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub status: member::MemberStatus,
    pub role: member::Role,
    pub provider_type: member::ProviderType,
    pub tech_stacks: Vec<tech_stack::Model>,
}

impl From<crate::db::MemberProfile> for MemberResponse {
    fn from(profile: crate::db::MemberProfile) -> Self {
        let member = profile.member;
        Self {
            id: member.id,
            email: member.email,
            nickname: member.nickname,
            profile_image: member.profile_image,
            status: member.status,
            role: member.role,
            provider_type: member.provider_type,
            tech_stacks: profile.tech_stacks,
        }
    }
}
