use crate::{
    auth::Principal,
    db::{
        chat_room, ChatMessageId, ChatMessageWithSender, ChatRoomDetails, ChatRoomId,
        CreateChatRoomParams, MemberId, ProjectId,
    },
    AppState, Result,
};
use axum::{extract::Path, Extension, Json};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRoomRequest {
    pub room_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomResponse {
    pub room_id: ChatRoomId,
    pub room_name: String,
}

impl From<chat_room::Model> for ChatRoomResponse {
    fn from(room: chat_room::Model) -> Self {
        Self {
            room_id: room.id,
            room_name: room.name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomsResponse {
    pub chat_room_dtos: Vec<ChatRoomResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub message_id: ChatMessageId,
    pub member_id: MemberId,
    pub nickname: String,
    pub message: String,
    pub sent_at: NaiveDateTime,
}

impl From<ChatMessageWithSender> for ChatMessageResponse {
    fn from(row: ChatMessageWithSender) -> Self {
        Self {
            message_id: row.message.id,
            member_id: row.message.member_id,
            nickname: row.sender.nickname,
            message: row.message.message,
            sent_at: row.message.sent_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomDetailsResponse {
    pub room_id: ChatRoomId,
    pub room_name: String,
    pub messages: Vec<ChatMessageResponse>,
}

impl From<ChatRoomDetails> for ChatRoomDetailsResponse {
    fn from(details: ChatRoomDetails) -> Self {
        Self {
            room_id: details.room.id,
            room_name: details.room.name,
            messages: details.messages.into_iter().map(Into::into).collect(),
        }
    }
}

#[instrument(skip(app))]
pub async fn create_chat_room(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<CreateChatRoomRequest>,
) -> Result<Json<ChatRoomResponse>> {
    let room = app
        .db
        .create_chat_room(CreateChatRoomParams {
            project_id,
            member_id: principal.member_id,
            room_name: request.room_name,
        })
        .await?;
    Ok(Json(room.into()))
}

pub async fn list_chat_rooms(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ChatRoomsResponse>> {
    let rooms = app
        .db
        .get_chat_rooms(project_id, principal.member_id)
        .await?;
    Ok(Json(ChatRoomsResponse {
        chat_room_dtos: rooms.into_iter().map(Into::into).collect(),
    }))
}

pub async fn get_chat_room(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((project_id, room_id)): Path<(ProjectId, ChatRoomId)>,
) -> Result<Json<ChatRoomDetailsResponse>> {
    let details = app
        .db
        .get_chat_room(project_id, room_id, principal.member_id)
        .await?;
    Ok(Json(details.into()))
}

#[instrument(skip(app, request))]
pub async fn send_chat_message(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((project_id, room_id)): Path<(ProjectId, ChatRoomId)>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatMessageResponse>> {
    let message = app
        .db
        .send_chat_message(project_id, room_id, principal.member_id, &request.message)
        .await?;
    Ok(Json(message.into()))
}
