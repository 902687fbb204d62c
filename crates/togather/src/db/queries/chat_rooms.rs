use super::*;

#[derive(Clone, Debug)]
pub struct CreateChatRoomParams {
    pub project_id: ProjectId,
    pub member_id: MemberId,
    pub room_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessageWithSender {
    pub message: chat_message::Model,
    pub sender: member::Model,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRoomDetails {
    pub room: chat_room::Model,
    pub messages: Vec<ChatMessageWithSender>,
}

impl Database {
    pub async fn create_chat_room(&self, params: CreateChatRoomParams) -> Result<chat_room::Model> {
        let params = &params;
        self.transaction(|tx| async move {
            self.check_participant(params.project_id, params.member_id, &tx)
                .await?;
            let room = chat_room::ActiveModel {
                project_id: ActiveValue::set(params.project_id),
                name: ActiveValue::set(params.room_name.clone()),
                created_at: ActiveValue::set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(&*tx)
            .await?;
            tracing::info!(project_id = %params.project_id, room_id = %room.id, "created chat room");
            Ok(room)
        })
        .await
    }

    pub async fn get_chat_rooms(
        &self,
        project_id: ProjectId,
        member_id: MemberId,
    ) -> Result<Vec<chat_room::Model>> {
        self.transaction(|tx| async move {
            self.check_participant(project_id, member_id, &tx).await?;
            Ok(chat_room::Entity::find()
                .filter(chat_room::Column::ProjectId.eq(project_id))
                .order_by_asc(chat_room::Column::Id)
                .all(&*tx)
                .await?)
        })
        .await
    }

    /// Returns a room of the project along with its messages in the order
    /// they were sent.
    pub async fn get_chat_room(
        &self,
        project_id: ProjectId,
        room_id: ChatRoomId,
        member_id: MemberId,
    ) -> Result<ChatRoomDetails> {
        self.transaction(|tx| async move {
            self.check_participant(project_id, member_id, &tx).await?;
            let room = self.find_room(project_id, room_id, &tx).await?;
            let messages = chat_message::Entity::find()
                .find_also_related(member::Entity)
                .filter(chat_message::Column::RoomId.eq(room.id))
                .order_by_asc(chat_message::Column::Id)
                .all(&*tx)
                .await?
                .into_iter()
                .filter_map(|(message, sender)| {
                    Some(ChatMessageWithSender {
                        message,
                        sender: sender?,
                    })
                })
                .collect();
            Ok(ChatRoomDetails { room, messages })
        })
        .await
    }

    pub async fn send_chat_message(
        &self,
        project_id: ProjectId,
        room_id: ChatRoomId,
        member_id: MemberId,
        message: &str,
    ) -> Result<ChatMessageWithSender> {
        self.transaction(|tx| async move {
            self.check_participant(project_id, member_id, &tx).await?;
            let room = self.find_room(project_id, room_id, &tx).await?;
            let sender = member::Entity::find_by_id(member_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundMember)?;
            let message = chat_message::ActiveModel {
                room_id: ActiveValue::set(room.id),
                member_id: ActiveValue::set(member_id),
                message: ActiveValue::set(message.to_string()),
                sent_at: ActiveValue::set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(&*tx)
            .await?;
            Ok(ChatMessageWithSender { message, sender })
        })
        .await
    }

    async fn check_participant(
        &self,
        project_id: ProjectId,
        member_id: MemberId,
        tx: &DatabaseTransaction,
    ) -> Result<()> {
        project::Entity::find_by_id(project_id)
            .one(tx)
            .await?
            .ok_or(ErrorCode::NotFoundProject)?;
        if !self.is_participant(project_id, member_id, tx).await? {
            Err(ErrorCode::NotProjectMember)?;
        }
        Ok(())
    }

    async fn find_room(
        &self,
        project_id: ProjectId,
        room_id: ChatRoomId,
        tx: &DatabaseTransaction,
    ) -> Result<chat_room::Model> {
        Ok(chat_room::Entity::find_by_id(room_id)
            .filter(chat_room::Column::ProjectId.eq(project_id))
            .one(tx)
            .await?
            .ok_or(ErrorCode::NotFoundChatRoom)?)
    }
}
