use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentWithAuthor {
    pub comment: comment::Model,
    pub author: member::Model,
}

impl Database {
    pub async fn create_comment(
        &self,
        project_id: ProjectId,
        member_id: MemberId,
        content: &str,
    ) -> Result<CommentWithAuthor> {
        self.transaction(|tx| async move {
            project::Entity::find_by_id(project_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundProject)?;
            let author = member::Entity::find_by_id(member_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundMember)?;

            let comment = comment::ActiveModel {
                project_id: ActiveValue::set(project_id),
                member_id: ActiveValue::set(member_id),
                content: ActiveValue::set(content.to_string()),
                created_at: ActiveValue::set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(&*tx)
            .await?;

            Ok(CommentWithAuthor { comment, author })
        })
        .await
    }

    /// Removes a comment. Only its author or an admin may do so.
    pub async fn delete_comment(
        &self,
        comment_id: CommentId,
        member_id: MemberId,
        role: member::Role,
    ) -> Result<()> {
        self.transaction(|tx| async move {
            let comment = comment::Entity::find_by_id(comment_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundComment)?;
            if role != member::Role::Admin && comment.member_id != member_id {
                Err(ErrorCode::NotMatchMemberComment)?;
            }
            comment::Entity::delete_by_id(comment_id).exec(&*tx).await?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn load_comments(
        &self,
        project_id: ProjectId,
        tx: &DatabaseTransaction,
    ) -> Result<Vec<CommentWithAuthor>> {
        Ok(comment::Entity::find()
            .find_also_related(member::Entity)
            .filter(comment::Column::ProjectId.eq(project_id))
            .order_by_asc(comment::Column::Id)
            .all(tx)
            .await?
            .into_iter()
            .filter_map(|(comment, author)| Some(CommentWithAuthor {
                comment,
                author: author?,
            }))
            .collect())
    }
}
