use super::*;
use member::{MemberStatus, ProviderType, Role};

#[derive(Debug, Clone)]
pub struct NewMemberParams {
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub provider_type: ProviderType,
    pub tech_stack_ids: Vec<TechStackId>,
}

/// A member together with the tech stacks they know.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberProfile {
    pub member: member::Model,
    pub tech_stacks: Vec<tech_stack::Model>,
}

impl Database {
    /// Registers a member who completed sign-up, along with their skills.
    pub async fn create_member(&self, params: NewMemberParams) -> Result<MemberProfile> {
        let params = &params;
        self.transaction(|tx| async move {
            if self.nickname_exists(&params.nickname, &tx).await? {
                Err(ErrorCode::ExistTrueMemberNickname)?;
            }
            let email_taken = member::Entity::find()
                .filter(member::Column::Email.eq(params.email.as_str()))
                .one(&*tx)
                .await?
                .is_some();
            if email_taken {
                Err(ErrorCode::ExistTrueMemberEmail)?;
            }

            let member = member::ActiveModel {
                email: ActiveValue::set(params.email.clone()),
                nickname: ActiveValue::set(params.nickname.clone()),
                profile_image: ActiveValue::set(params.profile_image.clone()),
                status: ActiveValue::set(MemberStatus::Permitted),
                role: ActiveValue::set(Role::User),
                provider_type: ActiveValue::set(params.provider_type),
                created_at: ActiveValue::set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(&*tx)
            .await?;

            let tech_stacks = self
                .resolve_tech_stacks(&params.tech_stack_ids, &tx)
                .await?;
            if !tech_stacks.is_empty() {
                member_tech_stack::Entity::insert_many(tech_stacks.iter().map(|tech_stack| {
                    member_tech_stack::ActiveModel {
                        member_id: ActiveValue::set(member.id),
                        tech_stack_id: ActiveValue::set(tech_stack.id),
                        ..Default::default()
                    }
                }))
                .exec(&*tx)
                .await?;
            }

            Ok(MemberProfile {
                member,
                tech_stacks,
            })
        })
        .await
    }

    pub async fn is_nickname_taken(&self, nickname: &str) -> Result<bool> {
        self.transaction(|tx| async move { self.nickname_exists(nickname, &tx).await })
            .await
    }

    async fn nickname_exists(&self, nickname: &str, tx: &DatabaseTransaction) -> Result<bool> {
        Ok(member::Entity::find()
            .filter(member::Column::Nickname.eq(nickname))
            .one(tx)
            .await?
            .is_some())
    }

    pub async fn get_member(&self, member_id: MemberId) -> Result<MemberProfile> {
        self.transaction(|tx| async move {
            let member = member::Entity::find_by_id(member_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundMember)?;
            let tech_stacks = member_tech_stack::Entity::find()
                .filter(member_tech_stack::Column::MemberId.eq(member_id))
                .find_also_related(tech_stack::Entity)
                .order_by_asc(member_tech_stack::Column::Id)
                .all(&*tx)
                .await?
                .into_iter()
                .filter_map(|(_, tech_stack)| tech_stack)
                .collect();
            Ok(MemberProfile {
                member,
                tech_stacks,
            })
        })
        .await
    }

    pub async fn get_member_by_email(&self, email: &str) -> Result<Option<member::Model>> {
        self.transaction(|tx| async move {
            Ok(member::Entity::find()
                .filter(member::Column::Email.eq(email))
                .one(&*tx)
                .await?)
        })
        .await
    }
}
