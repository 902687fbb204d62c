use crate::db::{MemberId, ProjectId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: ProjectId,
    pub member_id: MemberId,
    pub title: String,
    pub content: String,
    pub personnel: i32,
    pub status: ProjectStatus,
    pub offline: bool,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub deadline: Option<Date>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Author,
    #[sea_orm(has_many = "super::project_tech_stack::Entity")]
    TechStacks,
    #[sea_orm(has_many = "super::project_member::Entity")]
    Members,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::chat_room::Entity")]
    ChatRooms,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::project_tech_stack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TechStacks.def()
    }
}

impl Related<super::project_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::chat_room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatRooms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Eq, PartialEq, Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Default, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    #[sea_orm(string_value = "RECRUITING")]
    Recruiting,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

impl ProjectStatus {
    /// Recruitment can be closed, but a completed project never reopens.
    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        !matches!(
            (self, next),
            (ProjectStatus::Completed, ProjectStatus::Recruiting)
        )
    }
}
