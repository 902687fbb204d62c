use crate::db::MemberId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: MemberId,
    pub email: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub status: MemberStatus,
    pub role: Role,
    pub provider_type: ProviderType,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project::Entity")]
    Projects,
    #[sea_orm(has_many = "super::project_member::Entity")]
    Participations,
    #[sea_orm(has_many = "super::member_tech_stack::Entity")]
    Skills,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::project_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participations.def()
    }
}

impl Related<super::member_tech_stack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Skills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Members start out pending and become permitted once sign-up completes.
#[derive(
    Eq, PartialEq, Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Default, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PERMITTED")]
    Permitted,
}

#[derive(
    Eq, PartialEq, Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Default, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "ROLE_USER")]
    #[serde(rename = "ROLE_USER")]
    User,
    #[sea_orm(string_value = "ROLE_ADMIN")]
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

/// The identity provider a member signed up through.
#[derive(
    Eq,
    PartialEq,
    Copy,
    Clone,
    Debug,
    EnumIter,
    DeriveActiveEnum,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ProviderType {
    #[sea_orm(string_value = "GOOGLE")]
    Google,
    #[sea_orm(string_value = "GITHUB")]
    Github,
}
