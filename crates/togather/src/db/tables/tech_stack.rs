use crate::db::TechStackId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "tech_stacks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: TechStackId,
    pub name: String,
    pub image: Option<String>,
    pub category: TechCategory,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_tech_stack::Entity")]
    ProjectTechStacks,
    #[sea_orm(has_many = "super::member_tech_stack::Entity")]
    MemberTechStacks,
}

impl Related<super::project_tech_stack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectTechStacks.def()
    }
}

impl Related<super::member_tech_stack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberTechStacks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Eq, PartialEq, Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Default, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechCategory {
    #[sea_orm(string_value = "FRONTEND")]
    Frontend,
    #[sea_orm(string_value = "BACKEND")]
    Backend,
    #[sea_orm(string_value = "MOBILE")]
    Mobile,
    #[sea_orm(string_value = "DEVOPS")]
    Devops,
    #[sea_orm(string_value = "DESIGN")]
    Design,
    #[default]
    #[sea_orm(string_value = "ETC")]
    Etc,
}
