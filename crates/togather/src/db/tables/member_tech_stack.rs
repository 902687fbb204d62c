use crate::db::{MemberId, MemberTechStackId, TechStackId};
use sea_orm::entity::prelude::*;

/// A technology a member knows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "member_tech_stacks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: MemberTechStackId,
    pub member_id: MemberId,
    pub tech_stack_id: TechStackId,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
    #[sea_orm(
        belongs_to = "super::tech_stack::Entity",
        from = "Column::TechStackId",
        to = "super::tech_stack::Column::Id"
    )]
    TechStack,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::tech_stack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TechStack.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
