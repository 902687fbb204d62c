use crate::db::{ProjectId, ProjectTechStackId, TechStackId};
use sea_orm::entity::prelude::*;

/// A technology a project is recruiting for.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "project_tech_stacks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: ProjectTechStackId,
    pub project_id: ProjectId,
    pub tech_stack_id: TechStackId,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::tech_stack::Entity",
        from = "Column::TechStackId",
        to = "super::tech_stack::Column::Id"
    )]
    TechStack,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::tech_stack::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TechStack.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
