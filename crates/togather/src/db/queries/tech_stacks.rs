use super::*;
use sea_orm::sea_query::OnConflict;

impl Database {
    pub async fn create_tech_stack(
        &self,
        name: &str,
        image: Option<&str>,
        category: tech_stack::TechCategory,
    ) -> Result<tech_stack::Model> {
        self.transaction(|tx| async move {
            Ok(tech_stack::ActiveModel {
                name: ActiveValue::set(name.to_string()),
                image: ActiveValue::set(image.map(str::to_string)),
                category: ActiveValue::set(category),
                ..Default::default()
            }
            .insert(&*tx)
            .await?)
        })
        .await
    }

    /// Inserts the given tech stacks, refreshing the image and category of
    /// any that already exist under the same name.
    pub async fn upsert_tech_stacks(
        &self,
        tech_stacks: &[(String, Option<String>, tech_stack::TechCategory)],
    ) -> Result<()> {
        if tech_stacks.is_empty() {
            return Ok(());
        }

        self.transaction(|tx| async move {
            tech_stack::Entity::insert_many(tech_stacks.iter().map(|(name, image, category)| {
                tech_stack::ActiveModel {
                    name: ActiveValue::set(name.clone()),
                    image: ActiveValue::set(image.clone()),
                    category: ActiveValue::set(*category),
                    ..Default::default()
                }
            }))
            .on_conflict(
                OnConflict::column(tech_stack::Column::Name)
                    .update_columns([tech_stack::Column::Image, tech_stack::Column::Category])
                    .to_owned(),
            )
            .exec_without_returning(&*tx)
            .await?;
            Ok(())
        })
        .await
    }

    pub async fn get_tech_stacks(&self) -> Result<Vec<tech_stack::Model>> {
        self.transaction(|tx| async move {
            Ok(tech_stack::Entity::find()
                .order_by_asc(tech_stack::Column::Id)
                .all(&*tx)
                .await?)
        })
        .await
    }

    /// Loads every requested tech stack, failing if any id is unknown.
    /// Duplicate ids are collapsed; the result is ordered by id.
    pub(crate) async fn resolve_tech_stacks(
        &self,
        tech_stack_ids: &[TechStackId],
        tx: &DatabaseTransaction,
    ) -> Result<Vec<tech_stack::Model>> {
        let requested = tech_stack_ids.iter().copied().collect::<BTreeSet<_>>();
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let tech_stacks = tech_stack::Entity::find()
            .filter(tech_stack::Column::Id.is_in(requested.iter().copied()))
            .order_by_asc(tech_stack::Column::Id)
            .all(tx)
            .await?;
        if tech_stacks.len() != requested.len() {
            Err(ErrorCode::NotFoundTechStack)?;
        }

        Ok(tech_stacks)
    }
}
