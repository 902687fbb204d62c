use super::*;
use axum::http::StatusCode;
use chrono::NaiveDate;
use member::Role;
use project::ProjectStatus;
use sea_orm::{
    sea_query::{Expr, Func, IntoColumnRef, LikeExpr, Query, SimpleExpr},
    Condition,
};
use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u64 = 10;
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct CreateProjectParams {
    pub title: String,
    pub content: String,
    pub personnel: i32,
    pub offline: bool,
    pub location: Option<Location>,
    pub deadline: Option<NaiveDate>,
    pub tech_stack_ids: Vec<TechStackId>,
}

#[derive(Clone, Debug)]
pub struct UpdateProjectParams {
    pub title: String,
    pub content: String,
    pub personnel: i32,
    pub status: ProjectStatus,
    pub offline: bool,
    pub location: Option<Location>,
    pub deadline: Option<NaiveDate>,
    pub tech_stack_ids: Vec<TechStackId>,
}

/// Search filters for the project list. Absent filters do not constrain the
/// result; present ones are combined with AND.
#[derive(Clone, Debug, Default)]
pub struct ProjectCondition {
    pub author: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ProjectStatus>,
    /// Matches projects seeking any of these tech stacks.
    pub tech_stack_ids: Vec<TechStackId>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
}

#[derive(Clone, Copy, Debug)]
pub struct ProjectDistance {
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectWithTechStacks {
    pub project: project::Model,
    pub author: member::Model,
    pub tech_stacks: Vec<tech_stack::Model>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectDetails {
    pub project: project::Model,
    pub author: member::Model,
    pub tech_stacks: Vec<tech_stack::Model>,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NearbyProject {
    pub project: project::Model,
    pub distance_km: f64,
}

/// The changes needed to turn a project's current tech stacks into the
/// requested set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TechStackDiff {
    /// Join rows whose tech stack is no longer requested.
    pub delete: Vec<ProjectTechStackId>,
    /// Requested tech stacks the project doesn't have yet, in ascending order.
    pub insert: Vec<TechStackId>,
}

pub fn reconcile_tech_stacks(
    existing: &[project_tech_stack::Model],
    requested: &[TechStackId],
) -> TechStackDiff {
    let mut insert = requested.iter().copied().collect::<BTreeSet<_>>();
    let mut delete = Vec::new();
    for row in existing {
        if !insert.remove(&row.tech_stack_id) {
            delete.push(row.id);
        }
    }
    TechStackDiff {
        delete,
        insert: insert.into_iter().collect(),
    }
}

/// Great-circle distance between two points, in kilometers.
pub fn haversine_distance_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let d_lat = (lat_b - lat_a).to_radians();
    let d_lon = (lon_b - lon_a).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat_a.to_radians().cos() * lat_b.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

impl Database {
    pub async fn create_project(
        &self,
        member_id: MemberId,
        params: CreateProjectParams,
    ) -> Result<ProjectWithTechStacks> {
        let params = &params;
        self.transaction(|tx| async move {
            let author = member::Entity::find_by_id(member_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundMember)?;

            let location = params.location.clone().unwrap_or_default();
            let project = project::ActiveModel {
                member_id: ActiveValue::set(author.id),
                title: ActiveValue::set(params.title.clone()),
                content: ActiveValue::set(params.content.clone()),
                personnel: ActiveValue::set(params.personnel),
                status: ActiveValue::set(ProjectStatus::Recruiting),
                offline: ActiveValue::set(params.offline),
                address: ActiveValue::set(location.address),
                latitude: ActiveValue::set(location.latitude),
                longitude: ActiveValue::set(location.longitude),
                deadline: ActiveValue::set(params.deadline),
                created_at: ActiveValue::set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(&*tx)
            .await?;

            project_member::ActiveModel {
                project_id: ActiveValue::set(project.id),
                member_id: ActiveValue::set(author.id),
                ..Default::default()
            }
            .insert(&*tx)
            .await?;

            let tech_stacks = self
                .resolve_tech_stacks(&params.tech_stack_ids, &tx)
                .await?;
            self.insert_project_tech_stacks(project.id, &tech_stacks, &tx)
                .await?;

            tracing::info!(project_id = %project.id, member_id = %member_id, "created project");

            Ok(ProjectWithTechStacks {
                project,
                author,
                tech_stacks,
            })
        })
        .await
    }

    /// Applies the new field values, then adds and removes tech stacks so that
    /// the project seeks exactly the requested set. Tech stacks present both
    /// before and after keep their join rows.
    pub async fn update_project(
        &self,
        project_id: ProjectId,
        member_id: MemberId,
        params: UpdateProjectParams,
    ) -> Result<ProjectWithTechStacks> {
        let params = &params;
        self.transaction(|tx| async move {
            let (project, author) = self.get_project_with_author(project_id, &tx).await?;
            if project.member_id != member_id {
                Err(ErrorCode::NotMatchMemberProject)?;
            }
            if !project.status.can_transition_to(params.status) {
                Err(ErrorCode::InvalidProjectStatus)?;
            }

            let existing = project_tech_stack::Entity::find()
                .filter(project_tech_stack::Column::ProjectId.eq(project_id))
                .order_by_asc(project_tech_stack::Column::Id)
                .all(&*tx)
                .await?;
            let diff = reconcile_tech_stacks(&existing, &params.tech_stack_ids);

            if !diff.delete.is_empty() {
                project_tech_stack::Entity::delete_many()
                    .filter(project_tech_stack::Column::Id.is_in(diff.delete.iter().copied()))
                    .exec(&*tx)
                    .await?;
            }
            if !diff.insert.is_empty() {
                let added = self.resolve_tech_stacks(&diff.insert, &tx).await?;
                self.insert_project_tech_stacks(project_id, &added, &tx)
                    .await?;
            }

            let location = params.location.clone().unwrap_or_default();
            let mut project = project.into_active_model();
            project.title = ActiveValue::set(params.title.clone());
            project.content = ActiveValue::set(params.content.clone());
            project.personnel = ActiveValue::set(params.personnel);
            project.status = ActiveValue::set(params.status);
            project.offline = ActiveValue::set(params.offline);
            project.address = ActiveValue::set(location.address);
            project.latitude = ActiveValue::set(location.latitude);
            project.longitude = ActiveValue::set(location.longitude);
            project.deadline = ActiveValue::set(params.deadline);
            let project = project.update(&*tx).await?;

            tracing::info!(
                project_id = %project_id,
                removed = diff.delete.len(),
                added = diff.insert.len(),
                "updated project"
            );

            let tech_stacks = self
                .load_tech_stacks_for_projects(&[project_id], &tx)
                .await?
                .remove(&project_id)
                .unwrap_or_default();
            Ok(ProjectWithTechStacks {
                project,
                author,
                tech_stacks,
            })
        })
        .await
    }

    pub async fn get_projects(
        &self,
        condition: &ProjectCondition,
    ) -> Result<Vec<ProjectWithTechStacks>> {
        let limit = condition.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = condition
            .page
            .unwrap_or(0)
            .checked_mul(limit)
            .filter(|offset| i64::try_from(*offset).is_ok() && i64::try_from(limit).is_ok())
            .ok_or_else(|| {
                crate::Error::http(
                    StatusCode::BAD_REQUEST,
                    "page is out of range".to_string(),
                )
            })?;

        self.transaction(|tx| async move {
            let mut filter = Condition::all();
            if let Some(author) = non_empty(&condition.author) {
                filter = filter.add(contains_text(
                    (member::Entity, member::Column::Nickname),
                    author,
                ));
            }
            if let Some(title) = non_empty(&condition.title) {
                filter = filter.add(contains_text(
                    (project::Entity, project::Column::Title),
                    title,
                ));
            }
            if let Some(content) = non_empty(&condition.content) {
                filter = filter.add(contains_text(
                    (project::Entity, project::Column::Content),
                    content,
                ));
            }
            if let Some(status) = condition.status {
                filter = filter.add(project::Column::Status.eq(status));
            }
            if !condition.tech_stack_ids.is_empty() {
                filter = filter.add(
                    project::Column::Id.in_subquery(
                        Query::select()
                            .column(project_tech_stack::Column::ProjectId)
                            .from(project_tech_stack::Entity)
                            .and_where(
                                project_tech_stack::Column::TechStackId
                                    .is_in(condition.tech_stack_ids.iter().copied()),
                            )
                            .to_owned(),
                    ),
                );
            }

            let rows = project::Entity::find()
                .find_also_related(member::Entity)
                .filter(filter)
                .order_by_asc(project::Column::Id)
                .offset(offset)
                .limit(limit)
                .all(&*tx)
                .await?;

            self.with_tech_stacks(rows, &tx).await
        })
        .await
    }

    pub async fn get_project_details(&self, project_id: ProjectId) -> Result<ProjectDetails> {
        self.transaction(|tx| async move {
            let (project, author) = self.get_project_with_author(project_id, &tx).await?;
            let tech_stacks = self
                .load_tech_stacks_for_projects(&[project_id], &tx)
                .await?
                .remove(&project_id)
                .unwrap_or_default();
            let comments = self.load_comments(project_id, &tx).await?;
            Ok(ProjectDetails {
                project,
                author,
                tech_stacks,
                comments,
            })
        })
        .await
    }

    /// Deletes a project and everything hanging off it. Only the author or an
    /// admin may do so.
    pub async fn delete_project(
        &self,
        project_id: ProjectId,
        member_id: MemberId,
        role: Role,
    ) -> Result<ProjectWithTechStacks> {
        self.transaction(|tx| async move {
            let (project, author) = self.get_project_with_author(project_id, &tx).await?;
            if role != Role::Admin && project.member_id != member_id {
                Err(ErrorCode::NotMatchMemberProject)?;
            }

            let tech_stacks = self
                .load_tech_stacks_for_projects(&[project_id], &tx)
                .await?
                .remove(&project_id)
                .unwrap_or_default();

            project_tech_stack::Entity::delete_many()
                .filter(project_tech_stack::Column::ProjectId.eq(project_id))
                .exec(&*tx)
                .await?;
            project_member::Entity::delete_many()
                .filter(project_member::Column::ProjectId.eq(project_id))
                .exec(&*tx)
                .await?;
            comment::Entity::delete_many()
                .filter(comment::Column::ProjectId.eq(project_id))
                .exec(&*tx)
                .await?;
            chat_message::Entity::delete_many()
                .filter(
                    chat_message::Column::RoomId.in_subquery(
                        Query::select()
                            .column(chat_room::Column::Id)
                            .from(chat_room::Entity)
                            .and_where(chat_room::Column::ProjectId.eq(project_id))
                            .to_owned(),
                    ),
                )
                .exec(&*tx)
                .await?;
            chat_room::Entity::delete_many()
                .filter(chat_room::Column::ProjectId.eq(project_id))
                .exec(&*tx)
                .await?;
            project::Entity::delete_by_id(project_id).exec(&*tx).await?;

            tracing::info!(project_id = %project_id, member_id = %member_id, ?role, "deleted project");

            Ok(ProjectWithTechStacks {
                project,
                author,
                tech_stacks,
            })
        })
        .await
    }

    /// Returns the projects authored by the given member.
    pub async fn get_member_projects(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<ProjectWithTechStacks>> {
        self.transaction(|tx| async move {
            let rows = project::Entity::find()
                .find_also_related(member::Entity)
                .filter(project::Column::MemberId.eq(member_id))
                .order_by_asc(project::Column::Id)
                .all(&*tx)
                .await?;
            self.with_tech_stacks(rows, &tx).await
        })
        .await
    }

    /// Returns every project the given member has joined, including the ones
    /// they created.
    pub async fn get_participating_projects(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<ProjectSummary>> {
        self.transaction(|tx| async move {
            Ok(project_member::Entity::find()
                .find_also_related(project::Entity)
                .filter(project_member::Column::MemberId.eq(member_id))
                .order_by_asc(project_member::Column::Id)
                .all(&*tx)
                .await?
                .into_iter()
                .filter_map(|(_, project)| {
                    let project = project?;
                    Some(ProjectSummary {
                        id: project.id,
                        title: project.title,
                    })
                })
                .collect())
        })
        .await
    }

    /// Returns the projects located within `distance_km` of the given point,
    /// nearest first. Projects without coordinates are never included.
    pub async fn get_projects_by_distance(
        &self,
        distance: ProjectDistance,
    ) -> Result<Vec<NearbyProject>> {
        self.transaction(|tx| async move {
            let latitude_delta = (distance.distance_km / EARTH_RADIUS_KM).to_degrees();
            let candidates = project::Entity::find()
                .filter(
                    project::Column::Latitude
                        .between(
                            distance.latitude - latitude_delta,
                            distance.latitude + latitude_delta,
                        )
                        .and(project::Column::Longitude.is_not_null()),
                )
                .order_by_asc(project::Column::Id)
                .all(&*tx)
                .await?;

            let mut nearby = candidates
                .into_iter()
                .filter_map(|project| {
                    let distance_km = haversine_distance_km(
                        distance.latitude,
                        distance.longitude,
                        project.latitude?,
                        project.longitude?,
                    );
                    (distance_km <= distance.distance_km).then_some(NearbyProject {
                        project,
                        distance_km,
                    })
                })
                .collect::<Vec<_>>();
            nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
            Ok(nearby)
        })
        .await
    }

    /// Adds the member to a recruiting project that still has open positions.
    pub async fn join_project(&self, project_id: ProjectId, member_id: MemberId) -> Result<()> {
        self.transaction(|tx| async move {
            let project = project::Entity::find_by_id(project_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundProject)?;
            member::Entity::find_by_id(member_id)
                .one(&*tx)
                .await?
                .ok_or(ErrorCode::NotFoundMember)?;

            if project.status != ProjectStatus::Recruiting {
                Err(ErrorCode::ProjectNotRecruiting)?;
            }
            if self.is_participant(project_id, member_id, &tx).await? {
                Err(ErrorCode::AlreadyJoinedProject)?;
            }
            let participants = project_member::Entity::find()
                .filter(project_member::Column::ProjectId.eq(project_id))
                .count(&*tx)
                .await?;
            if participants >= project.personnel.max(0) as u64 {
                Err(ErrorCode::ProjectFull)?;
            }

            project_member::ActiveModel {
                project_id: ActiveValue::set(project_id),
                member_id: ActiveValue::set(member_id),
                ..Default::default()
            }
            .insert(&*tx)
            .await?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn is_participant(
        &self,
        project_id: ProjectId,
        member_id: MemberId,
        tx: &DatabaseTransaction,
    ) -> Result<bool> {
        Ok(project_member::Entity::find()
            .filter(
                project_member::Column::ProjectId
                    .eq(project_id)
                    .and(project_member::Column::MemberId.eq(member_id)),
            )
            .one(tx)
            .await?
            .is_some())
    }

    async fn get_project_with_author(
        &self,
        project_id: ProjectId,
        tx: &DatabaseTransaction,
    ) -> Result<(project::Model, member::Model)> {
        let (project, author) = project::Entity::find_by_id(project_id)
            .find_also_related(member::Entity)
            .one(tx)
            .await?
            .ok_or(ErrorCode::NotFoundProject)?;
        let author = author.ok_or(ErrorCode::NotFoundMember)?;
        Ok((project, author))
    }

    async fn insert_project_tech_stacks(
        &self,
        project_id: ProjectId,
        tech_stacks: &[tech_stack::Model],
        tx: &DatabaseTransaction,
    ) -> Result<()> {
        if tech_stacks.is_empty() {
            return Ok(());
        }

        project_tech_stack::Entity::insert_many(tech_stacks.iter().map(|tech_stack| {
            project_tech_stack::ActiveModel {
                project_id: ActiveValue::set(project_id),
                tech_stack_id: ActiveValue::set(tech_stack.id),
                ..Default::default()
            }
        }))
        .exec(tx)
        .await?;
        Ok(())
    }

    /// Loads the tech stacks of several projects at once, in the order they
    /// were attached.
    async fn load_tech_stacks_for_projects(
        &self,
        project_ids: &[ProjectId],
        tx: &DatabaseTransaction,
    ) -> Result<HashMap<ProjectId, Vec<tech_stack::Model>>> {
        let mut tech_stacks_by_project: HashMap<ProjectId, Vec<tech_stack::Model>> =
            HashMap::default();
        if project_ids.is_empty() {
            return Ok(tech_stacks_by_project);
        }

        let rows = project_tech_stack::Entity::find()
            .find_also_related(tech_stack::Entity)
            .filter(project_tech_stack::Column::ProjectId.is_in(project_ids.iter().copied()))
            .order_by_asc(project_tech_stack::Column::Id)
            .all(tx)
            .await?;
        for (row, tech_stack) in rows {
            if let Some(tech_stack) = tech_stack {
                tech_stacks_by_project
                    .entry(row.project_id)
                    .or_default()
                    .push(tech_stack);
            }
        }
        Ok(tech_stacks_by_project)
    }

    async fn with_tech_stacks(
        &self,
        rows: Vec<(project::Model, Option<member::Model>)>,
        tx: &DatabaseTransaction,
    ) -> Result<Vec<ProjectWithTechStacks>> {
        let project_ids = rows.iter().map(|(project, _)| project.id).collect::<Vec<_>>();
        let mut tech_stacks = self.load_tech_stacks_for_projects(&project_ids, tx).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(project, author)| {
                Some(ProjectWithTechStacks {
                    tech_stacks: tech_stacks.remove(&project.id).unwrap_or_default(),
                    author: author?,
                    project,
                })
            })
            .collect())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Case-insensitive literal substring match. `%`, `_` and `\` in the needle
/// match themselves.
fn contains_text(column: impl IntoColumnRef, needle: &str) -> SimpleExpr {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}
