use super::MemberSummary;
use crate::{
    auth::Principal,
    db::{
        project::ProjectStatus, tech_stack, CommentId, CommentWithAuthor, CreateProjectParams,
        Location, NearbyProject, ProjectCondition, ProjectDetails, ProjectDistance,
        ProjectId, ProjectSummary, ProjectWithTechStacks, TechStackId, UpdateProjectParams,
    },
    AppState, Error, Result,
};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: ProjectId,
    pub title: String,
    pub content: String,
    pub personnel: i32,
    pub status: ProjectStatus,
    pub offline: bool,
    pub location: Location,
    pub deadline: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub author: MemberSummary,
    pub tech_stacks: Vec<tech_stack::Model>,
}

impl From<ProjectWithTechStacks> for ProjectResponse {
    fn from(row: ProjectWithTechStacks) -> Self {
        let project = row.project;
        Self {
            id: project.id,
            title: project.title,
            content: project.content,
            personnel: project.personnel,
            status: project.status,
            offline: project.offline,
            location: Location {
                address: project.address,
                latitude: project.latitude,
                longitude: project.longitude,
            },
            deadline: project.deadline,
            created_at: project.created_at,
            author: row.author.into(),
            tech_stacks: row.tech_stacks,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: CommentId,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub author: MemberSummary,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(row: CommentWithAuthor) -> Self {
        Self {
            id: row.comment.id,
            content: row.comment.content,
            created_at: row.comment.created_at,
            author: row.author.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailsResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub comments: Vec<CommentResponse>,
}

impl From<ProjectDetails> for ProjectDetailsResponse {
    fn from(details: ProjectDetails) -> Self {
        Self {
            project: ProjectWithTechStacks {
                project: details.project,
                author: details.author,
                tech_stacks: details.tech_stacks,
            }
            .into(),
            comments: details.comments.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryResponse {
    pub id: ProjectId,
    pub title: String,
}

impl From<ProjectSummary> for ProjectSummaryResponse {
    fn from(summary: ProjectSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyProjectResponse {
    pub id: ProjectId,
    pub title: String,
    pub status: ProjectStatus,
    pub location: Location,
    pub distance_km: f64,
}

impl From<NearbyProject> for NearbyProjectResponse {
    fn from(nearby: NearbyProject) -> Self {
        let project = nearby.project;
        Self {
            id: project.id,
            title: project.title,
            status: project.status,
            location: Location {
                address: project.address,
                latitude: project.latitude,
                longitude: project.longitude,
            },
            distance_km: nearby.distance_km,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    pub content: String,
    pub personnel: i32,
    #[serde(default)]
    pub offline: bool,
    pub location: Option<Location>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub tech_stack_ids: Vec<TechStackId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: String,
    pub content: String,
    pub personnel: i32,
    pub status: ProjectStatus,
    #[serde(default)]
    pub offline: bool,
    pub location: Option<Location>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub tech_stack_ids: Vec<TechStackId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsParams {
    pub author: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ProjectStatus>,
    /// Comma separated tech stack ids, e.g. `1,3`.
    pub tech_stack_ids: Option<String>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
}

impl ListProjectsParams {
    fn into_condition(self) -> Result<ProjectCondition> {
        let tech_stack_ids = self
            .tech_stack_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<TechStackId>().map_err(|_| {
                    Error::http(
                        StatusCode::BAD_REQUEST,
                        format!("invalid tech stack id {id:?}"),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ProjectCondition {
            author: self.author,
            title: self.title,
            content: self.content,
            status: self.status,
            tech_stack_ids,
            limit: self.limit,
            page: self.page,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceParams {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in kilometers.
    pub distance: f64,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[instrument(skip(app))]
pub async fn create_project(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    let project = app
        .db
        .create_project(
            principal.member_id,
            CreateProjectParams {
                title: request.title,
                content: request.content,
                personnel: request.personnel,
                offline: request.offline,
                location: request.location,
                deadline: request.deadline,
                tech_stack_ids: request.tech_stack_ids,
            },
        )
        .await?;
    Ok(Json(project.into()))
}

#[instrument(skip(app))]
pub async fn update_project(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    let project = app
        .db
        .update_project(
            project_id,
            principal.member_id,
            UpdateProjectParams {
                title: request.title,
                content: request.content,
                personnel: request.personnel,
                status: request.status,
                offline: request.offline,
                location: request.location,
                deadline: request.deadline,
                tech_stack_ids: request.tech_stack_ids,
            },
        )
        .await?;
    Ok(Json(project.into()))
}

#[instrument(skip(app))]
pub async fn list_projects(
    Extension(app): Extension<Arc<AppState>>,
    Query(params): Query<ListProjectsParams>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let condition = params.into_condition()?;
    let projects = app.db.get_projects(&condition).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

pub async fn get_project(
    Extension(app): Extension<Arc<AppState>>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ProjectDetailsResponse>> {
    let details = app.db.get_project_details(project_id).await?;
    Ok(Json(details.into()))
}

#[instrument(skip(app))]
pub async fn delete_project(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ProjectResponse>> {
    let project = app
        .db
        .delete_project(project_id, principal.member_id, principal.role)
        .await?;
    Ok(Json(project.into()))
}

pub async fn list_my_projects(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let projects = app.db.get_member_projects(principal.member_id).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

pub async fn list_participating_projects(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ProjectSummaryResponse>>> {
    let projects = app
        .db
        .get_participating_projects(principal.member_id)
        .await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

#[instrument(skip(app))]
pub async fn list_projects_by_distance(
    Extension(app): Extension<Arc<AppState>>,
    Query(params): Query<DistanceParams>,
) -> Result<Json<Vec<NearbyProjectResponse>>> {
    if !(params.distance.is_finite() && params.distance >= 0.0) {
        return Err(Error::http(
            StatusCode::BAD_REQUEST,
            "distance must be a non-negative number".to_string(),
        ));
    }

    let projects = app
        .db
        .get_projects_by_distance(ProjectDistance {
            latitude: params.latitude,
            longitude: params.longitude,
            distance_km: params.distance,
        })
        .await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

#[instrument(skip(app))]
pub async fn join_project(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ProjectId>,
) -> Result<()> {
    app.db.join_project(project_id, principal.member_id).await
}

pub async fn create_comment(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<CommentResponse>> {
    let comment = app
        .db
        .create_comment(project_id, principal.member_id, &request.content)
        .await?;
    Ok(Json(comment.into()))
}

pub async fn delete_comment(
    Extension(app): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((_project_id, comment_id)): Path<(ProjectId, CommentId)>,
) -> Result<()> {
    app.db
        .delete_comment(comment_id, principal.member_id, principal.role)
        .await
}

