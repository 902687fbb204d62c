use super::*;
use crate::{db::project::ProjectStatus, Error};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;

/// Three authors, five tech stacks and four projects:
///
/// | id | author    | status     | tech stacks           |
/// |----|-----------|------------|-----------------------|
/// | 1  | aaaa name | RECRUITING | react, spring, nodejs |
/// | 2  | bbbb name | RECRUITING | react, spring, nodejs |
/// | 3  | cccc name | COMPLETED  | php, react            |
/// | 4  | aaaa name | COMPLETED  | php, angular          |
async fn seed(db: &Database) -> Vec<TechStackId> {
    let a = new_test_member(db, "aaaa name").await;
    let b = new_test_member(db, "bbbb name").await;
    let c = new_test_member(db, "cccc name").await;

    let tech = new_test_tech_stacks(db, &["react", "angular", "spring", "nodejs", "php"]).await;
    let (react, angular, spring, nodejs, php) = (tech[0], tech[1], tech[2], tech[3], tech[4]);

    let projects = [
        (a, "aaaa", vec![react, spring, nodejs]),
        (b, "bbbb", vec![react, spring, nodejs]),
        (c, "cccc", vec![php, react]),
        (a, "dddd", vec![php, angular]),
    ];
    for (author, name, tech_stack_ids) in projects {
        db.create_project(
            author,
            new_project_params(&format!("{name} title"), tech_stack_ids),
        )
        .await
        .unwrap();
    }
    set_project_status(db, ProjectId(3), ProjectStatus::Completed).await;
    set_project_status(db, ProjectId(4), ProjectStatus::Completed).await;

    tech
}

fn ids(projects: &[ProjectWithTechStacks]) -> Vec<ProjectId> {
    projects.iter().map(|p| p.project.id).collect()
}

#[tokio::test]
async fn test_search_without_conditions() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    seed(db).await;

    let projects = db.get_projects(&ProjectCondition::default()).await.unwrap();
    assert_eq!(
        ids(&projects),
        [ProjectId(1), ProjectId(2), ProjectId(3), ProjectId(4)]
    );

    let first = &projects[0];
    assert_eq!(first.author.nickname, "aaaa name");
    assert_eq!(
        first
            .tech_stacks
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>(),
        ["react", "spring", "nodejs"]
    );
}

#[tokio::test]
async fn test_search_pagination() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    seed(db).await;

    let condition = ProjectCondition {
        limit: Some(2),
        page: Some(1),
        ..Default::default()
    };
    let projects = db.get_projects(&condition).await.unwrap();
    assert_eq!(ids(&projects), [ProjectId(3), ProjectId(4)]);

    let condition = ProjectCondition {
        limit: Some(2),
        page: Some(2),
        ..Default::default()
    };
    assert!(db.get_projects(&condition).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_by_text() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    seed(db).await;

    let by_author = db
        .get_projects(&ProjectCondition {
            author: Some("cc".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&by_author), [ProjectId(3)]);
    assert!(by_author.iter().all(|p| p.author.nickname.contains("cc")));

    let by_title = db
        .get_projects(&ProjectCondition {
            title: Some("dd".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&by_title), [ProjectId(4)]);

    let by_content = db
        .get_projects(&ProjectCondition {
            content: Some("cccc".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&by_content), [ProjectId(3)]);

    // Empty filters are ignored.
    let unfiltered = db
        .get_projects(&ProjectCondition {
            title: Some(String::new()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(unfiltered.len(), 4);
}

#[tokio::test]
async fn test_search_by_status() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    seed(db).await;

    let projects = db
        .get_projects(&ProjectCondition {
            status: Some(ProjectStatus::Recruiting),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&projects), [ProjectId(1), ProjectId(2)]);
    assert!(projects
        .iter()
        .all(|p| p.project.status == ProjectStatus::Recruiting));
}

#[tokio::test]
async fn test_search_by_tech_stacks_matches_any() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    let tech = seed(db).await;
    let (react, spring) = (tech[0], tech[2]);

    let projects = db
        .get_projects(&ProjectCondition {
            tech_stack_ids: vec![react, spring],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&projects), [ProjectId(1), ProjectId(2), ProjectId(3)]);
    for project in &projects {
        assert!(project
            .tech_stacks
            .iter()
            .any(|t| t.id == react || t.id == spring));
        // The full tech stack list is returned, not only the matching ones.
        assert!(project.tech_stacks.len() >= 2);
    }
}

#[tokio::test]
async fn test_search_with_all_conditions() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    let tech = seed(db).await;
    let (react, php) = (tech[0], tech[4]);

    let projects = db
        .get_projects(&ProjectCondition {
            tech_stack_ids: vec![react, php],
            status: Some(ProjectStatus::Completed),
            title: Some("cccc".into()),
            limit: Some(4),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&projects), [ProjectId(3)]);
}

#[tokio::test]
async fn test_search_page_out_of_range() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    seed(db).await;

    let error = db
        .get_projects(&ProjectCondition {
            limit: Some(10),
            page: Some(u64::MAX / 2),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(
        matches!(error, Error::Http(status, _, _) if status == StatusCode::BAD_REQUEST),
        "unexpected error {error:?}"
    );

    let error = db
        .get_projects(&ProjectCondition {
            limit: Some(u64::MAX),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(error, Error::Http(status, _, _) if status == StatusCode::BAD_REQUEST));

    // The last page that still fits is accepted.
    let projects = db
        .get_projects(&ProjectCondition {
            limit: Some(1),
            page: Some(i64::MAX as u64),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(projects.is_empty());
}

#[tokio::test]
async fn test_search_text_is_literal_and_case_insensitive() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    let author = new_test_member(db, "author").await;
    for title in ["plain", "100% done", "snake_case"] {
        db.create_project(author, new_project_params(title, Vec::new()))
            .await
            .unwrap();
    }

    let titles = |title: &str| {
        let condition = ProjectCondition {
            title: Some(title.to_string()),
            ..Default::default()
        };
        async move {
            db.get_projects(&condition)
                .await
                .unwrap()
                .into_iter()
                .map(|p| p.project.title)
                .collect::<Vec<_>>()
        }
    };

    assert_eq!(titles("_").await, ["snake_case"]);
    assert_eq!(titles("%").await, ["100% done"]);
    assert_eq!(titles("0%").await, ["100% done"]);
    assert_eq!(titles("e_c").await, ["snake_case"]);
    assert_eq!(titles("\\").await, Vec::<String>::new());
    assert_eq!(titles("PLAIN").await, ["plain"]);
    assert_eq!(titles("Done").await, ["100% done"]);
}
