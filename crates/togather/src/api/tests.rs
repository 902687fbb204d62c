use super::routes;
use crate::{
    auth::TokenPair,
    db::{
        member::ProviderType,
        tests::{new_test_member, new_test_tech_stacks, TestDb},
        Database, MemberId,
    },
    image_store::{FakeImageStore, ImageStore},
    oauth::tests::fake_providers,
    AppState, Config,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt as _;

struct TestApp {
    _test_db: TestDb,
    db: Arc<Database>,
    router: Router,
    images: Arc<FakeImageStore>,
}

impl TestApp {
    async fn new() -> Self {
        let test_db = TestDb::sqlite().await;
        let db = test_db.db().clone();
        let images = Arc::new(FakeImageStore::new());
        let state = Arc::new(AppState {
            db: db.clone(),
            image_store: Some(images.clone() as Arc<dyn ImageStore>),
            identity_providers: fake_providers("new@example.com"),
            config: Config::test(),
        });
        Self {
            _test_db: test_db,
            db,
            router: routes(state),
            images,
        }
    }

    async fn token_for(&self, member_id: MemberId) -> String {
        let profile = self.db.get_member(member_id).await.unwrap();
        TokenPair::issue(&profile.member, &Config::test())
            .unwrap()
            .access_token
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = TestApp::new().await;

    let (status, _) = app.send(Method::GET, "/projects/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::GET, "/members/me", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorCode"], "INVALID_TOKEN");

    let (status, body) = app.send(Method::GET, "/projects", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_project_endpoints() {
    let app = TestApp::new().await;
    let author = new_test_member(&app.db, "author").await;
    let other = new_test_member(&app.db, "other").await;
    let tech = new_test_tech_stacks(&app.db, &["react", "spring"]).await;
    let author_token = app.token_for(author).await;
    let other_token = app.token_for(other).await;

    let (status, created) = app
        .send(
            Method::POST,
            "/projects",
            Some(&author_token),
            Some(json!({
                "title": "togather",
                "content": "build a collaboration app",
                "personnel": 3,
                "offline": true,
                "location": { "address": "Seoul", "latitude": 37.5665, "longitude": 126.978 },
                "deadline": "2030-01-31",
                "techStackIds": [tech[0].0, tech[1].0],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "RECRUITING");
    assert_eq!(created["author"]["nickname"], "author");
    assert_eq!(created["location"]["address"], "Seoul");
    assert_eq!(created["deadline"], "2030-01-31");
    assert_eq!(created["techStacks"][1]["name"], "spring");
    let project_id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/projects/{project_id}"),
            Some(&other_token),
            Some(json!({
                "title": "mine now",
                "content": "",
                "personnel": 3,
                "status": "RECRUITING",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "NOT_MATCH_MEMBER_PROJECT");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/projects/{project_id}/members"),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, comment) = app
        .send(
            Method::POST,
            &format!("/projects/{project_id}/comments"),
            Some(&other_token),
            Some(json!({ "content": "count me in" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["author"]["nickname"], "other");

    let (status, details) = app
        .send(Method::GET, &format!("/projects/{project_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["title"], "togather");
    assert_eq!(details["comments"][0]["content"], "count me in");

    let (status, listed) = app
        .send(
            Method::GET,
            &format!("/projects?title=toga&techStackIds={}", tech[1].0),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, nearby) = app
        .send(
            Method::GET,
            "/projects/map?latitude=37.56&longitude=126.97&distance=5",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nearby[0]["id"], project_id);

    let (_, participating) = app
        .send(
            Method::GET,
            "/projects/participating",
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(participating, json!([{ "id": project_id, "title": "togather" }]));

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/projects/{project_id}"),
            Some(&other_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "NOT_MATCH_MEMBER_PROJECT");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/projects/{project_id}"),
            Some(&author_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::GET, &format!("/projects/{project_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "NOT_FOUND_PROJECT");
}

#[tokio::test]
async fn test_chat_endpoints() {
    let app = TestApp::new().await;
    let author = new_test_member(&app.db, "author").await;
    let outsider = new_test_member(&app.db, "outsider").await;
    let token = app.token_for(author).await;
    let outsider_token = app.token_for(outsider).await;

    let (_, project) = app
        .send(
            Method::POST,
            "/projects",
            Some(&token),
            Some(json!({ "title": "chatty", "content": "", "personnel": 2 })),
        )
        .await;
    let project_id = project["id"].as_i64().unwrap();

    let (status, room) = app
        .send(
            Method::POST,
            &format!("/projects/{project_id}/chats"),
            Some(&token),
            Some(json!({ "roomName": "general" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["roomName"], "general");
    let room_id = room["roomId"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/projects/{project_id}/chats/{room_id}/messages"),
            Some(&token),
            Some(json!({ "message": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, rooms) = app
        .send(
            Method::GET,
            &format!("/projects/{project_id}/chats"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        rooms,
        json!({ "chatRoomDtos": [{ "roomId": room_id, "roomName": "general" }] })
    );

    let (status, details) = app
        .send(
            Method::GET,
            &format!("/projects/{project_id}/chats/{room_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["roomId"], room_id);
    assert_eq!(details["messages"][0]["message"], "hello");
    assert_eq!(details["messages"][0]["nickname"], "author");
    assert_eq!(details["messages"][0]["memberId"], author.0);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/projects/{project_id}/chats"),
            Some(&outsider_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "NOT_PROJECT_MEMBER");
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = TestApp::new().await;
    let tech = new_test_tech_stacks(&app.db, &["rust"]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login/kakao",
            None,
            Some(json!({ "code": "valid-code" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "UNSUPPORTED_PROVIDER");

    let (status, login) = app
        .send(
            Method::POST,
            "/auth/login/google",
            None,
            Some(json!({ "code": "valid-code" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["needsSignUp"], true);
    assert_eq!(login["email"], "new@example.com");

    let (status, signed_up) = app
        .send(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "signUpToken": login["signUpToken"],
                "nickname": "newbie",
                "techStackIds": [tech[0].0],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(signed_up["member"]["nickname"], "newbie");
    assert_eq!(signed_up["member"]["status"], "PERMITTED");
    assert_eq!(signed_up["member"]["role"], "ROLE_USER");
    assert_eq!(signed_up["member"]["techStacks"][0]["name"], "rust");

    let access_token = signed_up["accessToken"].as_str().unwrap().to_string();
    let (status, me) = app
        .send(Method::GET, "/members/me", Some(&access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "new@example.com");
    assert_eq!(me["providerType"], ProviderType::Google.to_string());

    let (status, refreshed) = app
        .send(
            Method::POST,
            "/auth/refresh",
            None,
            Some(json!({ "refreshToken": signed_up["refreshToken"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["accessToken"].is_string());

    let (status, login) = app
        .send(
            Method::POST,
            "/auth/login/GOOGLE",
            None,
            Some(json!({ "code": "valid-code" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["needsSignUp"], false);
    assert_eq!(login["memberId"], me["id"]);
}

#[tokio::test]
async fn test_image_upload() {
    let app = TestApp::new().await;
    let member = new_test_member(&app.db, "uploader").await;
    let token = app.token_for(member).await;

    let multipart = |file_name: &str, content: &str| {
        let body = format!(
            "--BOUNDARY\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --BOUNDARY--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri("/images")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap()
    };

    let (status, body) = app.dispatch(multipart("cat.png", "meow")).await;
    assert_eq!(status, StatusCode::OK);
    let objects = app.images.objects();
    assert_eq!(objects.len(), 1);
    let (key, object) = objects.into_iter().next().unwrap();
    assert!(key.ends_with("cat.png"));
    assert_eq!(object.bytes, b"meow");
    assert_eq!(body["url"], app.images.public_url(&key));

    let (status, body) = app.dispatch(multipart("cat.exe", "meow")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "MISS_MATCH_IMAGE_TYPE");
    assert_eq!(app.images.objects().len(), 1);
}
