use super::*;
use crate::ErrorCode;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_chat_rooms() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    let author = new_test_member(db, "author").await;
    let member = new_test_member(db, "member").await;
    let project = db
        .create_project(author, new_project_params("project", Vec::new()))
        .await
        .unwrap()
        .project;
    db.join_project(project.id, member).await.unwrap();

    let general = db
        .create_chat_room(CreateChatRoomParams {
            project_id: project.id,
            member_id: author,
            room_name: "general".into(),
        })
        .await
        .unwrap();
    let random = db
        .create_chat_room(CreateChatRoomParams {
            project_id: project.id,
            member_id: member,
            room_name: "random".into(),
        })
        .await
        .unwrap();

    let rooms = db.get_chat_rooms(project.id, member).await.unwrap();
    assert_eq!(rooms, [general.clone(), random.clone()]);

    db.send_chat_message(project.id, general.id, author, "hello")
        .await
        .unwrap();
    db.send_chat_message(project.id, general.id, member, "hi there")
        .await
        .unwrap();

    let details = db
        .get_chat_room(project.id, general.id, member)
        .await
        .unwrap();
    assert_eq!(details.room, general);
    assert_eq!(
        details
            .messages
            .iter()
            .map(|m| (m.sender.nickname.as_str(), m.message.message.as_str()))
            .collect::<Vec<_>>(),
        [("author", "hello"), ("member", "hi there")]
    );

    let details = db
        .get_chat_room(project.id, random.id, author)
        .await
        .unwrap();
    assert!(details.messages.is_empty());
}

#[tokio::test]
async fn test_chat_room_access() {
    let test_db = TestDb::sqlite().await;
    let db = test_db.db();
    let author = new_test_member(db, "author").await;
    let outsider = new_test_member(db, "outsider").await;
    let project = db
        .create_project(author, new_project_params("project", Vec::new()))
        .await
        .unwrap()
        .project;
    let other_project = db
        .create_project(author, new_project_params("other", Vec::new()))
        .await
        .unwrap()
        .project;
    let room = db
        .create_chat_room(CreateChatRoomParams {
            project_id: project.id,
            member_id: author,
            room_name: "general".into(),
        })
        .await
        .unwrap();

    let error = db
        .create_chat_room(CreateChatRoomParams {
            project_id: project.id,
            member_id: outsider,
            room_name: "mine".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::NotProjectMember));

    let error = db.get_chat_rooms(project.id, outsider).await.unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::NotProjectMember));

    let error = db
        .send_chat_message(project.id, room.id, outsider, "let me in")
        .await
        .unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::NotProjectMember));

    // Rooms are only reachable through the project they belong to.
    let error = db
        .get_chat_room(other_project.id, room.id, author)
        .await
        .unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::NotFoundChatRoom));

    let error = db
        .get_chat_rooms(ProjectId(99), author)
        .await
        .unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::NotFoundProject));
}
