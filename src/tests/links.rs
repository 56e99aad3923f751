use axum::http::StatusCode;
use uuid::Uuid;

use crate::tests::helper;

const APPLE_URL: &str = "https://apps.apple.com/app/id123";

#[tokio::test]
async fn test_create_link() {
    let mut app = helper::setup_test_app();

    let project = helper::create_project(&mut app, Some(APPLE_URL), None, None).await;
    let link = helper::create_link(&mut app, &project.id).await;

    assert_eq!(6, link.code.len());
    assert!(
        link.code
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() && !b"0O1Il".contains(&byte))
    );
}

#[tokio::test]
async fn test_created_codes_are_unique() {
    let mut app = helper::setup_test_app();

    let project = helper::create_project(&mut app, Some(APPLE_URL), None, None).await;

    let mut codes = Vec::new();

    for _ in 0..25 {
        let link = helper::create_link(&mut app, &project.id).await;

        assert!(!codes.contains(&link.code));

        codes.push(link.code);
    }
}

#[tokio::test]
async fn test_create_link_for_unknown_project() {
    let mut app = helper::setup_test_app();

    let (status_code, link, error) =
        helper::maybe_create_link(&mut app, &Uuid::new_v4(), None).await;

    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert!(link.is_none());
    assert_eq!(Some("Project not found".to_string()), error);
}

#[tokio::test]
async fn test_deactivate_link_is_idempotent() {
    let mut app = helper::setup_test_app();

    let project = helper::create_project(&mut app, Some(APPLE_URL), None, None).await;
    let link = helper::create_link(&mut app, &project.id).await;

    let status_code = helper::deactivate_link(&mut app, &link.code).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let status_code = helper::deactivate_link(&mut app, &link.code).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, _, _) = helper::root(&mut app, &link.code, None).await;
    assert_eq!(StatusCode::GONE, status_code);
}

#[tokio::test]
async fn test_deactivate_unknown_link() {
    let mut app = helper::setup_test_app();

    let status_code = helper::deactivate_link(&mut app, "zzzzzz").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
}
