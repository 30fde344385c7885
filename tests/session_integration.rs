mod common;

use common::{auth_body, context_for, mint_token};
use mockito::{Matcher, Server};
use serde_json::json;
use storefront_session::models::Book;
use storefront_session::session::{guard, AccessDecision};
use storefront_session::storage::{FileStorage, Storage, IDENTITY_KEY, TOKEN_KEY};

const EXP: i64 = 4_102_444_800; // 2100-01-01

#[tokio::test]
async fn test_login_sets_flags_and_survives_restart() {
    let mut server = Server::new_async().await;
    let token = mint_token("alice", &["USER"], EXP);
    let m = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({"username": "alice", "password": "pw"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(auth_body(&token, "alice", &["USER"]))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");

    let context = context_for(&server.url(), Some(&session_file));
    context.session.login("alice", "pw").await.unwrap();
    m.assert_async().await;
    assert!(context.session.is_authenticated());
    assert!(!context.session.is_admin());
    assert_eq!(context.session.username(), "alice");

    // A fresh process sees the same session.
    let restarted = context_for(&server.url(), Some(&session_file));
    assert_eq!(restarted.session.snapshot(), context.session.snapshot());
    assert_eq!(restarted.token(), token);
    let claims = restarted.session.claims().expect("minted token decodes");
    assert_eq!(claims.sub.as_deref(), Some("alice"));
    assert_eq!(claims.groups, Some(vec!["USER".to_string()]));
    assert_eq!(claims.iss.as_deref(), Some("bookstore"));
}

#[tokio::test]
async fn test_admin_from_signup_and_restore() {
    let mut server = Server::new_async().await;
    let token = mint_token("ann", &["USER", "ADMIN"], EXP);
    let m = server
        .mock("POST", "/api/auth/signup")
        .match_body(Matcher::PartialJson(json!({"username": "ann", "isAdmin": true})))
        .with_status(200)
        .with_body(auth_body(&token, "ann", &["USER", "ADMIN"]))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    let context = context_for(&server.url(), Some(&session_file));
    context
        .session
        .signup("ann", "ann@example.com", "pw", true)
        .await
        .unwrap();
    m.assert_async().await;
    assert!(context.session.is_admin());
    assert_eq!(guard(&context.session, Some("ADMIN")), AccessDecision::Granted);

    let restarted = context_for(&server.url(), Some(&session_file));
    assert!(restarted.session.is_admin());
}

#[tokio::test]
async fn test_rejected_login_keeps_previous_session() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/api/auth/login")
        .with_status(401)
        .with_body(r#"{"message":"Invalid credentials"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    {
        let storage = FileStorage::open(&session_file).unwrap();
        storage.set_item(TOKEN_KEY, "x.y.z").unwrap();
        storage
            .set_item(IDENTITY_KEY, r#"{"username":"carol","roles":["USER"]}"#)
            .unwrap();
    }

    let context = context_for(&server.url(), Some(&session_file));
    let err = context.session.login("bob", "wrongpass").await.unwrap_err();
    m.assert_async().await;
    assert_eq!(err.message, "Invalid credentials");
    assert_eq!(context.session.last_error().as_deref(), Some("Invalid credentials"));
    assert_eq!(context.session.username(), "carol");
    assert_eq!(context.token(), "x.y.z");
}

#[tokio::test]
async fn test_logout_removes_both_entries() {
    let mut server = Server::new_async().await;
    let token = mint_token("alice", &["USER"], EXP);
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(auth_body(&token, "alice", &["USER"]))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    let context = context_for(&server.url(), Some(&session_file));
    context.session.login("alice", "pw").await.unwrap();
    context.session.logout();

    assert!(!context.session.is_authenticated());
    assert_eq!(guard(&context.session, None), AccessDecision::RedirectToLogin);
    let storage = FileStorage::open(&session_file).unwrap();
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(IDENTITY_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_admin_book_flow_uses_session_token() {
    let mut server = Server::new_async().await;
    let token = mint_token("ann", &["ADMIN"], EXP);
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(auth_body(&token, "ann", &["ADMIN"]))
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/books")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(201)
        .with_body(
            json!({"id": "b1", "title": "Howl", "author": "Allen Ginsberg", "price": 7.5, "quantity": 2})
                .to_string(),
        )
        .create_async()
        .await;

    let context = context_for(&server.url(), None);
    assert!(!context.session.is_persistent());

    let book = Book {
        title: "Howl".to_string(),
        author: "Allen Ginsberg".to_string(),
        price: 7.5,
        quantity: 2,
        ..Default::default()
    };
    // Logged out: nothing is sent.
    assert!(context.books.create_book(&context.token(), &book).await.is_err());

    context.session.login("ann", "pw").await.unwrap();
    let created = context
        .books
        .create_book(&context.token(), &book)
        .await
        .unwrap()
        .expect("record returned");
    create.assert_async().await;
    assert_eq!(created.id.as_deref(), Some("b1"));
}

#[tokio::test]
async fn test_failed_session_write_never_mixes_users() {
    let mut server = Server::new_async().await;
    let token = mint_token("bob", &["USER"], EXP);
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(auth_body(&token, "bob", &["USER"]))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    {
        let storage = FileStorage::open(&session_file).unwrap();
        storage
            .set_items(&[
                (TOKEN_KEY, "carol.token.sig"),
                (IDENTITY_KEY, r#"{"username":"carol","roles":["ADMIN"]}"#),
            ])
            .unwrap();
    }

    let context = context_for(&server.url(), Some(&session_file));
    // Make every further write to the session file fail.
    std::fs::create_dir(dir.path().join("session.tmp")).unwrap();

    context.session.login("bob", "pw").await.unwrap();
    assert_eq!(context.session.username(), "bob");
    assert!(!context.session.is_admin());

    let restarted = context_for(&server.url(), Some(&session_file));
    assert_eq!(restarted.session.username(), "carol");
    assert_eq!(restarted.token(), "carol.token.sig");
    assert!(restarted.session.is_admin());
}
