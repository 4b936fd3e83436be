use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use quiz_api::ApiConfig;
use quiz_core::model::{
    ChapterId, Credentials, CurrentUser, NewQuestion, NewQuiz, QuizId, QuizSubmission, SubjectId,
};
use quiz_core::time::fixed_date;
use serde_json::json;
use services::{ClientStore, StoreError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const COOKIE: &str = "access_token_cookie=jwt-token";

fn store_for(server: &MockServer) -> ClientStore {
    let config = ApiConfig::new(&format!("{}/api", server.uri())).expect("valid base url");
    ClientStore::http(config).expect("build store")
}

async fn mount_login(server: &MockServer, user: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", format!("{COOKIE}; HttpOnly; Path=/").as_str()),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("Cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "current_user": user })))
        .mount(server)
        .await;
}

async fn logged_in_store(server: &MockServer) -> ClientStore {
    mount_login(server, json!({"name": "a", "isAdmin": false})).await;
    let store = store_for(server);
    store
        .login(&Credentials::new("a@b.c", "b").unwrap())
        .await
        .expect("login");
    store
}

fn quiz_payload() -> NewQuiz {
    NewQuiz::new(
        "T",
        SubjectId::new(1),
        ChapterId::new(1),
        fixed_date(),
        vec![NewQuestion::new("2 + 2?", ["3", "4"], 1).unwrap()],
    )
    .unwrap()
}

fn quiz_listing(id: u64, name: &str) -> serde_json::Value {
    json!({"quiz_id": id, "name": name, "questions": []})
}

#[tokio::test]
async fn fetch_quizzes_without_session_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/quizzes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quizzes": []})))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(matches!(
        store.fetch_quizzes().await,
        Err(StoreError::LoginRequired)
    ));
    assert!(store.snapshot().quizzes().is_empty());
}

#[tokio::test]
async fn login_populates_session_from_users_me() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    let snapshot = store.snapshot();
    let expected = CurrentUser::new("a", false);
    assert_eq!(snapshot.session().user(), Some(&expected));
    assert!(snapshot.session().is_authenticated());
}

#[tokio::test]
async fn rejected_login_skips_users_me() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(
        store
            .login(&Credentials::new("a@b.c", "b").unwrap())
            .await
            .is_err()
    );
    assert!(!store.snapshot().session().is_authenticated());
}

#[tokio::test]
async fn create_quiz_success_refetches_once() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/quizzes"))
        .and(header("Cookie", COOKIE))
        .respond_with(ResponseTemplate::new(201).set_body_string("quiz created successfully"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/quizzes"))
        .and(header("Cookie", COOKIE))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"quizzes": [quiz_listing(1, "T")]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let quizzes = store.create_quiz(&quiz_payload()).await.expect("create");
    assert_eq!(quizzes[0].id, QuizId::new(1));
    assert_eq!(store.snapshot().quizzes().len(), 1);
}

#[tokio::test]
async fn create_quiz_failure_does_not_refetch() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/quizzes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("failed to create quiz"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/quizzes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quizzes": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = store.create_quiz(&quiz_payload()).await.unwrap_err();
    assert_eq!(
        err.api_error().and_then(|e| e.status()).map(|s| s.as_u16()),
        Some(500)
    );
}

#[tokio::test]
async fn delete_subject_success_refetches_subjects_once() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/subjects/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("subject deleted successfully"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"subjects": []})))
        .expect(1)
        .mount(&server)
        .await;

    let subjects = store.delete_subject(SubjectId::new(4)).await.expect("delete");
    assert!(subjects.is_empty());
}

#[tokio::test]
async fn delete_subject_failure_does_not_refetch() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/subjects/4"))
        .respond_with(ResponseTemplate::new(500).set_body_string("failed to delete subject"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"subjects": []})))
        .expect(0)
        .mount(&server)
        .await;

    assert!(store.delete_subject(SubjectId::new(4)).await.is_err());
}

#[tokio::test]
async fn submit_addresses_started_quiz_and_clears_on_failure() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/quiz/42/submit"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    store.start_quiz(QuizId::new(42));
    assert!(store.submit_quiz(&QuizSubmission::new()).await.is_err());
    assert_eq!(store.snapshot().active_quiz(), None);
}

#[tokio::test]
async fn malformed_listing_leaves_list_untouched() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/scores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"msg": "Token has expired"})))
        .mount(&server)
        .await;

    let err = store.fetch_scores().await.unwrap_err();
    assert!(matches!(
        err.api_error(),
        Some(quiz_api::ApiError::Decode { .. })
    ));
    assert!(store.snapshot().scores().is_empty());
}

#[tokio::test]
async fn concurrent_refetches_keep_the_last_response_to_arrive() {
    let server = MockServer::start().await;
    let store = logged_in_store(&server).await;

    // The first request is answered slowly with "old", the second quickly
    // with "new"; the slow reply lands last and wins.
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    Mock::given(method("GET"))
        .and(path("/api/quizzes"))
        .respond_with(move |_: &Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(200)
                    .set_body_json(json!({"quizzes": [quiz_listing(1, "old")]}))
                    .set_delay(Duration::from_millis(300))
            } else {
                ResponseTemplate::new(200)
                    .set_body_json(json!({"quizzes": [quiz_listing(2, "new")]}))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let slow = store.fetch_quizzes();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.fetch_quizzes().await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap()[0].name, "old");
    assert_eq!(fast.unwrap()[0].name, "new");
    assert_eq!(store.snapshot().quizzes()[0].name, "old");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}
