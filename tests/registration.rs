//! Registration idempotency and email-verification job dedup
//! (replaying `register-with-password` must not enqueue a second job or
//! change the returned account record).

mod common;

use common::http::TestRequest;
use serde_json::json;

#[tokio::test]
async fn replaying_registration_is_idempotent() {
    let (state, _dir) = common::build_state().await;
    let db = state.db.clone();
    let app = auth_backend::app::build(state);

    let body = json!({
        "identity": "new-user@example.com",
        "password": "correct horse battery",
        "password_confirm": "correct horse battery",
    });

    let first = TestRequest::post("/register-with-password")
        .json(&body)
        .send(app.clone())
        .await;
    assert_eq!(first.status(), 200);
    let first_record = first.json()["data"]["record"].clone();

    let second = TestRequest::post("/register-with-password")
        .json(&body)
        .send(app)
        .await;
    assert_eq!(second.status(), 200);
    let second_record = second.json()["data"]["record"].clone();

    assert_eq!(first_record, second_record);

    let user = db
        .users()
        .get_by_email("new-user@example.com")
        .await
        .expect("query")
        .expect("present");
    assert!(!user.verified);

    let claimed = db.jobs().claim(10).await.expect("claim");
    assert_eq!(claimed.len(), 1, "replayed registration must not enqueue a second job");
    assert_eq!(claimed[0].job_type, "email_verification");
}

#[tokio::test]
async fn registration_rejects_short_password() {
    let (state, _dir) = common::build_state().await;
    let app = auth_backend::app::build(state);

    let body = json!({
        "identity": "short@example.com",
        "password": "short",
        "password_confirm": "short",
    });

    let response = TestRequest::post("/register-with-password").json(&body).send(app).await;
    assert_eq!(response.status(), 400);
    assert_eq!(response.json()["code"], "err_invalid_input");
}
