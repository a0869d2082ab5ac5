//! `/request-password-reset` must not reveal whether an email is
//! registered: a nonexistent address gets the same acknowledgement as a
//! real one, and enqueues no job.

mod common;

use common::http::TestRequest;
use serde_json::json;

#[tokio::test]
async fn nonexistent_email_is_not_enumerable() {
    let (state, _dir) = common::build_state().await;
    let app = auth_backend::app::build(state.clone());

    let response = TestRequest::post("/request-password-reset")
        .json(&json!({"email": "nobody-at-all@example.com"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 202);
    assert_eq!(response.json()["code"], "ok_password_reset_requested");

    let claimed = state.db.jobs().claim(10).await.expect("claim");
    assert!(claimed.is_empty(), "no job should be enqueued for an unknown email");
}

#[tokio::test]
async fn registered_email_gets_the_same_acknowledgement_and_enqueues_a_job() {
    let (state, _dir) = common::build_state().await;
    let app = auth_backend::app::build(state.clone());

    let register = json!({
        "identity": "reset-me@example.com",
        "password": "correct horse battery",
        "password_confirm": "correct horse battery",
    });
    TestRequest::post("/register-with-password").json(&register).send(app.clone()).await;
    // Mark verified directly; an unverified account still gets the same
    // ok_password_reset_requested acknowledgement either way.
    let user = state.db.users().get_by_email("reset-me@example.com").await.expect("query").expect("present");
    state.db.users().mark_verified(&user.id).await.expect("mark verified");

    let response = TestRequest::post("/request-password-reset")
        .json(&json!({"email": "reset-me@example.com"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 202);
    assert_eq!(response.json()["code"], "ok_password_reset_requested");

    let claimed = state.db.jobs().claim(10).await.expect("claim");
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].job_type, "password_reset");
}
