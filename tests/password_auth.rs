//! A wrong password and a nonexistent identity must be indistinguishable
//! on `/auth-with-password`.

mod common;

use common::http::TestRequest;
use serde_json::json;

#[tokio::test]
async fn wrong_password_and_missing_user_are_indistinguishable() {
    let (state, _dir) = common::build_state().await;
    let app = auth_backend::app::build(state.clone());

    let register = json!({
        "identity": "real-user@example.com",
        "password": "correct horse battery",
        "password_confirm": "correct horse battery",
    });
    let registered = TestRequest::post("/register-with-password").json(&register).send(app.clone()).await;
    assert_eq!(registered.status(), 200);

    let wrong_password = TestRequest::post("/auth-with-password")
        .json(&json!({"identity": "real-user@example.com", "password": "not the password"}))
        .send(app.clone())
        .await;
    let missing_user = TestRequest::post("/auth-with-password")
        .json(&json!({"identity": "nobody@example.com", "password": "whatever it is"}))
        .send(app)
        .await;

    assert_eq!(wrong_password.status(), 401);
    assert_eq!(missing_user.status(), 401);
    assert_eq!(wrong_password.json(), missing_user.json());
    assert_eq!(wrong_password.json()["code"], "err_invalid_credentials");
}

#[tokio::test]
async fn correct_password_mints_a_session() {
    let (state, _dir) = common::build_state().await;
    let app = auth_backend::app::build(state);

    let register = json!({
        "identity": "login-ok@example.com",
        "password": "correct horse battery",
        "password_confirm": "correct horse battery",
    });
    TestRequest::post("/register-with-password").json(&register).send(app.clone()).await;

    let login = TestRequest::post("/auth-with-password")
        .json(&json!({"identity": "login-ok@example.com", "password": "correct horse battery"}))
        .send(app)
        .await;

    assert_eq!(login.status(), 200);
    let body = login.json();
    assert_eq!(body["code"], "ok_authentication");
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}
