//! A token minted for a different purpose must be rejected by
//! `/confirm-email-verification` before any database mutation happens.

mod common;

use auth_backend::crypto::jwt::new_jwt;
use auth_backend::crypto::{Claims, SigningKey, TokenType};
use common::http::TestRequest;
use serde_json::json;

#[tokio::test]
async fn wrong_token_type_is_rejected_without_mutation() {
    let (state, _dir) = common::build_state().await;
    let app = auth_backend::app::build(state.clone());

    let register = json!({
        "identity": "pending@example.com",
        "password": "correct horse battery",
        "password_confirm": "correct horse battery",
    });
    TestRequest::post("/register-with-password").json(&register).send(app.clone()).await;

    let user = state
        .db
        .users()
        .get_by_email("pending@example.com")
        .await
        .expect("query")
        .expect("present");
    assert!(!user.verified);

    let key = SigningKey::derive(&user.email, &user.password_hash, b"p".repeat(32).as_slice())
        .expect("derive key");
    let claims = Claims {
        iat: 0,
        exp: 0,
        user_id: user.id.clone(),
        email: user.email.clone(),
        token_type: TokenType::PasswordReset,
        new_email: None,
    };
    let mismatched_token = new_jwt(claims, &key, chrono::Duration::hours(1)).expect("mint");

    let response = TestRequest::post("/confirm-email-verification")
        .json(&json!({"token": mismatched_token}))
        .send(app)
        .await;

    assert_eq!(response.status(), 401);
    assert_eq!(response.json()["code"], "err_invalid_verification_token");

    let still_unverified = state
        .db
        .users()
        .get_by_id(&user.id)
        .await
        .expect("query")
        .expect("present");
    assert!(!still_unverified.verified);
}
