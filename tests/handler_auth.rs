mod common;

use axum::http::{StatusCode, header::AUTHORIZATION};
use serde_json::{Value, json};

use common::{bearer, create_test_server, create_test_state, gateway_key, header};

#[tokio::test]
async fn test_login_success() {
    let server = create_test_server(create_test_state(&common::test_config(5)));

    let response = server
        .post("/login")
        .form(&[("username", "admin"), ("password", "admin123")])
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["token_type"], "bearer");
    assert!(json["access_token"].as_str().is_some());
    assert!(json["refresh_token"].as_str().is_some());
    assert_ne!(json["access_token"], json["refresh_token"]);
}

#[tokio::test]
async fn test_login_ignores_extra_oauth_fields() {
    let server = create_test_server(create_test_state(&common::test_config(5)));

    server
        .post("/login")
        .form(&[
            ("grant_type", "password"),
            ("username", "admin"),
            ("password", "admin123"),
            ("scope", ""),
        ])
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_user() {
    let server = create_test_server(create_test_state(&common::test_config(5)));

    let wrong_password = server
        .post("/login")
        .form(&[("username", "admin"), ("password", "nope")])
        .await;
    let unknown_user = server
        .post("/login")
        .form(&[("username", "mallory"), ("password", "admin123")])
        .await;

    wrong_password.assert_status_bad_request();
    unknown_user.assert_status_bad_request();
    assert_eq!(
        wrong_password.json::<Value>(),
        json!({ "detail": "Invalid username or password" })
    );
    assert_eq!(wrong_password.json::<Value>(), unknown_user.json::<Value>());
}

#[tokio::test]
async fn test_login_missing_fields() {
    let server = create_test_server(create_test_state(&common::test_config(5)));

    server
        .post("/login")
        .form(&[("username", "admin")])
        .await
        .assert_status_bad_request();

    server
        .post("/login")
        .form(&[("username", ""), ("password", "admin123")])
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let server = create_test_server(create_test_state(&common::test_config(5)));
    let (_, first_refresh) = common::login(&server).await;

    let response = server
        .post("/refresh")
        .json(&json!({ "refresh_token": first_refresh }))
        .await;
    response.assert_status_ok();
    let json = response.json::<Value>();
    let second_refresh = json["refresh_token"].as_str().unwrap().to_string();
    let new_access = json["access_token"].as_str().unwrap().to_string();
    assert_ne!(second_refresh, first_refresh);

    // The rotated-out token is dead.
    let replay = server
        .post("/refresh")
        .json(&json!({ "refresh_token": first_refresh }))
        .await;
    replay.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        replay.json::<Value>()["detail"],
        "Invalid or expired refresh token"
    );

    // The new pair works.
    server
        .get("/api/v1/protected")
        .add_header(gateway_key(), header(common::GATEWAY_KEY))
        .add_header(AUTHORIZATION, bearer(&new_access))
        .await
        .assert_status_ok();
    server
        .post("/refresh")
        .json(&json!({ "refresh_token": second_refresh }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_refresh_rejects_access_token_and_garbage() {
    let server = create_test_server(create_test_state(&common::test_config(5)));
    let (access, _) = common::login(&server).await;

    for token in [access.as_str(), "garbage", ""] {
        let response = server
            .post("/refresh")
            .json(&json!({ "refresh_token": token }))
            .await;
        assert!(
            response.status_code() == StatusCode::UNAUTHORIZED
                || response.status_code() == StatusCode::BAD_REQUEST,
            "unexpected status {} for {token:?}",
            response.status_code()
        );
        assert!(response.json::<Value>().get("access_token").is_none());
    }

    server
        .post("/refresh")
        .json(&json!({ "refresh_token": access }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_malformed_body() {
    let server = create_test_server(create_test_state(&common::test_config(5)));

    server
        .post("/refresh")
        .json(&json!({ "token": "x" }))
        .await
        .assert_status_bad_request();
}
