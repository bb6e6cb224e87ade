use context::Identity;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use integration_tests::{MockBackend, MockResponse, api_client, unreachable_origin};
use serde_json::json;
use session_api::{ApiError, ClientError, ClientResult};

fn expect_api_error<T: std::fmt::Debug>(result: ClientResult<T>) -> ApiError {
    match result {
        Err(ClientError::Api(error)) => error,
        other => unreachable!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_returns_the_parsed_identity() {
    let backend = MockBackend::new()
        .on(
            "POST /api/v1/login",
            MockResponse::json(
                StatusCode::OK,
                json!({ "name": "Ada", "email": "ada@example.com", "validated": true }),
            ),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    let identity = api.login("ada@example.com", "hunter2").await.unwrap();

    assert_eq!(
        identity,
        Identity {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            validated: true,
        }
    );

    let received = backend.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].header("content-type"), Some("application/json"));
    insta::assert_json_snapshot!(received[0].body, @r#"
    {
      "email": "ada@example.com",
      "password": "hunter2"
    }
    "#);
}

#[tokio::test]
async fn signup_returns_the_created_user_unchanged() {
    let backend = MockBackend::new()
        .on(
            "POST /api/v1/users",
            MockResponse::json(
                StatusCode::CREATED,
                json!({ "name": "a", "email": "a@x.com", "validated": false }),
            ),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    let identity = api.signup("a", "a@x.com", "hunter2").await.unwrap();

    assert_eq!(
        identity,
        Identity {
            name: "a".to_string(),
            email: "a@x.com".to_string(),
            validated: false,
        }
    );
}

#[tokio::test]
async fn signup_validation_failure_carries_field_errors() {
    let backend = MockBackend::new()
        .on(
            "POST /api/v1/users",
            MockResponse::json(StatusCode::BAD_REQUEST, json!({ "error": { "email": "already taken" } })),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    let error = expect_api_error(api.signup("a", "a@x.com", "hunter2").await);

    assert_eq!(error.status, StatusCode::BAD_REQUEST);
    assert_eq!(error.message, "already taken");
    insta::assert_json_snapshot!(error.field_errors, @r#"
    {
      "email": "already taken"
    }
    "#);
}

#[tokio::test]
async fn string_error_message_is_used_verbatim() {
    let backend = MockBackend::new()
        .on(
            "POST /api/v1/login",
            MockResponse::json(StatusCode::UNAUTHORIZED, json!({ "error": "invalid credentials" })),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    // Only the identity lookup normalizes 401; login must report it.
    let error = expect_api_error(api.login("ada@example.com", "wrong").await);

    assert_eq!(error.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error.message, "invalid credentials");
    assert!(error.field_errors.is_none());
}

#[tokio::test]
async fn current_identity_translates_401_to_none() {
    let backend = MockBackend::new()
        .on("GET /api/v1/user", MockResponse::json(StatusCode::UNAUTHORIZED, json!({})))
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    assert_eq!(api.current_identity().await.unwrap(), None);
}

#[tokio::test]
async fn current_identity_propagates_other_failures() {
    let backend = MockBackend::new()
        .on(
            "GET /api/v1/user",
            MockResponse::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "boom" })),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    let error = expect_api_error(api.current_identity().await);

    assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.message, "boom");
}

#[tokio::test]
async fn state_changing_requests_carry_the_token_when_present() {
    let backend = MockBackend::new()
        .on(
            "POST /api/v1/logout",
            MockResponse::json(StatusCode::OK, json!({ "message": "logged out" })),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), Some("cross-origin-token=tok%2B1; session=abc123"));

    let ack = api.logout().await.unwrap();
    assert_eq!(ack.message, "logged out");

    let received = backend.received();
    assert_eq!(received[0].header("x-cross-origin-token"), Some("tok+1"));
    // Ambient session cookies travel with the request untouched.
    assert_eq!(received[0].header("cookie"), Some("cross-origin-token=tok%2B1; session=abc123"));
}

#[tokio::test]
async fn state_changing_requests_omit_the_header_without_a_token_cookie() {
    let backend = MockBackend::new()
        .on("POST /api/v1/logout", MockResponse::json(StatusCode::OK, json!({ "message": "ok" })))
        .spawn()
        .await;

    let api = api_client(&backend.origin(), Some("session=abc123"));

    api.logout().await.unwrap();

    let received = backend.received();
    assert_eq!(received[0].header("x-cross-origin-token"), None);
}

#[tokio::test]
async fn get_requests_never_carry_the_token() {
    let backend = MockBackend::new()
        .on(
            "GET /api/v1/user",
            MockResponse::json(
                StatusCode::OK,
                json!({ "name": "Ada", "email": "ada@example.com", "validated": true }),
            ),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), Some("cross-origin-token=tok-1; session=abc123"));

    api.current_identity().await.unwrap();

    let received = backend.received();
    assert_eq!(received[0].header("x-cross-origin-token"), None);
    assert_eq!(received[0].header("cookie"), Some("cross-origin-token=tok-1; session=abc123"));
}

#[tokio::test]
async fn caller_supplied_headers_are_not_dropped() {
    let backend = MockBackend::new()
        .on(
            "GET /api/v1/user",
            MockResponse::json(
                StatusCode::OK,
                json!({ "name": "Ada", "email": "ada@example.com", "validated": true }),
            ),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    let mut headers = HeaderMap::new();
    headers.insert("x-trace-id", HeaderValue::from_static("trace-42"));

    let _: serde_json::Value = api.request(Method::GET, "/user", None, headers).await.unwrap();

    let received = backend.received();
    assert_eq!(received[0].header("x-trace-id"), Some("trace-42"));
    assert_eq!(received[0].header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn non_json_failure_becomes_an_error_from_the_status_line() {
    let backend = MockBackend::new()
        .on(
            "GET /api/v1/user",
            MockResponse::text(StatusCode::SERVICE_UNAVAILABLE, "upstream maintenance"),
        )
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    let error = expect_api_error(api.current_identity().await);

    assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error.message, "HTTP error 503: Service Unavailable");
    assert!(error.field_errors.is_none());
}

#[tokio::test]
async fn non_json_success_decodes_as_an_empty_result() {
    let backend = MockBackend::new()
        .on("POST /api/v1/logout", MockResponse::empty(StatusCode::OK))
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    let ack = api.logout().await.unwrap();

    assert_eq!(ack.message, "");
}

#[tokio::test]
async fn malformed_json_success_is_a_decode_failure() {
    let backend = MockBackend::new()
        .on("GET /api/v1/user", MockResponse::malformed_json(StatusCode::OK))
        .spawn()
        .await;

    let api = api_client(&backend.origin(), None);

    assert!(matches!(api.current_identity().await, Err(ClientError::Decode(_))));
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_failure() {
    let api = api_client(&unreachable_origin().await, None);

    assert!(matches!(api.current_identity().await, Err(ClientError::Connection(_))));
}
