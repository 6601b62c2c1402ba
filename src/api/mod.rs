// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method, Request,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_session, session::ACCESS_TOKEN_COOKIE, AuthenticatedIdentity},
    models::{
        AccountResponse, CreateTimeRequest, FocusTime, MessageResponse, SessionStatus,
        SessionTokens, UpdateAccountRequest,
    },
    state::AppState,
};

pub mod accounts;
pub mod health;
pub mod session;
pub mod times;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/accounts",
            get(accounts::get_account).put(accounts::update_account),
        )
        .route("/times", get(times::list_times).post(times::create_time))
        .route("/signout", post(session::sign_out))
        .route("/me", get(session::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = CorsLayer::new()
        .allow_origin(state.frontend_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ]);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id
        )
    });

    Router::new()
        .route("/", get(welcome))
        .route("/health-check", get(health::health_check))
        .route("/health/ready", get(health::readiness))
        .route("/is-auth", get(session::is_auth))
        .route("/session", post(session::create_session))
        .merge(protected_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Greeting", body = String)
    )
)]
pub async fn welcome() -> &'static str {
    "welcome"
}

struct SessionCookieScheme;

impl Modify for SessionCookieScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(ACCESS_TOKEN_COOKIE))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        welcome,
        health::health_check,
        health::readiness,
        session::is_auth,
        session::create_session,
        session::sign_out,
        session::me,
        accounts::get_account,
        accounts::update_account,
        times::list_times,
        times::create_time
    ),
    components(
        schemas(
            SessionTokens,
            SessionStatus,
            MessageResponse,
            AuthenticatedIdentity,
            AccountResponse,
            UpdateAccountRequest,
            FocusTime,
            CreateTimeRequest,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SessionCookieScheme),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Session", description = "Cookie session lifecycle"),
        (name = "Accounts", description = "The caller's account"),
        (name = "Times", description = "Focus time logging")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{GET_USER_TARGET, GLOBAL_SIGN_OUT_TARGET};
    use crate::auth::test_support::{
        claims_for, get_user_error_mock, get_user_mock, global_sign_out_error_mock,
        global_sign_out_mock, jwks_mock, received_targets, state_for, TestKey,
    };
    use axum::{
        body::to_bytes,
        http::{
            header::{
                ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, COOKIE, ORIGIN,
                SET_COOKIE,
            },
            Response, StatusCode,
        },
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::MockServer;

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("{ACCESS_TOKEN_COOKIE}={token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn send_json(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("{ACCESS_TOKEN_COOKIE}={token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn set_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn public_routes_respond() {
        let server = MockServer::start().await;
        let app = router(state_for(&server));

        let response = app.clone().oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "welcome");

        let response = app.oneshot(get("/health-check", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Healthy");
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let server = MockServer::start().await;
        let app = router(state_for(&server));

        let response = app.oneshot(get("/health-check", None)).await.unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn protected_route_without_cookie_is_rejected_offline() {
        let server = MockServer::start().await;
        let app = router(state_for(&server));

        for uri in ["/me", "/accounts", "/times"] {
            let response = app.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
        }

        let requests = server.received_requests().await.unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn valid_session_reaches_handler_with_identity() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).expect(1).mount(&server).await;
        get_user_mock("a@example.com").expect(1).mount(&server).await;
        let app = router(state_for(&server));

        let token = key.sign(&claims_for("u-1", 3600));
        let response = app.oneshot(get("/me", Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "subjectId": "u-1", "email": "a@example.com" })
        );
    }

    #[tokio::test]
    async fn revoked_token_is_unauthorized() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_error_mock(400, "NotAuthorizedException")
            .expect(1)
            .mount(&server)
            .await;
        let app = router(state_for(&server));

        let token = key.sign(&claims_for("u-1", 3600));
        let response = app.oneshot(get("/me", Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn unknown_key_and_identity_outage_look_the_same() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        let stranger = TestKey::generate("k2");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_error_mock(500, "InternalErrorException").mount(&server).await;
        let app = router(state_for(&server));

        let unknown = stranger.sign(&claims_for("u-1", 3600));
        let outage = key.sign(&claims_for("u-1", 3600));

        let first = app.clone().oneshot(get("/me", Some(&unknown))).await.unwrap();
        let second = app.oneshot(get("/me", Some(&outage))).await.unwrap();

        assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(first).await, body_json(second).await);
    }

    #[tokio::test]
    async fn is_auth_reports_expired_session_without_identity_lookup() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_mock("a@example.com").expect(0).mount(&server).await;
        let app = router(state_for(&server));

        let expired = key.sign(&claims_for("u-1", -60));
        let response = app.clone().oneshot(get("/is-auth", Some(&expired))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "isAuthenticated": false }));

        let valid = key.sign(&claims_for("u-1", 3600));
        let response = app.clone().oneshot(get("/is-auth", Some(&valid))).await.unwrap();
        assert_eq!(body_json(response).await, json!({ "isAuthenticated": true }));

        let response = app.oneshot(get("/is-auth", None)).await.unwrap();
        assert_eq!(body_json(response).await, json!({ "isAuthenticated": false }));
    }

    #[tokio::test]
    async fn create_session_sets_every_session_cookie() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_mock("a@example.com").expect(1).mount(&server).await;
        let app = router(state_for(&server));

        let token = key.sign(&claims_for("u-1", 3600));
        let body = json!({ "accessToken": token, "idToken": "id", "refreshToken": "refresh" });
        let response = app
            .oneshot(send_json(Method::POST, "/session", None, body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 3);
        assert!(cookies.iter().any(|c| c.starts_with(&format!("access_token={token}"))));
        assert!(cookies.iter().any(|c| c.starts_with("id_token=id")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=refresh")));
        assert!(cookies.iter().all(|c| c.contains("HttpOnly") && c.contains("Path=/")));
    }

    #[tokio::test]
    async fn create_session_with_bad_token_sets_no_cookies() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_mock("a@example.com").expect(0).mount(&server).await;
        let app = router(state_for(&server));

        let expired = key.sign(&claims_for("u-1", -60));
        let response = app
            .oneshot(send_json(
                Method::POST,
                "/session",
                None,
                json!({ "accessToken": expired }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn sign_out_expires_every_session_cookie() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_mock("a@example.com").mount(&server).await;
        global_sign_out_mock().expect(1).mount(&server).await;
        let app = router(state_for(&server));

        let token = key.sign(&claims_for("u-1", 3600));
        let response = app
            .oneshot(send_json(Method::POST, "/signout", Some(&token), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 3);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn sign_out_revokes_the_token_upstream() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        // Cognito accepts the token until GlobalSignOut, then rejects it.
        get_user_mock("a@example.com").up_to_n_times(1).mount(&server).await;
        get_user_error_mock(400, "NotAuthorizedException").mount(&server).await;
        global_sign_out_mock().expect(1).mount(&server).await;
        let app = router(state_for(&server));

        let token = key.sign(&claims_for("u-1", 3600));
        let response = app
            .clone()
            .oneshot(send_json(Method::POST, "/signout", Some(&token), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let targets = received_targets(&server).await;
        assert_eq!(targets, vec![GET_USER_TARGET, GLOBAL_SIGN_OUT_TARGET]);

        let response = app.oneshot(get("/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_out_clears_cookies_when_revocation_fails() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_mock("a@example.com").mount(&server).await;
        global_sign_out_error_mock(500, "InternalErrorException")
            .expect(1)
            .mount(&server)
            .await;
        let app = router(state_for(&server));

        let token = key.sign(&claims_for("u-1", 3600));
        let response = app
            .oneshot(send_json(Method::POST, "/signout", Some(&token), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(set_cookies(&response).len(), 3);
    }

    #[tokio::test]
    async fn account_and_times_are_bound_to_the_resolved_email() {
        let server = MockServer::start().await;
        let key = TestKey::generate("k1");
        jwks_mock(&[&key]).mount(&server).await;
        get_user_mock("a@example.com").mount(&server).await;
        let app = router(state_for(&server));
        let token = key.sign(&claims_for("u-1", 3600));

        let response = app.clone().oneshot(get("/accounts", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(send_json(
                Method::PUT,
                "/accounts",
                Some(&token),
                json!({ "name": "Alice" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "email": "a@example.com", "name": "Alice", "image": "" })
        );

        let response = app
            .clone()
            .oneshot(send_json(
                Method::POST,
                "/times",
                Some(&token),
                json!({ "focusTime": 25.0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(send_json(
                Method::POST,
                "/times",
                Some(&token),
                json!({ "focusTime": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get("/times", Some(&token))).await.unwrap();
        let times = body_json(response).await;
        assert_eq!(times.as_array().unwrap().len(), 1);
        assert_eq!(times[0]["focusTime"], json!(25.0));
    }

    #[tokio::test]
    async fn cors_allows_the_frontend_origin_with_credentials() {
        let server = MockServer::start().await;
        let app = router(state_for(&server));

        let request = Request::builder()
            .uri("/health-check")
            .header(ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[test]
    fn openapi_documents_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("session_cookie"));
        assert!(doc.paths.paths.contains_key("/accounts"));
    }
}
