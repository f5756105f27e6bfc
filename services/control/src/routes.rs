//! Control service routes
//!
//! Apart from `/health`, every request lands on the front controller, which
//! rejects paths that do not name a `.do` action.

use axum::{
    Form, Json, Router,
    body::Body,
    extract::{FromRequest, State},
    http::Request,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    action::Action,
    error::ControlResult,
    models::Credentials,
    state::AppState,
};

/// Create the router for the control service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .fallback(front_controller)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let session_store = match state.sessions.health_check().await {
        Ok(true) => "ok",
        _ => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "service": "control-service",
        "session_store": session_store,
    }))
}

/// Single entry point for `.../<action>.do` requests
pub async fn front_controller(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request<Body>,
) -> ControlResult<impl IntoResponse> {
    info!("Front controller start: {} {}", request.method(), request.uri());

    let action = Action::from_path(request.uri().path())?;
    info!("Requested action: {}", action);

    let mut session = state.sessions.acquire(&jar).await?;

    let credentials = if action == Action::LogonAction {
        Some(read_credentials(request).await)
    } else {
        None
    };

    let dispatch = state
        .controller
        .dispatch(&action, session.record, credentials)
        .await?;
    session.record = dispatch.session;

    info!("Forwarding to view: {}", dispatch.view.path());
    let page = state
        .views
        .forward(dispatch.view, &session.record, dispatch.login_failed)?;
    let jar = state.sessions.commit(&session, jar).await?;

    Ok((jar, page))
}

/// Login form fields from the query string (GET) or a urlencoded body
///
/// The body is decoded as UTF-8. Anything that does not parse yields empty
/// fields, which the credential lookup will reject.
async fn read_credentials(request: Request<Body>) -> Credentials {
    match Form::<Credentials>::from_request(request, &()).await {
        Ok(Form(credentials)) => credentials,
        Err(rejection) => {
            debug!("Unreadable login form: {}", rejection);
            Credentials::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::FrontController,
        models::Credentials,
        session::{InMemorySessionStore, SessionManager},
        verifier::{CredentialVerifier, InMemoryCredentialVerifier, Verification, VerifyError},
        view::ViewRenderer,
    };
    use async_trait::async_trait;
    use axum::http::{StatusCode, header};
    use chrono::Duration;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct DownVerifier;

    #[async_trait]
    impl CredentialVerifier for DownVerifier {
        async fn verify(&self, _: &Credentials) -> Result<Verification, VerifyError> {
            Err(VerifyError::Unavailable("connection refused".to_string()))
        }
    }

    fn create_app_with(verifier: Arc<dyn CredentialVerifier>) -> Router {
        let store = InMemorySessionStore::new(Duration::seconds(60));
        create_router(AppState {
            controller: FrontController::new(verifier),
            sessions: SessionManager::new(Arc::new(store), "SESSIONID"),
            views: Arc::new(ViewRenderer::new().unwrap()),
        })
    }

    fn create_app() -> Router {
        create_app_with(Arc::new(
            InMemoryCredentialVerifier::new()
                .with_user("alice", Some("Alice"), "secret")
                .unwrap(),
        ))
    }

    async fn body_to_string(body: Body) -> String {
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_login(user_id: &str, user_pwd: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/app/logonAction.do")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
            .body(Body::from(format!("userId={user_id}&userPwd={user_pwd}")))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = create_app().oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["session_store"], "ok");
    }

    #[tokio::test]
    async fn test_logon_forwards_to_logon_view_and_starts_session() {
        let response = create_app()
            .oneshot(get("/app/logon.do", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert!(session_cookie(&response).starts_with("SESSIONID="));
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("<title>Logon</title>"));
    }

    #[tokio::test]
    async fn test_unknown_action_falls_back_to_logon_view() {
        let response = create_app()
            .oneshot(get("/app/whatever.do", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("<title>Logon</title>"));
    }

    #[tokio::test]
    async fn test_malformed_path_is_bad_request() {
        let response = create_app()
            .oneshot(get("/app/logon", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Malformed action path"));
    }

    #[tokio::test]
    async fn test_login_then_home_uses_session() {
        let app = create_app();

        let response = app
            .clone()
            .oneshot(post_login("alice", "secret", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Welcome, Alice."));

        // any action now lands on home
        for uri in ["/app/home.do", "/app/logon.do", "/other/unknown.do"] {
            let response = app.clone().oneshot(get(uri, Some(&cookie))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get(header::SET_COOKIE).is_none());
            let body = body_to_string(response.into_body()).await;
            assert!(body.contains("<title>Home</title>"), "uri {uri}");
        }
    }

    #[tokio::test]
    async fn test_login_through_query_string() {
        let response = create_app()
            .oneshot(get("/app/logonAction.do?userId=alice&userPwd=secret", None))
            .await
            .unwrap();

        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("<title>Home</title>"));
    }

    #[tokio::test]
    async fn test_failed_login_redisplays_logon_view() {
        let app = create_app();

        let response = app
            .clone()
            .oneshot(post_login("alice", "wrong", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Login failed for alice."));

        // the notice belongs to the attempt, not to the session
        for uri in ["/app/home.do", "/app/logon.do"] {
            let response = app.clone().oneshot(get(uri, Some(&cookie))).await.unwrap();
            let body = body_to_string(response.into_body()).await;
            assert!(body.contains("<title>Logon</title>"), "uri {uri}");
            assert!(!body.contains("Login failed"), "uri {uri}");
        }
    }

    #[tokio::test]
    async fn test_login_without_form_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/app/logonAction.do")
            .body(Body::empty())
            .unwrap();

        let response = create_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("<title>Logon</title>"));
    }

    #[tokio::test]
    async fn test_utf8_form_fields() {
        let app = create_app_with(Arc::new(
            InMemoryCredentialVerifier::new()
                .with_user("홍길동", None, "비밀")
                .unwrap(),
        ));

        let response = app
            .oneshot(post_login(
                "%ED%99%8D%EA%B8%B8%EB%8F%99",
                "%EB%B9%84%EB%B0%80",
                None,
            ))
            .await
            .unwrap();
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Welcome, 홍길동."));
    }

    #[tokio::test]
    async fn test_unavailable_verifier_is_service_unavailable() {
        let response = create_app_with(Arc::new(DownVerifier))
            .oneshot(post_login("alice", "secret", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_literal_scenario() {
        let app = create_app_with(Arc::new(
            InMemoryCredentialVerifier::new()
                .with_user("alice", None, "secret")
                .unwrap(),
        ));

        let response = app
            .oneshot(post_login("alice", "secret", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Welcome, alice."));
    }
}
