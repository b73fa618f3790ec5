#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use tasknest::routes;
use tasknest::state::{AppSettings, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Password123!";

pub fn settings() -> AppSettings {
    AppSettings::for_testing(JWT_SECRET)
}

pub async fn init_app(
    settings: AppSettings,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::in_memory(settings)))
            .configure(routes::config),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// A registered and logged-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn register<S, B>(app: &S, email: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "registering {}", email);
    let body: Value = test::read_body_json(resp).await;
    body["user"]["id"].as_i64().expect("user id in body")
}

pub fn refresh_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .map(|c| c.into_owned())
}

pub async fn login<S, B>(app: &S, email: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "logging in {}", email);
    let cookie = refresh_cookie(&resp).expect("refresh cookie on login");
    let body: Value = test::read_body_json(resp).await;

    TestUser {
        id: body["user"]["id"].as_i64().expect("user id in body"),
        email: email.to_string(),
        access_token: body["access_token"]
            .as_str()
            .expect("access token in body")
            .to_string(),
        refresh_token: cookie.value().to_string(),
    }
}

pub async fn sign_up<S, B>(app: &S, email: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    register(app, email).await;
    login(app, email).await
}

/// Sends a request with the user's bearer token and returns status and JSON body.
pub async fn call_json<S, B>(
    app: &S,
    user: &TestUser,
    req: test::TestRequest,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = req.insert_header(bearer(&user.access_token)).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

pub async fn create_folder<S, B>(app: &S, user: &TestUser, name: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = call_json(
        app,
        user,
        test::TestRequest::post()
            .uri("/api/v1/users/me/folders")
            .set_json(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["folder"]["id"].as_i64().expect("folder id")
}

pub async fn create_task<S, B>(app: &S, user: &TestUser, folder_id: i64, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = call_json(
        app,
        user,
        test::TestRequest::post()
            .uri(&format!("/api/v1/folders/{}/tasks", folder_id))
            .set_json(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["task"].clone()
}
