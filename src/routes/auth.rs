use actix_web::cookie::{
    time::{Duration as CookieDuration, OffsetDateTime},
    Cookie,
};
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{
    auth::{AuthenticatedUser, LoginRequest, REFRESH_COOKIE},
    error::AppError,
    state::AppState,
};

const LOGGED_OUT: &str = "successfully logged out";

fn refresh_cookie(value: String, expiry: DateTime<Utc>, secure: bool) -> Cookie<'static> {
    let max_age = (expiry - Utc::now()).num_seconds().max(0);
    Cookie::build(REFRESH_COOKIE, value)
        .path("/")
        .http_only(true)
        .secure(secure)
        .max_age(CookieDuration::seconds(max_age))
        .expires(OffsetDateTime::from_unix_timestamp(expiry.timestamp()).ok())
        .finish()
}

fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = refresh_cookie(String::new(), Utc::now(), secure);
    cookie.make_removal();
    cookie
}

/// Login user
///
/// Returns a short-lived access token in the body and sets the refresh token
/// as an HttpOnly cookie.
#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (response, refresh_token) = state.auth.login(login_data.into_inner()).await?;
    let cookie = refresh_cookie(refresh_token.plaintext, refresh_token.expiry, state.cookie_secure);

    Ok(HttpResponse::Ok().cookie(cookie).json(response))
}

/// Exchanges the refresh cookie for a new access token.
#[post("/auth/refresh")]
pub async fn refresh(state: web::Data<AppState>, req: HttpRequest) -> Result<impl Responder, AppError> {
    let cookie = req
        .cookie(REFRESH_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("missing refresh cookie".into()))?;
    let response = state.auth.refresh(cookie.value()).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Revokes the presented refresh token, if any, and clears the cookie.
#[post("/auth/logout")]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<impl Responder, AppError> {
    if let Some(cookie) = req.cookie(REFRESH_COOKIE) {
        state.auth.logout(cookie.value()).await?;
    }

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(state.cookie_secure))
        .json(json!({ "message": LOGGED_OUT })))
}

/// Revokes every refresh token of the caller.
#[post("/auth/logout-everywhere")]
pub async fn logout_everywhere(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.auth.logout_everywhere(user.id()).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(state.cookie_secure))
        .json(json!({ "message": LOGGED_OUT })))
}

#[post("/auth/guest")]
pub async fn guest_login(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let response = state.auth.guest_login().await?;
    Ok(HttpResponse::Ok().json(response))
}
