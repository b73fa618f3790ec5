use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

use crate::{auth::AuthenticatedUser, error::AppError, models::CreateUserDto, state::AppState};

/// Register a new user
#[post("/users")]
pub async fn register(
    state: web::Data<AppState>,
    input: web::Json<CreateUserDto>,
) -> Result<impl Responder, AppError> {
    let user = state.users.register(input.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "user": user })))
}

/// The authenticated caller's account.
#[get("/users/me")]
pub async fn me(state: web::Data<AppState>, user: AuthenticatedUser) -> Result<impl Responder, AppError> {
    let user = state.users.get(user.id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}
