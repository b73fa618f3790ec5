use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    filters::{PageParams, FOLDER_RULES},
    models::{CreateFolderDto, UpdateFolderDto},
    state::AppState,
};

/// Lists the caller's folders.
///
/// ## Query Parameters:
/// - `page`, `page_size` (at most 100)
/// - `sort`: `id`, `name`, `created`, `updated`, optionally prefixed with `-`
#[get("/users/me/folders")]
pub async fn list_folders(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let filters = query.validate(&FOLDER_RULES)?;
    let page = state.folders.list(user.id(), &filters).await?;

    Ok(HttpResponse::Ok().json(json!({
        "metadata": page.metadata(&filters),
        "folders": page.items,
    })))
}

#[post("/users/me/folders")]
pub async fn create_folder(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<CreateFolderDto>,
) -> Result<impl Responder, AppError> {
    let folder = state.folders.create(user.id(), input.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "folder": folder })))
}

#[get("/folders/{id}")]
pub async fn get_folder(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let folder = state.folders.get(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "folder": folder })))
}

/// Renames a folder.
#[patch("/folders/{id}")]
pub async fn update_folder(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    input: web::Json<UpdateFolderDto>,
) -> Result<impl Responder, AppError> {
    let folder = state
        .folders
        .update(user.id(), path.into_inner(), input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "folder": folder })))
}

/// Deletes a folder together with its tasks.
#[delete("/folders/{id}")]
pub async fn delete_folder(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    state.folders.delete(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
