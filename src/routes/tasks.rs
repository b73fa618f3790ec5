use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskDto, UpdateTaskDto},
    services::tasks::TaskQuery,
    state::AppState,
};

/// Retrieves the tasks in one of the caller's folders.
///
/// ## Query Parameters:
/// - `page`, `page_size` (at most 1000)
/// - `sort`: `id`, `title`, `datetime`, `status`, `created`, optionally prefixed with `-`
/// - `status` (optional): `default`, `important` or `cancelled`
/// - `min_date`, `max_date` (optional): `YYYY-MM-DD`, inclusive, compared on the scheduled day
///
/// ## Responses:
/// - `200 OK`: `{metadata, tasks}`
/// - `403 Forbidden`: the folder belongs to someone else
/// - `404 Not Found`: no such folder
/// - `422 Unprocessable Entity`: invalid query parameters
#[get("/folders/{id}/tasks")]
pub async fn list_folder_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let (mut filter, filters) = query.validate()?;
    filter.folder_ids.clear();
    let page = state
        .tasks
        .list_for_folder(user.id(), path.into_inner(), &filter, &filters)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "metadata": page.metadata(&filters),
        "tasks": page.items,
    })))
}

/// Retrieves tasks across all of the caller's folders.
///
/// Accepts the same parameters as the per-folder listing plus `folder_ids`,
/// a comma separated list narrowing the result to some folders.
#[get("/users/me/tasks")]
pub async fn list_user_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let (filter, filters) = query.validate()?;
    let page = state.tasks.list_for_user(user.id(), &filter, &filters).await?;

    Ok(HttpResponse::Ok().json(json!({
        "metadata": page.metadata(&filters),
        "tasks": page.items,
    })))
}

#[post("/folders/{id}/tasks")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    input: web::Json<CreateTaskDto>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .create(user.id(), path.into_inner(), input.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "task": task })))
}

#[get("/tasks/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

/// Partially updates a task. Setting `folder_id` moves it to another of the caller's folders.
#[patch("/tasks/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    input: web::Json<UpdateTaskDto>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .update(user.id(), path.into_inner(), input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

#[delete("/tasks/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    state.tasks.delete(user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
