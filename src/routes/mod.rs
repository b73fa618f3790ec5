pub mod auth;
pub mod folders;
pub mod status;
pub mod tasks;
pub mod users;

use actix_web::{error, web};

use crate::auth::RequireAuth;
use crate::error::AppError;

pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Registers every `/api/v1` route.
///
/// Public endpoints come first; everything else sits behind [`RequireAuth`].
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api/v1")
                .service(status::status)
                .service(auth::login)
                .service(auth::refresh)
                .service(auth::logout)
                .service(auth::guest_login)
                .service(users::register)
                .service(
                    web::scope("")
                        .wrap(RequireAuth)
                        .service(auth::logout_everywhere)
                        .service(users::me)
                        .service(folders::list_folders)
                        .service(folders::create_folder)
                        .service(folders::get_folder)
                        .service(folders::update_folder)
                        .service(folders::delete_folder)
                        .service(tasks::list_user_tasks)
                        .service(tasks::list_folder_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                ),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| AppError::BadRequest(format!("body contains badly-formed JSON: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("invalid query string: {}", err)).into())
}

// Non-numeric ids can never match a record.
fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err: error::PathError, _req| AppError::NotFound(err.to_string()).into())
}
