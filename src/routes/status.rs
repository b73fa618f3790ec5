use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::state::AppState;

/// Liveness and build information.
#[get("/status")]
pub async fn status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "available",
        "system_info": {
            "environment": state.environment,
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}
