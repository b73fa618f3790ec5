#![doc = "The `tasknest` library crate."]
#![doc = ""]
#![doc = "Domain models, storage backends, authentication, services, middleware and"]
#![doc = "routing for the TaskNest API. The binary (`main.rs`) wires them into an"]
#![doc = "actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

pub use crate::error::AppError;
pub use crate::state::{AppSettings, AppState};
