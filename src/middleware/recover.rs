use std::fmt;
use std::panic::AssertUnwindSafe;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{HeaderValue, CONNECTION},
        ConnectionType, StatusCode,
    },
    Error, HttpResponse, ResponseError,
};
use futures::future::{ready, FutureExt, LocalBoxFuture, Ready};

use crate::error::AppError;

/// Turns a panic anywhere downstream into a `500` that closes the connection.
pub struct RecoverPanic;

impl<S, B> Transform<S, ServiceRequest> for RecoverPanic
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RecoverPanicService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverPanicService { service }))
    }
}

pub struct RecoverPanicService<S> {
    service: S,
}

/// Error handed back to the server after a downstream panic.
#[derive(Debug)]
pub struct RecoveredPanic;

impl fmt::Display for RecoveredPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("recovered from panic")
    }
}

impl ResponseError for RecoveredPanic {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = AppError::InternalServerError(self.to_string()).error_response();
        response
            .headers_mut()
            .insert(CONNECTION, HeaderValue::from_static("close"));
        response.head_mut().set_connection_type(ConnectionType::Close);
        response
    }
}

fn describe(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<S, B> Service<ServiceRequest> for RecoverPanicService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // The router needs sole ownership of the request, so only the path is kept.
        let path = req.path().to_owned();

        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req))) {
            Ok(fut) => fut,
            Err(payload) => {
                log::error!("panic while dispatching {}: {}", path, describe(payload.as_ref()));
                return Box::pin(ready(Err::<Self::Response, _>(Error::from(RecoveredPanic))));
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    log::error!("panic while handling {}: {}", path, describe(payload.as_ref()));
                    Err(Error::from(RecoveredPanic))
                }
            }
        })
    }
}
