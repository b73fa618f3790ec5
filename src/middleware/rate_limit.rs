//! Per-client token bucket.

use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::AppError;

/// Rate limiting middleware factory, keyed by the IP of the connected peer.
///
/// Forwarding headers are ignored since any client can set them. Requests
/// over the limit are answered with `429` and never reach the wrapped service.
#[derive(Clone)]
pub struct RateLimit {
    limiter: Option<Arc<DefaultKeyedRateLimiter<IpAddr>>>,
}

impl RateLimit {
    /// `rps` tokens are replenished per second, up to `burst` at once.
    pub fn new(rps: u32, burst: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Some(Arc::new(RateLimiter::keyed(quota))),
        }
    }

    /// A limiter that lets everything through.
    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    pub fn from_config(enabled: bool, rps: u32, burst: u32) -> Self {
        if enabled {
            Self::new(rps, burst)
        } else {
            Self::disabled()
        }
    }

    /// Drops buckets that have refilled completely.
    pub fn prune(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    /// Number of clients currently holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }

    /// Prunes idle buckets every `period` on the current runtime.
    pub fn spawn_pruner(&self, period: Duration) {
        if self.limiter.is_none() {
            return;
        }
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                limiter.prune();
                log::debug!("rate limiter tracking {} client(s)", limiter.tracked_clients());
            }
        });
    }
}

fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: S,
    limiter: Option<Arc<DefaultKeyedRateLimiter<IpAddr>>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(limiter) = &self.limiter {
            let key = client_ip(&req);
            if limiter.check_key(&key).is_err() {
                log::warn!("rate limit exceeded for {}", key);
                let response = AppError::TooManyRequests.error_response();
                return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    #[actix_rt::test]
    async fn test_requests_over_burst_are_rejected() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimit::new(1, 2))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let req = test::TestRequest::get()
                .uri("/")
                .peer_addr("10.0.0.1:5000".parse().unwrap())
                .to_request();
            statuses.push(test::call_service(&app, req).await.status());
        }
        assert_eq!(
            statuses,
            [StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );

        // Another client has its own bucket.
        let req = test::TestRequest::get()
            .uri("/")
            .peer_addr("10.0.0.2:5000".parse().unwrap())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_forwarded_headers_do_not_open_new_buckets() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimit::new(1, 2))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let mut rejected = 0;
        for i in 0..20 {
            let req = test::TestRequest::get()
                .uri("/")
                .peer_addr("10.0.0.1:5000".parse().unwrap())
                .insert_header(("X-Forwarded-For", format!("192.168.1.{}", i)))
                .insert_header(("Forwarded", format!("for=172.16.0.{}", i)))
                .to_request();
            if test::call_service(&app, req).await.status() == StatusCode::TOO_MANY_REQUESTS {
                rejected += 1;
            }
        }
        assert_eq!(rejected, 18);
    }

    #[actix_rt::test]
    async fn test_prune_forgets_refilled_buckets() {
        let limiter = RateLimit::new(1000, 1);
        let app = test::init_service(
            App::new()
                .wrap(limiter.clone())
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        for i in 1..=5 {
            let req = test::TestRequest::get()
                .uri("/")
                .peer_addr(format!("10.0.0.{}:5000", i).parse().unwrap())
                .to_request();
            test::call_service(&app, req).await;
        }
        assert_eq!(limiter.tracked_clients(), 5);

        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[actix_rt::test]
    async fn test_disabled_limiter_passes_everything() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimit::from_config(false, 1, 1))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        for _ in 0..10 {
            let req = test::TestRequest::get().uri("/").to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }
    }
}
