use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use super::{AuthError, Claims, TokenType};
use crate::error::AppError;
use crate::services::revocation;
use crate::state::AppState;

const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";

/// Routes reachable without a bearer token.
const PUBLIC_PATHS: &[&str] = &[
    "/health",
    "/auth/login",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/verify-reset-token",
    "/auth/reset-password",
];

fn normalized(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&normalized(path))
}

/// Validates the bearer token of every non-public request.
///
/// Checks signature, expiry and token type, then consults the revocation
/// ledger. On success the decoded [`Claims`] are stored in the request
/// extensions for the extractors. `/auth/refresh` expects a refresh token;
/// `/auth/logout` skips the ledger so that repeating a logout is harmless.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if req.method() == Method::OPTIONS || is_public(req.path()) {
                return service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body);
            }

            match authenticate(&req).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    log::debug!("rejected {} {}: {}", req.method(), req.path(), err);
                    Ok(req.error_response(err).map_into_right_body())
                }
            }
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("AppState is not registered".into()))?;

    let token = bearer_token(req).ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let path = normalized(req.path());
    let expected = if path == REFRESH_PATH {
        TokenType::Refresh
    } else {
        TokenType::Access
    };
    let claims = state.tokens.verify_as(token, expected)?;

    if path != LOGOUT_PATH && revocation::is_revoked(&state.pool, &claims.jti).await? {
        return Err(AuthError::TokenRevoked.into());
    }

    Ok(claims)
}
