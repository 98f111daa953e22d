use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::ops::Deref;

use super::{AuthError, Claims};
use crate::error::AppError;
use crate::models::User;
use crate::services::users;
use crate::state::AppState;

/// Extracts the verified token claims stored by `AuthMiddleware`.
impl FromRequest for Claims {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().cloned() {
            Some(claims) => ready(Ok(claims)),
            None => {
                let err = AppError::Unauthorized("Missing authentication".into());
                ready(Err(err.into()))
            }
        }
    }
}

/// The authenticated caller, loaded fresh from the users table.
///
/// Fails with 401 when the token's subject no longer exists or has been
/// deactivated. Role checks read `role` from this row.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl CurrentUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let claims =
                claims.ok_or_else(|| AppError::Unauthorized("Missing authentication".into()))?;
            let state = state
                .ok_or_else(|| AppError::InternalServerError("AppState is not registered".into()))?;

            let user = users::find_by_id(&state.pool, claims.sub)
                .await?
                .ok_or_else(|| AppError::from(AuthError::UserNotFound))?;
            if !user.is_active {
                return Err(AppError::from(AuthError::InactiveUser).into());
            }
            Ok(CurrentUser(user))
        })
    }
}
