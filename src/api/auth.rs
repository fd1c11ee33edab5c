// src/api/auth.rs
//
// Сервис токены не выпускает — этим занимается внешний identity-сервис
// с общим секретом. Здесь только проверка и извлечение майнера и роли.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use chrono::{Duration, Utc};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::Role;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    role: String,
    exp: usize,
}

/// Аутентифицированный вызов: кладётся в extensions, хэндлеры читают
/// через `web::ReqData<AuthedMiner>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthedMiner {
    pub id: i64,
    pub role: Role,
}

impl AuthedMiner {
    pub fn require_admin(&self) -> Result<(), crate::errors::LedgerError> {
        if self.role != Role::Admin {
            return Err(crate::errors::LedgerError::Forbidden(
                "administrator role required",
            ));
        }
        Ok(())
    }
}

/// Подпись токена тем же секретом, что у identity-сервиса.
/// В проде не вызывается; нужна локальной отладке и интеграционным тестам.
pub fn issue_token(
    secret: &str,
    miner_id: i64,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(30))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: miner_id,
        role: role.as_str().to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Middleware, который:
/// - берет `Authorization: Bearer <jwt>`
/// - валидирует JWT
/// - кладет `AuthedMiner` в `req.extensions_mut()`
pub struct JwtMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtMiddlewareInner<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareInner { service }))
    }
}

pub struct JwtMiddlewareInner<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareInner<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secret = match req.app_data::<actix_web::web::Data<AppState>>() {
            Some(state) => state.jwt_secret.clone(),
            None => {
                let res = req
                    .error_response(actix_web::error::ErrorInternalServerError(
                        "app state not configured",
                    ))
                    .map_into_right_body();
                return Box::pin(async move { Ok(res) });
            }
        };

        let auth_header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            match decode::<Claims>(
                token,
                &DecodingKey::from_secret(secret.as_ref()),
                &Validation::default(),
            ) {
                Ok(token_data) => {
                    let role = match Role::parse(&token_data.claims.role) {
                        Some(r) => r,
                        None => {
                            let res = req
                                .error_response(actix_web::error::ErrorUnauthorized(
                                    "Unknown role",
                                ))
                                .map_into_right_body();
                            return Box::pin(async move { Ok(res) });
                        }
                    };
                    req.extensions_mut().insert(AuthedMiner {
                        id: token_data.claims.sub,
                        role,
                    });
                    let fut = self.service.call(req);
                    return Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) });
                }
                Err(_) => {
                    let res = req
                        .error_response(actix_web::error::ErrorUnauthorized("Invalid token"))
                        .map_into_right_body();
                    return Box::pin(async move { Ok(res) });
                }
            }
        }

        let res = req
            .error_response(actix_web::error::ErrorUnauthorized(
                "Missing or invalid Authorization header",
            ))
            .map_into_right_body();
        Box::pin(async move { Ok(res) })
    }
}
