//! Bearer-token principal extraction
//!
//! Tokens are issued by the external identity provider. The middleware only
//! verifies them and records the `sub` claim; requests without an
//! `Authorization` header pass through as anonymous.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

/// Token verification failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid verification key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    InvalidToken(jsonwebtoken::errors::Error),

    #[error("token has an empty subject")]
    EmptySubject,
}

/// Why a request was turned away with 401.
///
/// Renders the API error envelope
/// `{"success": false, "data": null, "error": {"kind": "UNAUTHENTICATED", ...}}`.
#[derive(Debug, Error)]
pub enum Unauthorized {
    #[error("Authentication required")]
    Missing,

    #[error("Invalid Authorization header format")]
    MalformedHeader,

    #[error("Invalid token")]
    InvalidToken,
}

#[derive(Serialize)]
struct RejectionBody<'a> {
    kind: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct RejectionEnvelope<'a> {
    success: bool,
    data: Option<()>,
    error: RejectionBody<'a>,
}

impl ResponseError for Unauthorized {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::build(self.status_code()).json(RejectionEnvelope {
            success: false,
            data: None,
            error: RejectionBody {
                kind: "UNAUTHENTICATED",
                message: &message,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Externally authenticated identity of the current request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    /// Identity-provider user id (`sub` claim), opaque to us
    pub subject: String,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Verifies provider-issued JWTs
pub struct PrincipalVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl PrincipalVerifier {
    /// RS256 tokens checked against the provider's PEM public key
    pub fn from_rsa_pem(public_key_pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem).map_err(AuthError::InvalidKey)?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    /// HS256 tokens signed with a shared secret (local development and tests)
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        Self { key, validation }
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data =
            decode::<Claims>(token, &self.key, &self.validation).map_err(AuthError::InvalidToken)?;
        let subject = data.claims.sub.trim();
        if subject.is_empty() {
            return Err(AuthError::EmptySubject);
        }
        Ok(Principal::new(subject))
    }
}

/// Attaches a [`Principal`] to requests carrying a valid bearer token
#[derive(Clone)]
pub struct PrincipalMiddleware {
    verifier: Arc<PrincipalVerifier>,
}

impl PrincipalMiddleware {
    pub fn new(verifier: Arc<PrincipalVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PrincipalMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = PrincipalMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PrincipalMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct PrincipalMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<PrincipalVerifier>,
}

impl<S, B> Service<ServiceRequest> for PrincipalMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get(actix_web::http::header::AUTHORIZATION)
                .map(|h| h.to_str().unwrap_or_default().to_string());

            if let Some(header) = header {
                let token = header
                    .strip_prefix("Bearer ")
                    .ok_or(Unauthorized::MalformedHeader)?;

                let principal = verifier.verify(token.trim()).map_err(|e| {
                    tracing::warn!(error = %e, "Bearer token rejected");
                    Unauthorized::InvalidToken
                })?;

                req.extensions_mut().insert(principal);
            }

            service.call(req).await
        })
    }
}

/// Requires an authenticated principal; 401 otherwise
impl FromRequest for Principal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Principal>() {
            Some(principal) => ready(Ok(principal.clone())),
            None => ready(Err(Unauthorized::Missing.into())),
        }
    }
}

/// Principal of the request if any; never fails
#[derive(Debug, Clone, Default)]
pub struct MaybePrincipal(pub Option<Principal>);

impl MaybePrincipal {
    pub fn as_ref(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl FromRequest for MaybePrincipal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybePrincipal(req.extensions().get::<Principal>().cloned())))
    }
}
