use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    repository::RepositoryState,
};

/// Name of the browser-managed cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Lifetime of an issued credential: 24 hours. The cookie max-age matches, so the
/// browser drops the cookie around the same time the signature stops verifying.
pub const TOKEN_TTL_SECS: u64 = 60 * 60 * 24;

/// Claims
///
/// The payload structure signed into every session token. Signed by the server's
/// secret and validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, the primary key into the `users` table.
    pub sub: Uuid,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// CredentialError
///
/// Why a credential failed to resolve an identity. All three collapse into a 401 at
/// the endpoint boundary; the split exists so logs can tell a dropped cookie from a
/// stale one from a forged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// No token accompanied the request.
    Missing,
    /// The signature verified but the expiry has passed.
    Expired,
    /// Bad signature, malformed token, or any other decode failure.
    Invalid,
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        // Observability only; clients see a uniform 401 either way.
        tracing::debug!("credential rejected: {err:?}");
        ApiError::Unauthenticated
    }
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

/// Produces a signed credential encoding the user's identity, expiring
/// [`TOKEN_TTL_SECS`] from now. Pure over the secret and the clock; the secret never
/// appears in the token or in any error it produces.
pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, ApiError> {
    let now = unix_now();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + TOKEN_TTL_SECS as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Store(format!("token signing failed: {e}")))
}

/// Verifies a credential and extracts the caller's identity. Any malformed input is
/// `Invalid` rather than a panic; an expired-but-well-signed token is `Expired`.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, CredentialError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims.sub),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(CredentialError::Expired),
            _ => Err(CredentialError::Invalid),
        },
    }
}

/// Builds the session cookie set by the login endpoint: HttpOnly so scripts cannot
/// read the token, SameSite=Lax, max-age matching the token TTL.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(TOKEN_TTL_SECS as i64))
        .build()
}

/// Builds the logout cookie: value blanked, expiry in the past, so the browser
/// discards the credential immediately.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the user's id plus the one
/// authorization-relevant attribute (`is_admin`) loaded from the store. Handlers take
/// this as an argument; the extractor below does the work.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub is_admin: bool,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler. This keeps authentication (extractor)
/// cleanly separated from business logic (the handler).
///
/// The process:
/// 1. Dependency resolution: Repository and AppConfig from the application state.
/// 2. Local bypass: development-time access via the 'x-user-id' header, Env::Local only.
/// 3. Token extraction from the session cookie.
/// 4. Signature/expiry verification.
/// 5. Store lookup: the user must still exist; `is_admin` is read fresh so a token
///    issued before a role change cannot carry stale privileges.
///
/// Rejection: 401 on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass: a known user id in the 'x-user-id' header stands in
        // for a full login flow. Guarded by the Env check; the id must still map to a
        // real row so `is_admin` is loaded correctly.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Ok(Some(user)) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                is_admin: user.is_admin,
                            });
                        }
                    }
                }
            }
        }
        // Production, or the bypass fell through: standard cookie verification.

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(CredentialError::Missing)?;

        let user_id = verify_token(&token, &config.token_secret)?;

        // The token may outlive the account; check the store before trusting it.
        let user = repo
            .get_user(user_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthUser {
            id: user.id,
            is_admin: user.is_admin,
        })
    }
}

/// MaybeAuthUser
///
/// Optional caller identity for endpoints that serve both anonymous and
/// authenticated callers (the single-note read). A missing, expired, or forged
/// credential resolves to `None` instead of rejecting; the authorization policy
/// treats that as "no identity".
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<Uuid>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);
        let caller = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value())
            .filter(|v| !v.is_empty())
            .and_then(|token| verify_token(token, &config.token_secret).ok());

        Ok(MaybeAuthUser(caller))
    }
}
