use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::SESSION_COOKIE;

/// RouteClass
///
/// Every inbound path falls into exactly one class:
/// - `AuthOnly`: the login/signup/verification pages — pointless for a logged-in
///   user, who is bounced to the dashboard instead.
/// - `Protected`: pages that need an account — an anonymous visitor is bounced to
///   the login page.
/// - `Public`: everything else, always permitted (the landing page, the public-notes
///   listing, and the whole API namespace, whose endpoints authenticate downstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    AuthOnly,
    Public,
    Protected,
}

/// Classifies a request path. Pure function over the path string; unlisted paths
/// default to Public.
pub fn classify(path: &str) -> RouteClass {
    match path {
        "/login" | "/signup" | "/verifyemail" => RouteClass::AuthOnly,
        "/dashboard" => RouteClass::Protected,
        _ if path == "/profile" || path.starts_with("/profile/") => RouteClass::Protected,
        _ if path == "/notes" || path.starts_with("/notes/") => RouteClass::Protected,
        // Landing page, /public-notes, /api/..., /health, and anything else.
        _ => RouteClass::Public,
    }
}

/// session_gate
///
/// Router-wide middleware implementing the redirect policy above. The decision is
/// based solely on path class and credential *presence*: an expired or forged token
/// still counts as "present" here, and true validation happens downstream in the
/// credential codec. This makes the gate a coarse, fail-open-to-login filter rather
/// than an authentication mechanism.
pub async fn session_gate(request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let has_credential = jar
        .get(SESSION_COOKIE)
        .map(|c| !c.value().is_empty())
        .unwrap_or(false);

    match classify(request.uri().path()) {
        RouteClass::AuthOnly if has_credential => {
            Redirect::temporary("/dashboard").into_response()
        }
        RouteClass::Protected if !has_credential => Redirect::temporary("/login").into_response(),
        _ => next.run(request).await,
    }
}
