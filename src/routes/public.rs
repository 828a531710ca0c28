use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): the account gateway (signup, login, logout, email
/// verification, password reset) and the anonymous-safe reads.
///
/// Security Mandate:
/// The note-retrieval handlers in this module must enforce the approved-public
/// visibility rule via the authorization policy. A submitted-but-unreviewed note is
/// never served to anyone but its owner.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // --- Account Gateway ---
        // POST /api/auth/signup
        // New account creation: hashes the password, mints a verification token,
        // and mails the verification link.
        .route("/api/auth/signup", post(handlers::signup))
        // POST /api/auth/login
        // Credential issuance. Sets the HttpOnly session cookie on success.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout
        // Clears the session cookie (blank value, past expiry).
        .route("/api/auth/logout", post(handlers::logout))
        // POST /api/auth/verify-email
        // Consumes the mailed verification token.
        .route("/api/auth/verify-email", post(handlers::verify_email))
        // POST /api/auth/forgot-password and /api/auth/reset-password
        // Token-based password recovery.
        .route("/api/auth/forgot-password", post(handlers::forgot_password))
        .route("/api/auth/reset-password", post(handlers::reset_password))
        // --- Anonymous-safe Reads ---
        // GET /api/notes/public
        // The approved public collection, author identity joined.
        .route("/api/notes/public", get(handlers::get_public_notes))
        // GET /api/notes/{id}
        // Single-note read with *optional* identity: owners see everything of
        // theirs, everyone else only approved public notes.
        .route("/api/notes/{id}", get(handlers::get_note_details))
}
