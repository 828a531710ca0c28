use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer: profile management, the note lifecycle, and the image
/// upload pipeline.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware being
/// present on the router layer above this module. This guarantees that all handlers
/// receive a validated `AuthUser` carrying the user's id and admin flag, which the
/// services then feed into the authorization policy for all owner-only checks.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/me
        // The authenticated user's own profile.
        .route("/api/me", get(handlers::get_me))
        // PATCH /api/me/profile
        // Partial profile update (username and/or avatar URL).
        .route("/api/me/profile", patch(handlers::update_profile))
        // GET /api/me/notes
        // All notes owned by the caller, including drafts and rejected submissions,
        // pinned first, then newest first.
        .route("/api/me/notes", get(handlers::get_my_notes))
        // --- Note Lifecycle ---
        // POST /api/notes
        // Creates a private draft owned by the caller.
        .route("/api/notes", post(handlers::create_note))
        // PUT/DELETE /api/notes/{id}
        // Owner-only content edit (including the pin/public toggles) and hard
        // delete. The ownership check is enforced in the lifecycle service.
        .route(
            "/api/notes/{id}",
            put(handlers::update_note).delete(handlers::delete_note),
        )
        // POST /api/upload/presigned
        // Initiates the image upload pipeline: a short-lived presigned PUT URL for
        // direct client-to-storage transfer, plus the durable URL to store.
        .route("/api/upload/presigned", post(handlers::get_presigned_upload))
}
