use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch},
};

/// Admin Router Module
///
/// Defines the moderation routes, exclusively accessible to users with the admin
/// flag: the review queue, the approve/reject decisions, and the review dashboard
/// counters.
///
/// Access Control:
/// These routes are nested under '/api/admin'. Each handler resolves the caller via
/// the `AuthUser` extractor and then passes through the moderation service, which
/// rejects non-admin callers with 403 before any store access.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/stats
        // Pending / approved / rejected counters for the review dashboard.
        .route("/stats", get(handlers::get_moderation_stats))
        // GET /api/admin/notes/pending
        // The review queue: submitted, undecided notes, newest first, with author
        // identity joined for display.
        .route("/notes/pending", get(handlers::get_pending_notes))
        // PATCH /api/admin/notes/{id}/approve
        // PendingReview -> Approved: the note becomes publicly visible.
        .route("/notes/{id}/approve", patch(handlers::approve_note))
        // PATCH /api/admin/notes/{id}/reject
        // PendingReview -> Rejected: removes the note from the public request and
        // records the decision.
        .route("/notes/{id}/reject", patch(handlers::reject_note))
}
