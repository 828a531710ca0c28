use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{CreateNoteRequest, ModerationStats, Note, NotePatch, NoteWithAuthor,
             UpdateNoteRequest},
    policy,
    repository::RepositoryState,
};

/// NoteService
///
/// Orchestrates the note lifecycle: load, consult the authorization policy, then
/// touch the store. Every mutation flows through here, so the policy is enforced in
/// one place instead of being re-spelled per endpoint.
pub struct NoteService {
    repo: RepositoryState,
}

impl NoteService {
    pub fn new(repo: &RepositoryState) -> Self {
        Self { repo: repo.clone() }
    }

    /// Creates a note owned by the caller. A fresh note starts as a private draft:
    /// not pinned, not public, not approved, not rejected.
    pub async fn create(&self, owner: Uuid, req: CreateNoteRequest) -> Result<Note, ApiError> {
        if req.title.trim().is_empty() {
            return Err(ApiError::Validation("title is required".to_string()));
        }
        if req.content.trim().is_empty() {
            return Err(ApiError::Validation("content is required".to_string()));
        }
        Ok(self.repo.create_note(owner, req).await?)
    }

    /// Fetches a note by id for an optionally-identified caller. Missing notes are
    /// 404; notes the caller may not see are rejected whole with 403, never returned
    /// redacted.
    pub async fn read(&self, id: Uuid, caller: Option<Uuid>) -> Result<Note, ApiError> {
        let note = self
            .repo
            .get_note(id)
            .await?
            .ok_or(ApiError::NotFound("note"))?;

        if !policy::can_read_note(caller, &note) {
            return Err(ApiError::Forbidden);
        }
        Ok(note)
    }

    /// All of the caller's notes, pinned first, newest first within each group.
    pub async fn list_own(&self, caller: Uuid) -> Result<Vec<Note>, ApiError> {
        Ok(self.repo.notes_by_owner(caller).await?)
    }

    /// The public collection: submitted and approved notes, newest first, with the
    /// author's public identity joined in.
    pub async fn list_public(&self) -> Result<Vec<NoteWithAuthor>, ApiError> {
        Ok(self.repo.public_notes().await?)
    }

    /// Applies an owner edit. Only the recognized owner fields can change here; the
    /// moderation flags have no spelling in [`UpdateNoteRequest`]. Unspecified fields
    /// are left untouched.
    ///
    /// Submission semantics: toggling `is_public` from false to true re-enters review,
    /// clearing any previous approve/reject decision. Toggling it back to false
    /// withdraws the note but preserves the moderation history.
    pub async fn update(
        &self,
        id: Uuid,
        caller: Uuid,
        req: UpdateNoteRequest,
    ) -> Result<Note, ApiError> {
        let note = self
            .repo
            .get_note(id)
            .await?
            .ok_or(ApiError::NotFound("note"))?;

        if !policy::can_mutate_content(caller, &note) {
            return Err(ApiError::Forbidden);
        }

        if let Some(title) = &req.title {
            if title.trim().is_empty() {
                return Err(ApiError::Validation("title is required".to_string()));
            }
        }
        if let Some(content) = &req.content {
            if content.trim().is_empty() {
                return Err(ApiError::Validation("content is required".to_string()));
            }
        }

        let mut patch = NotePatch {
            title: req.title,
            content: req.content,
            images: req.images,
            is_pinned: req.is_pinned,
            is_public: req.is_public,
            ..NotePatch::default()
        };

        // Fresh submission: any prior decision is stale once the owner resubmits.
        if req.is_public == Some(true) && !note.is_public {
            patch.is_approved = Some(false);
            patch.is_rejected = Some(false);
        }

        self.repo
            .update_note(id, patch)
            .await?
            .ok_or(ApiError::NotFound("note"))
    }

    /// Hard-deletes a note after the ownership check. Nothing else references notes,
    /// so no cascade is needed.
    pub async fn delete(&self, id: Uuid, caller: Uuid) -> Result<(), ApiError> {
        let note = self
            .repo
            .get_note(id)
            .await?
            .ok_or(ApiError::NotFound("note"))?;

        if !policy::can_delete_note(caller, &note) {
            return Err(ApiError::Forbidden);
        }

        self.repo.delete_note(id).await?;
        Ok(())
    }
}

/// ModerationService
///
/// The admin-only review workflow over the `(is_public, is_approved, is_rejected)`
/// triple. Every operation checks `can_moderate` first; a non-admin caller gets 403
/// before the store is touched.
pub struct ModerationService {
    repo: RepositoryState,
}

impl ModerationService {
    pub fn new(repo: &RepositoryState) -> Self {
        Self { repo: repo.clone() }
    }

    /// PendingReview -> Approved. The note stays public; a stale rejected flag is
    /// cleared so the Approved state is always well-formed. Idempotent.
    pub async fn approve(&self, id: Uuid, caller: &AuthUser) -> Result<Note, ApiError> {
        if !policy::can_moderate(caller) {
            return Err(ApiError::Forbidden);
        }

        let patch = NotePatch {
            is_approved: Some(true),
            is_rejected: Some(false),
            ..NotePatch::default()
        };
        self.repo
            .update_note(id, patch)
            .await?
            .ok_or(ApiError::NotFound("note"))
    }

    /// PendingReview -> Rejected. Removes the note from the public request and marks
    /// it rejected. Idempotent: rejecting an already-rejected note changes nothing.
    pub async fn reject(&self, id: Uuid, caller: &AuthUser) -> Result<Note, ApiError> {
        if !policy::can_moderate(caller) {
            return Err(ApiError::Forbidden);
        }

        let patch = NotePatch {
            is_public: Some(false),
            is_approved: Some(false),
            is_rejected: Some(true),
            ..NotePatch::default()
        };
        self.repo
            .update_note(id, patch)
            .await?
            .ok_or(ApiError::NotFound("note"))
    }

    /// Review-dashboard counters: pending / approved / rejected.
    pub async fn stats(&self, caller: &AuthUser) -> Result<ModerationStats, ApiError> {
        if !policy::can_moderate(caller) {
            return Err(ApiError::Forbidden);
        }
        Ok(self.repo.moderation_stats().await?)
    }

    /// The review queue: submitted, undecided notes, newest first, author joined.
    pub async fn list_pending(&self, caller: &AuthUser) -> Result<Vec<NoteWithAuthor>, ApiError> {
        if !policy::can_moderate(caller) {
            return Err(ApiError::Forbidden);
        }
        Ok(self.repo.pending_notes().await?)
    }
}
