use crate::models::{
    CreateNoteRequest, ModerationStats, NewUser, Note, NotePatch, NoteWithAuthor,
    UpdateProfileRequest, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations over the `users` and `notes`
/// collections. Handlers and services interact with the data layer through this trait
/// without knowing the concrete implementation (Postgres in production, in-memory in
/// tests).
///
/// Methods return `Result` so a store failure reaches the endpoint boundary as a 500
/// instead of degrading into an empty result. **Send + Sync + async_trait** make the
/// trait object (`Arc<dyn Repository>`) shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    // Partial profile update (username/avatar) via COALESCE.
    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, sqlx::Error>;
    // Marks the account verified iff the token matches and has not expired; clears the
    // token pair in the same statement.
    async fn consume_verify_token(&self, token: &str) -> Result<Option<User>, sqlx::Error>;
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;
    // Replaces the password hash iff the token matches and has not expired; clears the
    // token pair in the same statement.
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    // --- Notes ---
    async fn create_note(
        &self,
        owner_id: Uuid,
        req: CreateNoteRequest,
    ) -> Result<Note, sqlx::Error>;
    // Plain fetch by id, no visibility filter: the authorization policy decides
    // downstream who may see the row.
    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, sqlx::Error>;
    // All notes owned by a user, pinned first, then newest first.
    async fn notes_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, sqlx::Error>;
    // The public collection: is_public AND is_approved, newest first, author joined.
    async fn public_notes(&self) -> Result<Vec<NoteWithAuthor>, sqlx::Error>;
    // The review queue: submitted, undecided, newest first, author joined.
    async fn pending_notes(&self) -> Result<Vec<NoteWithAuthor>, sqlx::Error>;
    async fn update_note(&self, id: Uuid, patch: NotePatch) -> Result<Option<Note>, sqlx::Error>;
    async fn delete_note(&self, id: Uuid) -> Result<bool, sqlx::Error>;
    async fn moderation_stats(&self) -> Result<ModerationStats, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Maps the Postgres unique-violation class onto a boolean so the signup and profile
/// handlers can report duplicate usernames/emails as user-correctable 400s.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, is_verified, is_admin, avatar,
    verify_token, verify_token_expiry, reset_token, reset_token_expiry,
    created_at, updated_at
"#;

const NOTE_COLUMNS: &str = r#"
    id, owner_id, title, content, images, is_pinned, is_public, is_approved,
    is_rejected, created_at, updated_at
"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries use the runtime-checked `query_as` form bound against the shared pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let new_id = Uuid::new_v4();
        let sql = format!(
            r#"INSERT INTO users
                   (id, username, email, password_hash, verify_token, verify_token_expiry)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(new_id)
            .bind(user.username)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.verify_token)
            .bind(user.verify_token_expiry)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Uses COALESCE so a column is only rewritten when the corresponding field in
    /// `req` is `Some`.
    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            r#"UPDATE users
               SET username = COALESCE($2, username),
                   avatar = COALESCE($3, avatar),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(req.username)
            .bind(req.avatar)
            .fetch_optional(&self.pool)
            .await
    }

    async fn consume_verify_token(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            r#"UPDATE users
               SET is_verified = TRUE, verify_token = NULL, verify_token_expiry = NULL,
                   updated_at = NOW()
               WHERE verify_token = $1 AND verify_token_expiry > NOW()
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expiry = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expiry)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            r#"UPDATE users
               SET password_hash = $2, reset_token = NULL, reset_token_expiry = NULL,
                   updated_at = NOW()
               WHERE reset_token = $1 AND reset_token_expiry > NOW()
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts a new note. All flags start false: a fresh note is a private draft and
    /// must go through submission and review before anyone else sees it.
    async fn create_note(
        &self,
        owner_id: Uuid,
        req: CreateNoteRequest,
    ) -> Result<Note, sqlx::Error> {
        let new_id = Uuid::new_v4();
        let sql = format!(
            r#"INSERT INTO notes (id, owner_id, title, content, images)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {NOTE_COLUMNS}"#
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(new_id)
            .bind(owner_id)
            .bind(req.title)
            .bind(req.content)
            .bind(req.images)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, sqlx::Error> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1");
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn notes_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {NOTE_COLUMNS} FROM notes
               WHERE owner_id = $1
               ORDER BY is_pinned DESC, created_at DESC"#
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn public_notes(&self) -> Result<Vec<NoteWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, NoteWithAuthor>(
            r#"
            SELECT
                n.id, n.title, n.content, n.images, n.created_at, n.updated_at,
                u.username AS author_username,
                u.email AS author_email,
                u.avatar AS author_avatar
            FROM notes n
            JOIN users u ON n.owner_id = u.id
            WHERE n.is_public = TRUE AND n.is_approved = TRUE
            ORDER BY n.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn pending_notes(&self) -> Result<Vec<NoteWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, NoteWithAuthor>(
            r#"
            SELECT
                n.id, n.title, n.content, n.images, n.created_at, n.updated_at,
                u.username AS author_username,
                u.email AS author_email,
                u.avatar AS author_avatar
            FROM notes n
            JOIN users u ON n.owner_id = u.id
            WHERE n.is_public = TRUE AND n.is_approved = FALSE AND n.is_rejected = FALSE
            ORDER BY n.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Applies a partial update via COALESCE; only columns present in the patch are
    /// rewritten. The patch may carry moderation flags — whether it does is decided by
    /// the service layer, never by request payloads.
    async fn update_note(&self, id: Uuid, patch: NotePatch) -> Result<Option<Note>, sqlx::Error> {
        let sql = format!(
            r#"UPDATE notes
               SET title = COALESCE($2, title),
                   content = COALESCE($3, content),
                   images = COALESCE($4, images),
                   is_pinned = COALESCE($5, is_pinned),
                   is_public = COALESCE($6, is_public),
                   is_approved = COALESCE($7, is_approved),
                   is_rejected = COALESCE($8, is_rejected),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {NOTE_COLUMNS}"#
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.content)
            .bind(patch.images)
            .bind(patch.is_pinned)
            .bind(patch.is_public)
            .bind(patch.is_approved)
            .bind(patch.is_rejected)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compiles the review-dashboard counters in a single call.
    async fn moderation_stats(&self) -> Result<ModerationStats, sqlx::Error> {
        let pending = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notes \
             WHERE is_public = TRUE AND is_approved = FALSE AND is_rejected = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;

        let approved = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notes WHERE is_public = TRUE AND is_approved = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        let rejected =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notes WHERE is_rejected = TRUE")
                .fetch_one(&self.pool)
                .await?;

        Ok(ModerationStats {
            pending,
            approved,
            rejected,
        })
    }
}
