use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record stored in the `users` table. This struct is internal:
/// it carries the password hash and the verification/reset token pairs, so it is never
/// serialized to clients. Endpoints return [`UserProfile`] instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    // Unique display identity.
    pub username: String,
    // Unique login identity.
    pub email: String,
    // Argon2 hash. Never leaves the process.
    pub password_hash: String,
    pub is_verified: bool,
    // The moderation gate: admins may approve/reject publicly submitted notes.
    pub is_admin: bool,
    // Durable URL returned by the asset store, or none if never set.
    pub avatar: Option<String>,
    // Email-verification token pair. Cleared once consumed.
    pub verify_token: Option<String>,
    pub verify_token_expiry: Option<DateTime<Utc>>,
    // Password-reset token pair. Cleared once consumed.
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// UserProfile
///
/// The client-safe projection of a [`User`]: everything except the credential hash
/// and token pairs.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub is_admin: bool,
    pub avatar: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_verified: user.is_verified,
            is_admin: user.is_admin,
            avatar: user.avatar,
        }
    }
}

/// NewUser
///
/// Repository-internal insert payload, built by the signup handler after hashing the
/// password and minting the verification token.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verify_token: Option<String>,
    pub verify_token_expiry: Option<DateTime<Utc>>,
}

/// Note
///
/// A note record from the `notes` table. The `(is_public, is_approved, is_rejected)`
/// triple drives the moderation workflow: a note is visible outside its owner only
/// when `is_public && is_approved`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Note {
    pub id: Uuid,
    // FK to users.id. Immutable after creation.
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    // Ordered image URLs returned by the asset store. Possibly empty.
    pub images: Vec<String>,
    // Owner-toggled: pinned notes sort first in the owner's listing.
    pub is_pinned: bool,
    // Owner-toggled: submitted for public visibility.
    pub is_public: bool,
    // Admin-only flags.
    pub is_approved: bool,
    pub is_rejected: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NoteWithAuthor
///
/// A note joined with its author's public identity, used by the public listing and
/// the admin review queue. The author columns are loaded via a JOIN in the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct NoteWithAuthor {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub author_username: String,
    pub author_email: String,
    pub author_avatar: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// SignupRequest
///
/// Input payload for account creation (POST /api/auth/signup). The password is hashed
/// before it touches the store and is never persisted or logged in the clear.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for credential issuance (POST /api/auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// VerifyEmailRequest
///
/// Consumes the token mailed at signup (POST /api/auth/verify-email).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// ForgotPasswordRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// ResetPasswordRequest
///
/// Consumes the token mailed by forgot-password and carries the replacement password.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// UpdateProfileRequest
///
/// Partial profile update (PATCH /api/me/profile). `Option<T>` fields plus
/// `skip_serializing_if` give efficient partial-update payloads.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// CreateNoteRequest
///
/// Input payload for note creation (POST /api/notes). Images are durable URLs
/// obtained through the presigned upload pipeline before submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// UpdateNoteRequest
///
/// Partial update payload for a note (PUT /api/notes/{id}). Only the owner-editable
/// fields appear here; the moderation flags have no spelling in this payload and can
/// therefore never be smuggled through an owner update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateNoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// NotePatch
///
/// Repository-internal partial update. Unlike [`UpdateNoteRequest`] this one can
/// carry the moderation flags; only the service layer constructs it, which keeps the
/// decision of who may set what in a single place.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_public: Option<bool>,
    pub is_approved: Option<bool>,
    pub is_rejected: Option<bool>,
}

/// PresignedUploadRequest
///
/// Input payload for requesting a short-lived upload URL (POST /api/upload/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "sunset.jpg")]
    pub filename: String,
    /// The MIME type. Must be an image type; the upload URL is constrained to it.
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

/// PresignedUploadResponse
///
/// The time-limited PUT URL for the upload, plus the durable URL the client stores
/// in `images` or `avatar` once the upload completes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUploadResponse {
    pub upload_url: String,
    pub asset_url: String,
}

// --- Dashboard Schemas (Output) ---

/// ModerationStats
///
/// Output schema for the admin review dashboard (GET /api/admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ModerationStats {
    /// Submitted for public visibility, awaiting a decision.
    pub pending: i64,
    /// Publicly visible.
    pub approved: i64,
    /// Rejected at review.
    pub rejected: i64,
}

// --- Response Envelope ---

/// ApiEnvelope
///
/// Uniform success wrapper: `{"success": true, "data": …}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// ApiMessage
///
/// Success acknowledgement for operations with no payload to return:
/// `{"success": true, "message": …}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
