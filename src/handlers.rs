use crate::{
    AppState,
    auth::{self, AuthUser, MaybeAuthUser},
    error::ApiError,
    models::{
        ApiEnvelope, ApiMessage, CreateNoteRequest, ForgotPasswordRequest, LoginRequest,
        ModerationStats, NewUser, Note, NoteWithAuthor, PresignedUploadRequest,
        PresignedUploadResponse, ResetPasswordRequest, SignupRequest, UpdateNoteRequest,
        UpdateProfileRequest, UserProfile, VerifyEmailRequest,
    },
    repository::is_unique_violation,
    service::{ModerationService, NoteService},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use uuid::Uuid;

// --- Credential Helpers ---

/// Hashes a password with Argon2id under a fresh random salt. The clear-text value
/// never goes further than this function.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Store(format!("password hashing failed: {e}")))
}

/// Checks a password against a stored hash. A malformed stored hash counts as a
/// mismatch rather than an error, so login failures stay uniform.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// --- Account Handlers ---

/// signup
///
/// [Public Route] Creates an account: blank-field validation, Argon2 hash, and a
/// 24-hour verification token mailed to the new address. Duplicate username/email is
/// reported as a 400 off the store's uniqueness constraints.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Registered", body = UserProfile),
        (status = 400, description = "Invalid or duplicate fields")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<ApiEnvelope<UserProfile>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::Validation("username is required".to_string()));
    }
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if payload.password.trim().is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let verify_token = Uuid::new_v4().to_string();

    let new_user = NewUser {
        username: payload.username.trim().to_string(),
        email: payload.email.trim().to_string(),
        password_hash,
        verify_token: Some(verify_token.clone()),
        verify_token_expiry: Some(Utc::now() + Duration::hours(24)),
    };

    let user = match state.repo.create_user(new_user).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Validation(
                "username or email already taken".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Best-effort: a failed send must not roll back the account.
    if let Err(e) = state
        .mailer
        .send_verification(&user.email, &verify_token)
        .await
    {
        tracing::warn!("verification mail failed for user {}: {e}", user.id);
    }

    Ok(Json(ApiEnvelope::new(user.into())))
}

/// login
///
/// [Public Route] Verifies the password, issues a signed session token, and sets it
/// as the session cookie. Unknown email and wrong password produce the same 401, so
/// the endpoint cannot be used to probe for registered addresses.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserProfile),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiEnvelope<UserProfile>>), ApiError> {
    let user = state
        .repo
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Unauthenticated);
    }

    let token = auth::issue_token(user.id, &state.config.token_secret)?;
    let jar = jar.add(auth::session_cookie(token));

    Ok((jar, Json(ApiEnvelope::new(user.into()))))
}

/// logout
///
/// [Public Route] Clears the session cookie: value blanked, expiry in the past.
/// Deliberately requires no valid credential — an expired session can still log out.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = ApiMessage))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiMessage>) {
    (
        jar.add(auth::expired_session_cookie()),
        Json(ApiMessage::new("logged out")),
    )
}

/// verify_email
///
/// [Public Route] Consumes an unexpired verification token and marks the account
/// verified. The token pair is cleared in the same store round-trip.
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Verified", body = ApiMessage),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    state
        .repo
        .consume_verify_token(&payload.token)
        .await?
        .ok_or_else(|| {
            ApiError::Validation("invalid or expired verification token".to_string())
        })?;

    Ok(Json(ApiMessage::new("email verified")))
}

/// forgot_password
///
/// [Public Route] Mints a one-hour reset token and mails it. The response is the
/// same whether or not the address exists.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses((status = 200, description = "Acknowledged", body = ApiMessage))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    if let Some(user) = state.repo.get_user_by_email(payload.email.trim()).await? {
        let token = Uuid::new_v4().to_string();
        state
            .repo
            .set_reset_token(user.id, &token, Utc::now() + Duration::hours(1))
            .await?;

        if let Err(e) = state.mailer.send_password_reset(&user.email, &token).await {
            tracing::warn!("reset mail failed for user {}: {e}", user.id);
        }
    }

    Ok(Json(ApiMessage::new(
        "if the address exists, a reset link has been sent",
    )))
}

/// reset_password
///
/// [Public Route] Consumes an unexpired reset token and replaces the password hash.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = ApiMessage),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    if payload.password.trim().is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    state
        .repo
        .consume_reset_token(&payload.token, &password_hash)
        .await?
        .ok_or_else(|| ApiError::Validation("invalid or expired reset token".to_string()))?;

    Ok(Json(ApiMessage::new("password updated")))
}

/// get_me
///
/// [Authenticated Route] The caller's own profile, loaded fresh from the store.
#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<UserProfile>>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Json(ApiEnvelope::new(user.into())))
}

/// update_profile
///
/// [Authenticated Route] Partial profile update: username and/or avatar URL.
/// Unspecified fields are left untouched.
#[utoipa::path(
    patch,
    path = "/api/me/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 400, description = "Invalid or duplicate username")
    )
)]
pub async fn update_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiEnvelope<UserProfile>>, ApiError> {
    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            return Err(ApiError::Validation("username is required".to_string()));
        }
    }

    match state.repo.update_profile(id, payload).await {
        Ok(Some(user)) => Ok(Json(ApiEnvelope::new(user.into()))),
        Ok(None) => Err(ApiError::NotFound("user")),
        Err(e) if is_unique_violation(&e) => {
            Err(ApiError::Validation("username already taken".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

// --- Note Handlers ---

/// create_note
///
/// [Authenticated Route] Creates a note owned by the caller. New notes are private
/// drafts; visibility is a separate, owner-initiated submission step.
#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 200, description = "Created", body = Note),
        (status = 400, description = "Blank title or content")
    )
)]
pub async fn create_note(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<Json<ApiEnvelope<Note>>, ApiError> {
    let note = NoteService::new(&state.repo).create(id, payload).await?;
    Ok(Json(ApiEnvelope::new(note)))
}

/// get_my_notes
///
/// [Authenticated Route] Every note the caller owns, including drafts and rejected
/// submissions. Pinned notes first, then newest first.
#[utoipa::path(
    get,
    path = "/api/me/notes",
    responses((status = 200, description = "My notes", body = [Note]))
)]
pub async fn get_my_notes(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<Vec<Note>>>, ApiError> {
    let notes = NoteService::new(&state.repo).list_own(id).await?;
    Ok(Json(ApiEnvelope::new(notes)))
}

/// get_public_notes
///
/// [Public Route] The public collection: submitted and approved notes, newest first,
/// with the author's public identity joined in.
#[utoipa::path(
    get,
    path = "/api/notes/public",
    responses((status = 200, description = "Public notes", body = [NoteWithAuthor]))
)]
pub async fn get_public_notes(
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<Vec<NoteWithAuthor>>>, ApiError> {
    let notes = NoteService::new(&state.repo).list_public().await?;
    Ok(Json(ApiEnvelope::new(notes)))
}

/// get_note_details
///
/// [Public Route, optional identity] A single note by id. Owners see their own notes
/// in any state; everyone else only sees approved public notes. A pending submission
/// is therefore 403 to non-owners even though its public flag is set.
#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Found", body = Note),
        (status = 403, description = "Not visible to this caller"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_note_details(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<Note>>, ApiError> {
    let note = NoteService::new(&state.repo).read(id, caller).await?;
    Ok(Json(ApiEnvelope::new(note)))
}

/// update_note
///
/// [Authenticated Route] Owner edit of title/content/images/pin/public. The
/// moderation flags are not recognized fields here and cannot be changed through
/// this endpoint.
#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated", body = Note),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_note(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<ApiEnvelope<Note>>, ApiError> {
    let note = NoteService::new(&state.repo)
        .update(id, caller, payload)
        .await?;
    Ok(Json(ApiEnvelope::new(note)))
}

/// delete_note
///
/// [Authenticated Route] Owner-only hard delete.
#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_note(
    AuthUser { id: caller, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    NoteService::new(&state.repo).delete(id, caller).await?;
    Ok(Json(ApiMessage::new("note deleted")))
}

/// get_presigned_upload
///
/// [Authenticated Route] Generates a short-lived URL for direct client-to-storage
/// image upload, plus the durable URL the client stores in `images`/`avatar` once
/// the upload completes. Only image content types are accepted.
#[utoipa::path(
    post,
    path = "/api/upload/presigned",
    request_body = PresignedUploadRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUploadResponse),
        (status = 400, description = "Non-image content type")
    )
)]
pub async fn get_presigned_upload(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUploadRequest>,
) -> Result<Json<ApiEnvelope<PresignedUploadResponse>>, ApiError> {
    if !payload.content_type.starts_with("image/") {
        return Err(ApiError::Validation(
            "only image uploads are accepted".to_string(),
        ));
    }

    // Unique, structured object key: 'notes/UUID.ext'.
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("notes/{}.{}", Uuid::new_v4(), extension);

    match state
        .storage
        .presigned_upload_url(&object_key, &payload.content_type)
        .await
    {
        Ok(upload_url) => Ok(Json(ApiEnvelope::new(PresignedUploadResponse {
            upload_url,
            asset_url: state.storage.public_url(&object_key),
        }))),
        Err(e) => {
            // Log the underlying storage error but return a generic internal error.
            tracing::error!("storage error: {e}");
            Err(ApiError::Store(e))
        }
    }
}

// --- Moderation Handlers ---

/// get_pending_notes
///
/// [Admin Route] The review queue: submitted, undecided notes, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/notes/pending",
    responses(
        (status = 200, description = "Pending notes", body = [NoteWithAuthor]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_pending_notes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<Vec<NoteWithAuthor>>>, ApiError> {
    let notes = ModerationService::new(&state.repo).list_pending(&auth).await?;
    Ok(Json(ApiEnvelope::new(notes)))
}

/// get_moderation_stats
///
/// [Admin Route] Pending / approved / rejected counters for the review dashboard.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Stats", body = ModerationStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_moderation_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<ModerationStats>>, ApiError> {
    let stats = ModerationService::new(&state.repo).stats(&auth).await?;
    Ok(Json(ApiEnvelope::new(stats)))
}

/// approve_note
///
/// [Admin Route] PendingReview -> Approved. The note becomes publicly visible.
#[utoipa::path(
    patch,
    path = "/api/admin/notes/{id}/approve",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Approved", body = ApiMessage),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn approve_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    ModerationService::new(&state.repo).approve(id, &auth).await?;
    Ok(Json(ApiMessage::new("note approved")))
}

/// reject_note
///
/// [Admin Route] PendingReview -> Rejected. The note leaves the public request.
#[utoipa::path(
    patch,
    path = "/api/admin/notes/{id}/reject",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Rejected", body = ApiMessage),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn reject_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    ModerationService::new(&state.repo).reject(id, &auth).await?;
    Ok(Json(ApiMessage::new("note rejected")))
}
