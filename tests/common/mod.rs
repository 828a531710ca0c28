#![allow(dead_code)]

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use notenest::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    mailer::MockMailer,
    models::{
        CreateNoteRequest, ModerationStats, NewUser, Note, NotePatch, NoteWithAuthor,
        UpdateProfileRequest, User,
    },
    repository::{Repository, RepositoryState},
    storage::MockAssetStore,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- In-Memory Repository ---

// A faithful stand-in for the Postgres repository: same ordering, same filters,
// same partial-update semantics, so service and handler tests exercise the real
// query contracts without a live database.

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    notes: Vec<Note>,
    // Monotonic counter giving every insert a strictly increasing created_at.
    seq: i64,
}

#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_stamp(inner: &mut Inner) -> DateTime<Utc> {
        // Deterministic, strictly increasing timestamps; only their relative order
        // matters to the ordering contracts under test.
        inner.seq += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(inner.seq)
    }

    /// Seeds a user directly, bypassing the signup flow.
    pub fn seed_user(&self, username: &str, email: &str, is_admin: bool) -> User {
        self.seed_user_with_password(username, email, is_admin, "password123")
    }

    pub fn seed_user_with_password(
        &self,
        username: &str,
        email: &str,
        is_admin: bool,
        password: &str,
    ) -> User {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::next_stamp(&mut inner);
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
            is_verified: true,
            is_admin,
            avatar: None,
            verify_token: None,
            verify_token_expiry: None,
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        user
    }

    /// Seeds an unverified user carrying a verification token, as signup would.
    pub fn seed_unverified_user(&self, email: &str, token: &str) -> User {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::next_stamp(&mut inner);
        let user = User {
            id: Uuid::new_v4(),
            username: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            password_hash: hash_password("password123"),
            is_verified: false,
            is_admin: false,
            avatar: None,
            verify_token: Some(token.to_string()),
            verify_token_expiry: Some(Utc::now() + Duration::hours(24)),
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        user
    }

    fn with_author(inner: &Inner, note: &Note) -> NoteWithAuthor {
        let author = inner
            .users
            .iter()
            .find(|u| u.id == note.owner_id)
            .cloned()
            .unwrap_or_default();
        NoteWithAuthor {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            images: note.images.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            author_username: author.username,
            author_email: author.email,
            author_avatar: author.avatar,
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::next_stamp(&mut inner);
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_verified: false,
            is_admin: false,
            avatar: None,
            verify_token: user.verify_token,
            verify_token_expiry: user.verify_token_expiry,
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let stamp = Self::next_stamp(&mut inner);
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = req.username {
            user.username = username;
        }
        if let Some(avatar) = req.avatar {
            user.avatar = Some(avatar);
        }
        user.updated_at = stamp;
        Ok(Some(user.clone()))
    }

    async fn consume_verify_token(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        let Some(user) = inner.users.iter_mut().find(|u| {
            u.verify_token.as_deref() == Some(token)
                && u.verify_token_expiry.is_some_and(|e| e > now)
        }) else {
            return Ok(None);
        };
        user.is_verified = true;
        user.verify_token = None;
        user.verify_token_expiry = None;
        Ok(Some(user.clone()))
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.reset_token = Some(token.to_string());
            user.reset_token_expiry = Some(expiry);
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let now = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        let Some(user) = inner.users.iter_mut().find(|u| {
            u.reset_token.as_deref() == Some(token)
                && u.reset_token_expiry.is_some_and(|e| e > now)
        }) else {
            return Ok(None);
        };
        user.password_hash = password_hash.to_string();
        user.reset_token = None;
        user.reset_token_expiry = None;
        Ok(Some(user.clone()))
    }

    async fn create_note(
        &self,
        owner_id: Uuid,
        req: CreateNoteRequest,
    ) -> Result<Note, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::next_stamp(&mut inner);
        let note = Note {
            id: Uuid::new_v4(),
            owner_id,
            title: req.title,
            content: req.content,
            images: req.images,
            is_pinned: false,
            is_public: false,
            is_approved: false,
            is_rejected: false,
            created_at: now,
            updated_at: now,
        };
        inner.notes.push(note.clone());
        Ok(note)
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn notes_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        let mut notes: Vec<Note> = inner
            .notes
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        // Same ordering as the SQL: is_pinned DESC, created_at DESC.
        notes.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(notes)
    }

    async fn public_notes(&self) -> Result<Vec<NoteWithAuthor>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        let mut notes: Vec<&Note> = inner
            .notes
            .iter()
            .filter(|n| n.is_public && n.is_approved)
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes
            .into_iter()
            .map(|n| Self::with_author(&inner, n))
            .collect())
    }

    async fn pending_notes(&self) -> Result<Vec<NoteWithAuthor>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        let mut notes: Vec<&Note> = inner
            .notes
            .iter()
            .filter(|n| n.is_public && !n.is_approved && !n.is_rejected)
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes
            .into_iter()
            .map(|n| Self::with_author(&inner, n))
            .collect())
    }

    async fn update_note(&self, id: Uuid, patch: NotePatch) -> Result<Option<Note>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let stamp = Self::next_stamp(&mut inner);
        let Some(note) = inner.notes.iter_mut().find(|n| n.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(images) = patch.images {
            note.images = images;
        }
        if let Some(is_pinned) = patch.is_pinned {
            note.is_pinned = is_pinned;
        }
        if let Some(is_public) = patch.is_public {
            note.is_public = is_public;
        }
        if let Some(is_approved) = patch.is_approved {
            note.is_approved = is_approved;
        }
        if let Some(is_rejected) = patch.is_rejected {
            note.is_rejected = is_rejected;
        }
        note.updated_at = stamp;
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.notes.len();
        inner.notes.retain(|n| n.id != id);
        Ok(inner.notes.len() < before)
    }

    async fn moderation_stats(&self) -> Result<ModerationStats, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        let pending = inner
            .notes
            .iter()
            .filter(|n| n.is_public && !n.is_approved && !n.is_rejected)
            .count() as i64;
        let approved = inner
            .notes
            .iter()
            .filter(|n| n.is_public && n.is_approved)
            .count() as i64;
        let rejected = inner.notes.iter().filter(|n| n.is_rejected).count() as i64;
        Ok(ModerationStats {
            pending,
            approved,
            rejected,
        })
    }
}

// --- Test Utilities ---

pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("hashing failed")
        .to_string()
}

/// Builds an AppState over the given repository with mock storage and mailer.
pub fn test_state(repo: Arc<MemoryRepository>) -> AppState {
    test_state_with(repo, MockAssetStore::new(), MockMailer::new()).0
}

/// Same, but hands back the mailer so tests can assert on recorded sends.
pub fn test_state_with(
    repo: Arc<MemoryRepository>,
    storage: MockAssetStore,
    mailer: MockMailer,
) -> (AppState, Arc<MockMailer>) {
    let mailer = Arc::new(mailer);
    let state = AppState {
        repo: repo as RepositoryState,
        storage: Arc::new(storage),
        mailer: mailer.clone(),
        config: AppConfig::default(),
    };
    (state, mailer)
}

/// Resolved identities for direct handler/service calls.
pub fn as_caller(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        is_admin: user.is_admin,
    }
}
