use uuid::Uuid;

use crate::{auth::AuthUser, models::Note};

/// Authorization Policy
///
/// Pure decision functions consulted by the lifecycle and moderation services before
/// any store mutation. Centralizing the rules here means every endpoint enforces the
/// same ones; there is no second copy to drift.
///
/// Denials surface to callers as `Forbidden` — an operation is rejected whole, never
/// answered with a redacted partial result.

/// A note is readable by a caller when it is publicly visible, or when the caller is
/// its owner. Public visibility requires approval: a note that is merely submitted
/// (`is_public` without `is_approved`) stays invisible to everyone but its owner
/// until review completes. An absent identity satisfies only the public branch.
pub fn can_read_note(caller: Option<Uuid>, note: &Note) -> bool {
    (note.is_public && note.is_approved) || caller == Some(note.owner_id)
}

/// Only the owner may change a note's title, content, images, pin, or public flags.
pub fn can_mutate_content(caller: Uuid, note: &Note) -> bool {
    caller == note.owner_id
}

/// Deletion follows the same rule as content mutation.
pub fn can_delete_note(caller: Uuid, note: &Note) -> bool {
    can_mutate_content(caller, note)
}

/// Moderation (approve/reject, the review queue, and stats) is restricted to callers
/// whose user record carries the admin flag.
pub fn can_moderate(caller: &AuthUser) -> bool {
    caller.is_admin
}
