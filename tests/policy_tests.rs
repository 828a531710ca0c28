use notenest::{
    auth::AuthUser,
    models::Note,
    policy::{can_delete_note, can_moderate, can_mutate_content, can_read_note},
};
use uuid::Uuid;

fn note_with(owner: Uuid, is_public: bool, is_approved: bool) -> Note {
    Note {
        id: Uuid::new_v4(),
        owner_id: owner,
        title: "t".to_string(),
        content: "c".to_string(),
        is_public,
        is_approved,
        ..Note::default()
    }
}

// --- Read Rule ---

#[test]
fn read_rule_over_all_flag_and_caller_combinations() {
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    for is_public in [false, true] {
        for is_approved in [false, true] {
            let note = note_with(owner, is_public, is_approved);
            let publicly_visible = is_public && is_approved;

            // The owner always reads their own note.
            assert!(can_read_note(Some(owner), &note));

            // Everyone else (identified or anonymous) only reads approved public notes.
            assert_eq!(can_read_note(Some(stranger), &note), publicly_visible);
            assert_eq!(can_read_note(None, &note), publicly_visible);
        }
    }
}

#[test]
fn pending_submission_is_not_readable_by_non_owners() {
    // Submitted but not yet approved: the public flag alone is not enough.
    let note = note_with(Uuid::new_v4(), true, false);

    assert!(!can_read_note(None, &note));
    assert!(!can_read_note(Some(Uuid::new_v4()), &note));
}

#[test]
fn rejected_note_is_owner_only() {
    let owner = Uuid::new_v4();
    let mut note = note_with(owner, false, false);
    note.is_rejected = true;

    assert!(can_read_note(Some(owner), &note));
    assert!(!can_read_note(None, &note));
    assert!(!can_read_note(Some(Uuid::new_v4()), &note));
}

// --- Mutation Rules ---

#[test]
fn only_the_owner_mutates_or_deletes() {
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    // Visibility flags are irrelevant for mutation: even a fully public note is
    // editable by its owner alone.
    let note = note_with(owner, true, true);

    assert!(can_mutate_content(owner, &note));
    assert!(!can_mutate_content(stranger, &note));

    // Deletion follows the identical rule.
    assert!(can_delete_note(owner, &note));
    assert!(!can_delete_note(stranger, &note));
}

// --- Moderation Rule ---

#[test]
fn moderation_requires_the_admin_flag() {
    let admin = AuthUser {
        id: Uuid::new_v4(),
        is_admin: true,
    };
    let regular = AuthUser {
        id: Uuid::new_v4(),
        is_admin: false,
    };

    assert!(can_moderate(&admin));
    assert!(!can_moderate(&regular));
}
