//! Integration test: two-device divergence and backup blobs.
//!
//! The same account played on two machines drifts apart; reconciliation
//! must keep the most-progressed snapshot without ever regressing level,
//! lifetime EXP, or unlocked titles, and a backup blob exported on one
//! machine must restore cleanly on another.

use arise::core::merge::merge_states;
use arise::core::player::PlayerState;
use arise::core::progression::Rank;
use arise::local_store::LocalStore;
use arise::sync::{export_blob, import_blob, load_state, save_state};
use uuid::Uuid;

fn temp_store() -> LocalStore {
    let dir = std::env::temp_dir().join(format!("arise-test-{}", Uuid::new_v4()));
    LocalStore::with_root(dir).unwrap()
}

fn played_state(username: &str, level: u32, cumulative_exp: u64) -> PlayerState {
    let mut state = PlayerState::new(username, 0);
    state.level = level;
    state.cumulative_exp = cumulative_exp;
    state.recompute_rank();
    state
}

#[test]
fn test_two_device_divergence_keeps_most_progress() {
    let laptop = temp_store();
    let desktop = temp_store();

    // The desktop is two weeks ahead; the laptop has a stale copy with
    // one unlock the desktop never saw.
    let mut desktop_state = played_state("hunter", 14, 9_000);
    desktop_state.streak = 14;
    let mut laptop_state = played_state("hunter", 6, 2_000);
    laptop_state.unlock_title("Novice Hunter");

    save_state(&desktop, None, &mut desktop_state, 100).unwrap();
    save_state(&laptop, None, &mut laptop_state, 50).unwrap();

    // Reconcile the laptop against the desktop's snapshot, the way the
    // session does against the remote mirror.
    let local = load_state(&laptop, None, "hunter", 200).unwrap();
    let merged = merge_states(&local, &desktop_state);

    assert_eq!(merged.level, 14);
    assert_eq!(merged.cumulative_exp, 9_000);
    assert_eq!(merged.streak, 14, "the winning snapshot carries its own streak");
    assert_eq!(merged.rank, Rank::B);
    assert!(
        merged.titles_unlocked.iter().any(|t| t == "Novice Hunter"),
        "unlocks from the losing snapshot must survive"
    );
}

#[test]
fn test_merge_never_regresses_under_repetition() {
    let a = played_state("hunter", 10, 5_000);
    let b = played_state("hunter", 12, 4_000);

    let once = merge_states(&a, &b);
    let twice = merge_states(&once, &b);
    let thrice = merge_states(&a, &twice);

    assert_eq!(once, twice, "re-merging an absorbed snapshot changes nothing");
    assert_eq!(twice, thrice);
    assert_eq!(thrice.level, 12);
    assert_eq!(thrice.cumulative_exp, 5_000);
}

#[test]
fn test_backup_blob_restores_on_fresh_machine() {
    let old_machine = temp_store();
    let new_machine = temp_store();

    let mut state = played_state("mover", 8, 3_500);
    state.unlock_title("Shadow Soldier");
    save_state(&old_machine, None, &mut state, 10).unwrap();

    let blob = export_blob(&state).unwrap();

    // The new machine has never seen this account.
    assert!(new_machine.load_state("mover").unwrap().is_none());

    let mut restored = import_blob(&blob).unwrap();
    assert_eq!(restored, state);

    save_state(&new_machine, None, &mut restored, 20).unwrap();
    let loaded = load_state(&new_machine, None, "mover", 30).unwrap();
    assert_eq!(loaded.level, 8);
    assert_eq!(loaded.rank, Rank::C);
    assert!(loaded.titles_unlocked.iter().any(|t| t == "Shadow Soldier"));
}

#[test]
fn test_import_refuses_foreign_blob() {
    assert!(import_blob(r#"{"settings":{"theme":"dark"}}"#).is_err());
    assert!(import_blob("[]").is_err());
    assert!(import_blob("").is_err());
}
