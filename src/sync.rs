//! Glue between the local store, the remote mirror and the merge rules,
//! plus the user-facing export/import blobs.
//!
//! The local save is the source of truth; the remote mirror is strictly
//! best-effort. Loading reconciles both sides through `merge_states`;
//! saving writes locally first, then pushes to the mirror on a
//! background thread so a slow endpoint never blocks the caller.

use crate::core::merge::merge_states;
use crate::core::player::PlayerState;
use crate::error::GameError;
use crate::local_store::LocalStore;
use crate::remote_store::RemoteStore;
use std::io;

/// Loads an account's state, reconciling the local save with the remote
/// mirror. A missing local save means a fresh account; a dead mirror
/// degrades silently to local-only.
pub fn load_state(
    local: &LocalStore,
    remote: Option<&RemoteStore>,
    username: &str,
    now: i64,
) -> io::Result<PlayerState> {
    let local_state = local
        .load_state(username)?
        .unwrap_or_else(|| PlayerState::new(username, now));

    let Some(remote) = remote else {
        return Ok(local_state);
    };

    match remote.fetch_state(username) {
        Ok(Some(remote_state)) => Ok(merge_states(&local_state, &remote_state)),
        Ok(None) => Ok(local_state),
        Err(err) => {
            eprintln!("remote load skipped: {}", err);
            Ok(local_state)
        }
    }
}

/// Persists the state: local write synchronously, remote push in the
/// background. Only the local write can fail the call.
pub fn save_state(
    local: &LocalStore,
    remote: Option<&RemoteStore>,
    state: &mut PlayerState,
    now: i64,
) -> io::Result<()> {
    state.last_saved_at = now;
    local.save_state(state)?;

    if let Some(remote) = remote {
        let remote = remote.clone();
        let snapshot = state.clone();
        std::thread::spawn(move || {
            if let Err(err) = remote.push_state(&snapshot) {
                eprintln!("remote push failed: {}", err);
            }
        });
    }

    Ok(())
}

/// Serializes the state to the user-facing backup blob.
pub fn export_blob(state: &PlayerState) -> io::Result<String> {
    serde_json::to_string_pretty(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Parses a user-supplied backup blob. The blob must at least look like
/// one of ours: a JSON object carrying a `username` or `level` field.
/// Missing newer fields fill with defaults, so old backups stay loadable.
pub fn import_blob(json: &str) -> Result<PlayerState, GameError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| GameError::Validation(format!("not valid JSON: {}", e)))?;

    let looks_like_save = value
        .as_object()
        .map(|obj| obj.contains_key("username") || obj.contains_key("level"))
        .unwrap_or(false);
    if !looks_like_save {
        return Err(GameError::Validation(
            "blob is not an exported save".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| GameError::Validation(format!("malformed save blob: {}", e)))
}
