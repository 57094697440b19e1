//! Local persistence: per-user save files, the account registry and the
//! active-session marker.
//!
//! Everything lives under the platform data directory resolved by the
//! `directories` crate. Saves are pretty-printed JSON, one file per
//! account; the registry maps usernames to SHA-256 password digests; the
//! session marker remembers which account to resume on next launch.

use crate::core::player::PlayerState;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::PathBuf;

const REGISTRY_FILE: &str = "registry.json";
const SESSION_FILE: &str = "session.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryEntry {
    username: String,
    password_hash: String,
    created_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Registry {
    users: Vec<RegistryEntry>,
}

pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    /// Opens the store at the platform data directory, creating it on
    /// first use.
    pub fn new() -> io::Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "arise").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine data directory")
        })?;
        Self::with_root(project_dirs.data_dir().to_path_buf())
    }

    /// Opens the store rooted at an explicit directory.
    pub fn with_root(data_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn state_path(&self, username: &str) -> PathBuf {
        self.data_dir
            .join(format!("state_{}.json", sanitize_username(username)))
    }

    pub fn save_state(&self, state: &PlayerState) -> io::Result<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.state_path(&state.username), json)
    }

    /// Loads the save for an account. A missing file is not an error:
    /// it just means the account has never been saved on this machine.
    pub fn load_state(&self, username: &str) -> io::Result<Option<PlayerState>> {
        let path = self.state_path(username);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let state = serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(state))
    }

    /// Removes an account's save file. Used by the termination protocol.
    pub fn delete_state(&self, username: &str) -> io::Result<()> {
        match fs::remove_file(self.state_path(username)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    // --- Account registry ---

    fn load_registry(&self) -> io::Result<Registry> {
        let path = self.data_dir.join(REGISTRY_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Registry::default()),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn save_registry(&self, registry: &Registry) -> io::Result<()> {
        let json = serde_json::to_string_pretty(registry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.data_dir.join(REGISTRY_FILE), json)
    }

    /// Registers a new account. Fails if the name is invalid or taken.
    pub fn register_user(&self, username: &str, password: &str, now: i64) -> io::Result<()> {
        validate_username(username)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        if password.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Password cannot be empty",
            ));
        }

        let mut registry = self.load_registry()?;
        let key = sanitize_username(username);
        if registry
            .users
            .iter()
            .any(|u| sanitize_username(&u.username) == key)
        {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Account '{}' already exists", username.trim()),
            ));
        }

        registry.users.push(RegistryEntry {
            username: username.trim().to_string(),
            password_hash: hash_password(password),
            created_at: now,
        });
        self.save_registry(&registry)
    }

    /// Checks credentials against the registry.
    pub fn verify_user(&self, username: &str, password: &str) -> io::Result<bool> {
        let registry = self.load_registry()?;
        let key = sanitize_username(username);
        Ok(registry
            .users
            .iter()
            .any(|u| sanitize_username(&u.username) == key && u.password_hash == hash_password(password)))
    }

    /// Removes an account from the registry. Used by the termination
    /// protocol alongside `delete_state`.
    pub fn remove_user(&self, username: &str) -> io::Result<()> {
        let mut registry = self.load_registry()?;
        let key = sanitize_username(username);
        registry.users.retain(|u| sanitize_username(&u.username) != key);
        self.save_registry(&registry)
    }

    // --- Session marker ---

    pub fn write_session(&self, username: &str) -> io::Result<()> {
        fs::write(self.data_dir.join(SESSION_FILE), username.trim())
    }

    pub fn read_session(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(self.data_dir.join(SESSION_FILE)) {
            Ok(name) if !name.trim().is_empty() => Ok(Some(name.trim().to_string())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn clear_session(&self) -> io::Result<()> {
        match fs::remove_file(self.data_dir.join(SESSION_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

pub fn validate_username(name: &str) -> Result<(), String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("Username cannot be empty".to_string());
    }

    if trimmed.len() > 24 {
        return Err("Username must be 24 characters or less".to_string());
    }

    let valid_chars = trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_');

    if !valid_chars {
        return Err(
            "Username can only contain letters, numbers, spaces, hyphens, and underscores"
                .to_string(),
        );
    }

    Ok(())
}

/// Filesystem-safe form of a username, also used as the registry key so
/// "Jin Woo" and "jin_woo" cannot coexist as separate accounts.
pub fn sanitize_username(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
