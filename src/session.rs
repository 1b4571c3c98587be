use crate::model::{Store, User};
use crate::store::STORE_DIR;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILENAME: &str = "session.json";

/// The logged-in user, persisted explicitly between invocations. Loaded and
/// saved only at command boundaries; everything below the CLI receives the
/// resolved user as an argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
}

fn session_path() -> PathBuf {
    Path::new(STORE_DIR).join(SESSION_FILENAME)
}

pub fn load() -> Result<Option<Session>, String> {
    let path = session_path();
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path).map_err(|e| format!("cannot read session: {e}"))?;
    let session = serde_json::from_str(&data).map_err(|e| format!("invalid session JSON: {e}"))?;
    Ok(Some(session))
}

pub fn save(session: &Session) -> Result<(), String> {
    let json = serde_json::to_string_pretty(session)
        .map_err(|e| format!("failed to serialize session: {e}"))?;
    fs::write(session_path(), json).map_err(|e| format!("failed to write session: {e}"))
}

pub fn clear() -> Result<(), String> {
    let path = session_path();
    if path.exists() {
        fs::remove_file(&path).map_err(|e| format!("failed to remove session: {e}"))?;
    }
    Ok(())
}

/// Resolve the session to a user, erroring if nobody is logged in or the
/// session points at an account that no longer exists.
pub fn current_user<'a>(store: &'a Store) -> Result<&'a User, String> {
    let session = load()?.ok_or("not logged in (run 'bt login' first)")?;
    store
        .users
        .get(&session.user_id)
        .ok_or_else(|| "session user no longer exists (run 'bt login' again)".to_string())
}
