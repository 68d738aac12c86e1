use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tourney_api::User;

/// Process-wide session: bearer token plus the identity used for ownership
/// checks. Initialised explicitly at startup from disk, written on login,
/// deleted on logout — passed through `AppState`, never a hidden global.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// Ownership comparison for owner-gated actions. Evaluated per render
    /// against the most recent tournament data, so an identity change takes
    /// effect on the next refresh.
    pub fn owns(&self, owner_id: u64) -> bool {
        self.user.as_ref().is_some_and(|u| u.id == owner_id)
    }

    pub fn load() -> Self {
        Self::load_from(&session_path())
    }

    pub fn establish(&mut self, token: String, user: User) {
        self.token = Some(token);
        self.user = Some(user);
        if let Err(e) = self.save_to(&session_path()) {
            log::warn!("could not persist session: {e}");
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
        let _ = std::fs::remove_file(session_path());
    }

    fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("create dir failed: {e}"))?;
        }
        let payload = serde_json::to_string_pretty(self)
            .map_err(|e| format!("serialize session failed: {e}"))?;
        std::fs::write(path, payload).map_err(|e| format!("write session failed: {e}"))
    }
}

fn session_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("podtui").join("session.json");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("podtui")
            .join("session.json");
    }
    PathBuf::from("session.json")
}
