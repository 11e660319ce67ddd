use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Token expiry time in minutes.
/// Service-issued access tokens expire after an hour.
const TOKEN_EXPIRY_MINUTES: i64 = 60;

/// The signed-in identity: an opaque bearer token plus the user id the
/// service issued it for. The user id doubles as the cache scope key for
/// every per-user dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(user_id: String, token: String) -> Self {
        Self {
            token,
            user_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        let expiry = self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES);
        Utc::now() > expiry
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        let expiry = self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES);
        (expiry - Utc::now()).num_minutes().max(0)
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. Returns true when a non-expired session was
    /// found; expired sessions on disk are ignored.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    /// Get the user id if a session exists
    pub fn user_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.user_id.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut session = Session::new(temp_dir.path().to_path_buf());
        session.update(SessionData::new("alice".to_string(), "tok-123".to_string()));
        session.save().unwrap();

        let mut reloaded = Session::new(temp_dir.path().to_path_buf());
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.user_id(), Some("alice"));
        assert_eq!(reloaded.token(), Some("tok-123"));
        assert!(reloaded.is_valid());
    }

    #[test]
    fn test_expired_session_not_loaded() {
        let temp_dir = TempDir::new().unwrap();

        let mut session = Session::new(temp_dir.path().to_path_buf());
        let mut data = SessionData::new("alice".to_string(), "tok-123".to_string());
        data.created_at = Utc::now() - Duration::minutes(TOKEN_EXPIRY_MINUTES + 1);
        session.update(data);
        session.save().unwrap();

        let mut reloaded = Session::new(temp_dir.path().to_path_buf());
        assert!(!reloaded.load().unwrap());
        assert!(reloaded.data.is_none());
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();

        let mut session = Session::new(temp_dir.path().to_path_buf());
        session.update(SessionData::new("alice".to_string(), "tok-123".to_string()));
        session.save().unwrap();
        session.clear().unwrap();

        let mut reloaded = Session::new(temp_dir.path().to_path_buf());
        assert!(!reloaded.load().unwrap());

        // Clearing again with nothing on disk is a no-op
        session.clear().unwrap();
    }

    #[test]
    fn test_minutes_until_expiry() {
        let data = SessionData::new("alice".to_string(), "tok".to_string());
        let minutes = data.minutes_until_expiry();
        assert!(minutes > 0 && minutes <= TOKEN_EXPIRY_MINUTES);
        assert!(!data.is_expired());
    }
}
