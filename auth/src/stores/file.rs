//! Directory-backed session store.
//!
//! Layout inside the store directory:
//!
//! ```text
//! session.json           serialized `Session` (user and token together)
//! onboarding_completed   "true" once onboarding finished
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use univent_core::types::{Session, SessionToken, User};
use univent_core::{Result, UniventError};
use uuid::Uuid;

use crate::providers::SessionStore;

const SESSION_FILE: &str = "session.json";
const ONBOARDING_FILE: &str = "onboarding_completed";

/// File-backed session store.
///
/// User and token live in one file that is written to a uniquely named temp
/// file and renamed into place. A reader sees either the previous session or
/// the new one, never a user paired with another user's token.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`.
    ///
    /// The directory is created lazily on the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the session files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn storage_error(context: &str, error: &io::Error) -> UniventError {
    UniventError::Storage(format!("{context}: {error}"))
}

async fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

async fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> impl Future<Output = Option<Session>> + Send {
        let path = self.dir.join(SESSION_FILE);

        async move {
            let contents = match read_optional(&path).await {
                Ok(Some(contents)) => contents,
                Ok(None) => return None,
                Err(error) => {
                    tracing::warn!(%error, "Failed to read persisted session");
                    return None;
                },
            };

            match serde_json::from_str::<Session>(&contents) {
                Ok(session) if session.token.as_str().trim().is_empty() => {
                    tracing::warn!("Persisted session token is empty");
                    None
                },
                Ok(session) => Some(session),
                Err(error) => {
                    tracing::warn!(%error, "Failed to decode persisted session");
                    None
                },
            }
        }
    }

    fn save(&self, user: &User, token: &SessionToken) -> impl Future<Output = Result<()>> + Send {
        let dir = self.dir.clone();
        let encoded = serde_json::to_string(&Session {
            user: user.clone(),
            token: token.clone(),
        });

        async move {
            let contents =
                encoded.map_err(|e| UniventError::Storage(format!("encode session: {e}")))?;

            fs::create_dir_all(&dir)
                .await
                .map_err(|e| storage_error("create session directory", &e))?;

            let tmp = dir.join(format!("{SESSION_FILE}.{}.tmp", Uuid::new_v4().simple()));

            let written: io::Result<()> = async {
                fs::write(&tmp, contents).await?;
                fs::rename(&tmp, dir.join(SESSION_FILE)).await
            }
            .await;

            if let Err(error) = written {
                if let Err(cleanup) = remove_if_present(&tmp).await {
                    tracing::warn!(path = %tmp.display(), error = %cleanup, "Failed to remove partial session file");
                }
                return Err(storage_error("write session", &error));
            }

            tracing::debug!(dir = %dir.display(), "Session persisted");
            Ok(())
        }
    }

    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        let path = self.dir.join(SESSION_FILE);

        async move {
            remove_if_present(&path)
                .await
                .map_err(|e| storage_error("clear session", &e))
        }
    }

    fn is_onboarding_completed(&self) -> impl Future<Output = bool> + Send {
        let path = self.dir.join(ONBOARDING_FILE);

        async move {
            match read_optional(&path).await {
                Ok(flag) => flag.is_some_and(|value| value.trim() == "true"),
                Err(error) => {
                    tracing::warn!(%error, "Failed to read onboarding flag");
                    false
                },
            }
        }
    }

    fn mark_onboarding_completed(&self) -> impl Future<Output = ()> + Send {
        let dir = self.dir.clone();

        async move {
            let written: io::Result<()> = async {
                fs::create_dir_all(&dir).await?;
                fs::write(dir.join(ONBOARDING_FILE), "true").await
            }
            .await;

            if let Err(error) = written {
                tracing::warn!(%error, "Failed to record onboarding completion");
            }
        }
    }
}
