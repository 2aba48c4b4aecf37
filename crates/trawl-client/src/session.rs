//! Process-wide bearer credential.
//!
//! A [`Session`] is cheap to clone; every clone shares the same credential.
//! It may be backed by a credentials file (`~/.trawl/credentials` by default)
//! so `trawl auth login` survives across invocations. When the backend
//! rejects the credential, [`Session::clear`] drops it from memory and disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::ClientError;

#[derive(Debug, Default)]
struct SessionInner {
    token: RwLock<Option<String>>,
    credentials_path: Option<PathBuf>,
}

/// Shared bearer credential state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// A session with no credential and no backing file.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An in-memory session holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::default();
        session.set_token(token);
        session
    }

    /// Resolve the credential for this process.
    ///
    /// Priority: explicitly configured token → credentials file. The file
    /// path is remembered either way so [`store`](Self::store) and
    /// [`clear`](Self::clear) keep it in sync.
    #[must_use]
    pub fn resolve(configured_token: &str, credentials_path: Option<PathBuf>) -> Self {
        let token = Some(configured_token.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| credentials_path.as_deref().and_then(load_file));
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(token),
                credentials_path,
            }),
        }
    }

    /// Current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Replace the in-memory token without touching the credentials file.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let value = (!token.trim().is_empty()).then_some(token);
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Set the token and persist it to the credentials file, if one is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CredentialStore`] if the file cannot be written.
    pub fn store(&self, token: &str) -> Result<(), ClientError> {
        if let Some(path) = &self.inner.credentials_path {
            store_file(path, token)?;
        }
        self.set_token(token);
        Ok(())
    }

    /// Drop the credential from memory and from the credentials file.
    ///
    /// File removal failures are logged, not returned: the in-memory token
    /// is always gone afterwards.
    pub fn clear(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        if let Some(path) = &self.inner.credentials_path {
            if path.exists() {
                if let Err(error) = fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), %error, "failed to delete credentials file");
                }
            }
        }
    }

    #[must_use]
    pub fn credentials_path(&self) -> Option<&Path> {
        self.inner.credentials_path.as_deref()
    }
}

// --- Private file helpers ---

fn store_file(path: &Path, token: &str) -> Result<(), ClientError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ClientError::CredentialStore(format!("mkdir {}: {e}", parent.display())))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
            }
        }
    }
    fs::write(path, token)
        .map_err(|e| ClientError::CredentialStore(format!("write {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| ClientError::CredentialStore(format!("chmod {}: {e}", path.display())))?;
    }

    Ok(())
}

fn load_file(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
