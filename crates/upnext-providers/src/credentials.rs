//! Cached credential storage.
//!
//! The credential file holds an `authorized_user` record: the client identity
//! plus a long-lived refresh token. It is read back verbatim on later runs
//! and only ever replaced as a whole.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};
use crate::provisioning::{ClientSecretRecord, OAuthCredentials};

/// The only record type upnext reads or writes.
pub const AUTHORIZED_USER: &str = "authorized_user";

/// Persisted credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Always [`AUTHORIZED_USER`].
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl CredentialRecord {
    /// Builds an `authorized_user` record.
    pub fn authorized_user(credentials: &OAuthCredentials, refresh_token: impl Into<String>) -> Self {
        Self {
            kind: AUTHORIZED_USER.to_string(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Checks the type tag and that no field is empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind != AUTHORIZED_USER {
            return Err(format!(
                "unsupported credential type '{}', expected '{}'",
                self.kind, AUTHORIZED_USER
            ));
        }
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ] {
            if value.is_empty() {
                return Err(format!("'{}' is empty", name));
            }
        }
        Ok(())
    }

    /// The client identity this record was minted for.
    pub fn credentials(&self) -> OAuthCredentials {
        OAuthCredentials::new(&self.client_id, &self.client_secret)
    }
}

/// File-backed credential store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    provisioning_path: PathBuf,
}

impl CredentialStore {
    /// Creates a store for the credential file at `path`.
    ///
    /// `provisioning_path` is consulted when a new refresh token is persisted.
    pub fn new(path: impl Into<PathBuf>, provisioning_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            provisioning_path: provisioning_path.into(),
        }
    }

    /// Returns the credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached credential, reporting why it is unusable.
    pub fn read(&self) -> AuthResult<CredentialRecord> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            AuthError::credential_read(&self.path, format!("failed to read file: {}", e))
                .with_source(e)
        })?;

        let record: CredentialRecord = serde_json::from_str(&content).map_err(|e| {
            AuthError::credential_read(&self.path, format!("failed to parse file: {}", e))
                .with_source(e)
        })?;

        record
            .validate()
            .map_err(|e| AuthError::credential_read(&self.path, e))?;

        Ok(record)
    }

    /// Loads the cached credential.
    ///
    /// Every failure, whether the file is missing, unreadable or malformed,
    /// yields `None`: the caller re-authorizes in all of these cases.
    pub fn load(&self) -> Option<CredentialRecord> {
        match self.read() {
            Ok(record) => {
                info!("loaded credential from {}", self.path.display());
                Some(record)
            }
            Err(e) => {
                debug!("no usable credential: {}", e);
                None
            }
        }
    }

    /// Replaces the credential file with `record`.
    pub fn save(&self, record: &CredentialRecord) -> AuthResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::credential_write(
                    &self.path,
                    format!("failed to create directory {}: {}", parent.display(), e),
                )
                .with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(record).map_err(|e| {
            AuthError::credential_write(&self.path, format!("failed to serialize: {}", e))
                .with_source(e)
        })?;

        // Write next to the target and rename over it so readers never see a
        // partial file.
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| {
            AuthError::credential_write(&self.path, format!("failed to write: {}", e))
                .with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            AuthError::credential_write(&self.path, format!("failed to replace file: {}", e))
                .with_source(e)
        })?;

        info!("saved credential to {}", self.path.display());
        Ok(())
    }

    /// Persists a freshly issued refresh token.
    ///
    /// The client identity is read from the provisioning file, so a
    /// provisioning failure surfaces here before anything is written.
    pub fn persist_refresh_token(&self, refresh_token: &str) -> AuthResult<CredentialRecord> {
        let provisioning = ClientSecretRecord::from_file(&self.provisioning_path)?;
        let record = CredentialRecord::authorized_user(&provisioning.credentials(), refresh_token);
        self.save(&record)?;
        Ok(record)
    }

    /// Deletes the credential file.
    ///
    /// Returns `Ok(false)` if there was nothing to delete.
    pub fn clear(&self) -> AuthResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("removed credential file {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AuthError::credential_write(
                &self.path,
                format!("failed to remove: {}", e),
            )
            .with_source(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;
    use tempfile::{TempDir, tempdir};

    const PROVISIONING: &str =
        r#"{"installed":{"client_id":"A","client_secret":"B","redirect_uris":["http://localhost"]}}"#;

    fn store_in(dir: &TempDir) -> CredentialStore {
        let provisioning = dir.path().join("credentials.json");
        fs::write(&provisioning, PROVISIONING).unwrap();
        CredentialStore::new(dir.path().join("token.json"), provisioning)
    }

    fn record() -> CredentialRecord {
        CredentialRecord::authorized_user(&OAuthCredentials::new("id", "secret"), "refresh")
    }

    #[test]
    fn load_missing_file_is_absent() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().is_none());
        assert_eq!(
            store.read().unwrap_err().category(),
            ErrorCategory::CredentialRead
        );
    }

    #[test]
    fn load_malformed_file_is_absent() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_none());
        assert!(store.read().unwrap_err().to_string().contains("parse"));
    }

    #[test]
    fn load_wrong_type_or_empty_field_is_absent() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(
            store.path(),
            r#"{"type":"service_account","client_id":"a","client_secret":"b","refresh_token":"c"}"#,
        )
        .unwrap();
        assert!(store.load().is_none());

        fs::write(
            store.path(),
            r#"{"type":"authorized_user","client_id":"a","client_secret":"b","refresh_token":""}"#,
        )
        .unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn load_well_formed_file() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"type":"authorized_user","client_id":"a","client_secret":"b","refresh_token":"c","universe_domain":"googleapis.com"}"#,
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.kind, "authorized_user");
        assert_eq!(loaded.client_id, "a");
        assert_eq!(loaded.client_secret, "b");
        assert_eq!(loaded.refresh_token, "c");
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap(), record());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn save_overwrites_whole_record() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();

        let replacement =
            CredentialRecord::authorized_user(&OAuthCredentials::new("id2", "secret2"), "r2");
        store.save(&replacement).unwrap();
        assert_eq!(store.load().unwrap(), replacement);
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(
            dir.path().join("nested").join("token.json"),
            dir.path().join("credentials.json"),
        );
        store.save(&record()).unwrap();
        assert!(store.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn saved_layout() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "authorized_user",
                "client_id": "id",
                "client_secret": "secret",
                "refresh_token": "refresh"
            })
        );
    }

    #[test]
    fn persist_refresh_token_uses_provisioning_identity() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let saved = store.persist_refresh_token("R").unwrap();
        assert_eq!(saved.client_id, "A");
        assert_eq!(saved.client_secret, "B");
        assert_eq!(store.load().unwrap(), saved);
    }

    #[test]
    fn persist_without_provisioning_file_fails_and_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(
            dir.path().join("token.json"),
            dir.path().join("missing.json"),
        );
        let err = store.persist_refresh_token("R").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Provisioning);
        assert!(!store.path().exists());
    }

    #[test]
    fn save_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = CredentialStore::new(blocker.join("token.json"), dir.path().join("c.json"));
        let err = store.save(&record()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::CredentialWrite);
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.clear().unwrap());
        store.save(&record()).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.path().exists());
        assert!(store.load().is_none());
    }
}
