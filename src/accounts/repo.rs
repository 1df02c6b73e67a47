use std::path::PathBuf;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::accounts::dto::{PublicUser, UpdateProfileRequest};
use crate::accounts::errors::StoreError;
use crate::accounts::password::{hash_password, verify_password};
use crate::accounts::repo_types::{default_theme, AccountsFile, User};

/// Page cap when listing without a query.
const EMPTY_QUERY_CAP: usize = 50;
/// Result cap for non-empty search queries.
const SEARCH_CAP: usize = 20;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// The account store: the in-memory user collection plus its backing file.
///
/// The collection is the source of truth; every mutation rewrites the whole
/// file. Mutating operations hold the write lock across check-and-mutate so
/// two concurrent registrations cannot both pass the uniqueness check. The
/// file write itself happens on a snapshot after the write lock is released,
/// ordered by `file_lock` so a stale snapshot can never overwrite a newer one.
pub struct AccountStore {
    path: PathBuf,
    users: RwLock<Vec<User>>,
    file_lock: Mutex<()>,
}

#[derive(Serialize)]
struct FileView<'a> {
    users: &'a [User],
}

impl AccountStore {
    /// Load the backing file. A missing or unreadable file bootstraps an
    /// empty collection and writes it out immediately; startup never fails
    /// on account of the file.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<AccountsFile>(&bytes) {
                Ok(doc) => {
                    info!(count = doc.users.len(), path = %path.display(), "loaded accounts");
                    Some(doc.users)
                }
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "accounts file unreadable, starting empty");
                    None
                }
            },
            Err(_) => {
                info!(path = %path.display(), "accounts file missing, creating");
                None
            }
        };

        match users {
            Some(users) => Self {
                path,
                users: RwLock::new(users),
                file_lock: Mutex::new(()),
            },
            None => {
                let store = Self {
                    path,
                    users: RwLock::new(Vec::new()),
                    file_lock: Mutex::new(()),
                };
                let order = store.file_lock.lock().await;
                store.persist(&[], order).await;
                store
            }
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn register(
        &self,
        display_name: &str,
        username: &str,
        password: &str,
    ) -> Result<PublicUser, StoreError> {
        let display_name = display_name.trim();
        let username = username.trim();
        if display_name.is_empty() || username.is_empty() || password.trim().is_empty() {
            return Err(StoreError::Validation("All fields are required".into()));
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(StoreError::Validation(
                "Username must be at least 3 characters".into(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StoreError::Validation(
                "Password must be at least 6 characters".into(),
            ));
        }

        let password_hash = hash_password(password)?;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            username: username.to_string(),
            password_hash,
            avatar: None,
            theme: default_theme(),
            created_at: now,
            last_seen: now,
            updated_at: None,
        };

        let needle = username.to_lowercase();
        let (snapshot, order) = {
            let mut users = self.users.write().await;
            if users.iter().any(|u| u.username.to_lowercase() == needle) {
                return Err(StoreError::Conflict);
            }
            users.push(user.clone());
            let order = self.file_lock.lock().await;
            (users.clone(), order)
        };
        self.persist(&snapshot, order).await;

        Ok(PublicUser::from_record(&user))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<PublicUser, StoreError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::Validation("All fields are required".into()));
        }

        let needle = username.to_lowercase();
        let stored_hash = {
            let users = self.users.read().await;
            users
                .iter()
                .find(|u| u.username.to_lowercase() == needle)
                .map(|u| u.password_hash.clone())
                .ok_or(StoreError::NotFound)?
        };
        // Argon2 is deliberately slow; verify outside any lock so the store
        // stays available while it runs.
        if !verify_password(password, &stored_hash)? {
            return Err(StoreError::Auth);
        }

        let (user, snapshot, order) = {
            let mut users = self.users.write().await;
            // Re-find: the account may have been renamed while verifying.
            let found = users
                .iter_mut()
                .find(|u| u.username.to_lowercase() == needle)
                .ok_or(StoreError::NotFound)?;
            found.last_seen = OffsetDateTime::now_utc();
            let user = found.clone();
            let order = self.file_lock.lock().await;
            (user, users.clone(), order)
        };
        self.persist(&snapshot, order).await;

        Ok(PublicUser::from_record(&user))
    }

    pub async fn list_users(&self) -> Vec<PublicUser> {
        let now = OffsetDateTime::now_utc();
        let users = self.users.read().await;
        users
            .iter()
            .map(|u| PublicUser::with_presence(u, now))
            .collect()
    }

    pub async fn search_users(&self, query: &str) -> Vec<PublicUser> {
        let now = OffsetDateTime::now_utc();
        let q = query.trim().to_lowercase();
        let users = self.users.read().await;
        if q.is_empty() {
            return users
                .iter()
                .take(EMPTY_QUERY_CAP)
                .map(|u| PublicUser::with_presence(u, now))
                .collect();
        }
        users
            .iter()
            .filter(|u| {
                u.username.to_lowercase().contains(&q)
                    || u.display_name.to_lowercase().contains(&q)
            })
            .take(SEARCH_CAP)
            .map(|u| PublicUser::with_presence(u, now))
            .collect()
    }

    pub async fn update_profile(
        &self,
        req: &UpdateProfileRequest,
    ) -> Result<PublicUser, StoreError> {
        let new_username = req
            .username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let new_display_name = req
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(name) = new_username {
            if name.chars().count() < MIN_USERNAME_LEN {
                return Err(StoreError::Validation(
                    "Username must be at least 3 characters".into(),
                ));
            }
        }

        // Verification and re-hashing are slow argon2 work; run them before
        // taking the write lock so unrelated requests are not stalled.
        let new_hash = match (req.current_password.as_deref(), req.new_password.as_deref()) {
            (Some(current), Some(new)) => {
                let stored_hash = {
                    let users = self.users.read().await;
                    users
                        .iter()
                        .find(|u| u.id == req.user_id)
                        .map(|u| u.password_hash.clone())
                        .ok_or(StoreError::NotFound)?
                };
                if !verify_password(current, &stored_hash)? {
                    return Err(StoreError::Auth);
                }
                if new.chars().count() < MIN_PASSWORD_LEN {
                    return Err(StoreError::Validation(
                        "Password must be at least 6 characters".into(),
                    ));
                }
                Some(hash_password(new)?)
            }
            _ => None,
        };

        let (user, snapshot, order) = {
            let mut users = self.users.write().await;
            let idx = users
                .iter()
                .position(|u| u.id == req.user_id)
                .ok_or(StoreError::NotFound)?;

            if let Some(name) = new_username {
                let needle = name.to_lowercase();
                if users
                    .iter()
                    .any(|u| u.id != req.user_id && u.username.to_lowercase() == needle)
                {
                    return Err(StoreError::Conflict);
                }
            }

            if let Some(hash) = new_hash {
                users[idx].password_hash = hash;
            }

            if let Some(name) = new_display_name {
                users[idx].display_name = name.to_string();
            }
            if let Some(name) = new_username {
                users[idx].username = name.to_string();
            }
            if let Some(avatar) = req.avatar.as_deref() {
                // Only embedded image data is accepted; anything else is ignored.
                if avatar.starts_with("data:image") {
                    users[idx].avatar = Some(avatar.to_string());
                }
            }
            users[idx].updated_at = Some(OffsetDateTime::now_utc());

            let user = users[idx].clone();
            let order = self.file_lock.lock().await;
            (user, users.clone(), order)
        };
        self.persist(&snapshot, order).await;

        Ok(PublicUser::from_record(&user))
    }

    /// Full-collection overwrite of the backing file. The order guard is
    /// taken while the write lock is still held, so snapshots reach the
    /// file in mutation order. A failed write is logged and swallowed; the
    /// in-memory mutation already took effect.
    async fn persist(&self, snapshot: &[User], _order: MutexGuard<'_, ()>) {
        if let Err(e) = self.write_snapshot(snapshot).await {
            warn!(error = %e, path = %self.path.display(), "failed to persist accounts");
        }
    }

    async fn write_snapshot(&self, snapshot: &[User]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&FileView { users: snapshot })
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        Ok(())
    }
}
