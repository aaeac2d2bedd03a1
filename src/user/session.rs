use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::user::LocalStore;
use crate::{now_ms, stable_hash64, CookedError, CookedResult};

pub const CURRENT_USER_KEY: &str = "cgg_user";
const MAX_USERNAME_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub joined_at: i64,
}

/// Profile fields a user can change. Stored per user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

pub fn customization_key(user_id: &str) -> String {
    format!("{}_{}", CURRENT_USER_KEY, user_id)
}

pub fn user_id_for(username: &str) -> String {
    format!("user_{:x}", stable_hash64(&username.to_lowercase()))
}

/// Mock auth: whoever logs in with a username is that user.
pub struct Session {
    store: Arc<LocalStore>,
    current: RwLock<Option<User>>,
}

impl Session {
    /// Restores the persisted user, if any.
    pub async fn restore(store: Arc<LocalStore>) -> Result<Self, String> {
        let current: Option<User> = store.get(CURRENT_USER_KEY).await?;
        if let Some(user) = current.as_ref() {
            tracing::info!(username = %user.username, "restored session");
        }
        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    pub async fn require_viewer(&self) -> CookedResult<User> {
        self.current_user().await.ok_or(CookedError::AuthRequired)
    }

    pub async fn login(&self, username: &str) -> CookedResult<User> {
        let username = validate_username(username)?;
        let id = user_id_for(&username);
        let key = customization_key(&id);
        let saved: Option<SavedProfile> =
            self.store.get(&key).await.map_err(CookedError::Storage)?;

        let mut user = User {
            id,
            display_name: username.clone(),
            username,
            bio: String::new(),
            avatar: None,
            joined_at: now_ms(),
        };
        match saved {
            Some(saved) => saved.apply_to(&mut user),
            None => self
                .store
                .set(&key, &SavedProfile::from_user(&user))
                .await
                .map_err(CookedError::Storage)?,
        }

        self.store
            .set(CURRENT_USER_KEY, &user)
            .await
            .map_err(CookedError::Storage)?;
        *self.current.write().await = Some(user.clone());
        tracing::info!(username = %user.username, "logged in");
        Ok(user)
    }

    pub async fn logout(&self) -> CookedResult<()> {
        let mut guard = self.current.write().await;
        self.store
            .remove(CURRENT_USER_KEY)
            .await
            .map_err(CookedError::Storage)?;
        if let Some(user) = guard.take() {
            tracing::info!(username = %user.username, "logged out");
        }
        Ok(())
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> CookedResult<User> {
        let mut guard = self.current.write().await;
        let mut user = guard.clone().ok_or(CookedError::AuthRequired)?;
        apply_update(&mut user, update);

        self.store
            .set(&customization_key(&user.id), &SavedProfile::from_user(&user))
            .await
            .map_err(CookedError::Storage)?;
        self.store
            .set(CURRENT_USER_KEY, &user)
            .await
            .map_err(CookedError::Storage)?;
        *guard = Some(user.clone());
        Ok(user)
    }
}

/// What survives a logout under `cgg_user_<id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedProfile {
    display_name: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
    #[serde(default)]
    joined_at: Option<i64>,
}

impl SavedProfile {
    fn from_user(user: &User) -> Self {
        Self {
            display_name: Some(user.display_name.clone()),
            bio: Some(user.bio.clone()),
            avatar: user.avatar.clone(),
            joined_at: Some(user.joined_at),
        }
    }

    fn apply_to(self, user: &mut User) {
        if let Some(joined_at) = self.joined_at {
            user.joined_at = joined_at;
        }
        apply_update(
            user,
            ProfileUpdate {
                display_name: self.display_name,
                bio: self.bio,
                avatar: self.avatar,
            },
        );
    }
}

fn validate_username(username: &str) -> CookedResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CookedError::Validation("username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(CookedError::Validation(format!(
            "username must be at most {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    Ok(username.to_string())
}

fn apply_update(user: &mut User, update: ProfileUpdate) {
    if let Some(display_name) = update.display_name {
        let display_name = display_name.trim();
        if !display_name.is_empty() {
            user.display_name = display_name.to_string();
        }
    }
    if let Some(bio) = update.bio {
        user.bio = bio.trim().to_string();
    }
    if let Some(avatar) = update.avatar {
        user.avatar = Some(avatar).filter(|value| !value.trim().is_empty());
    }
}
