use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::http::AuthHttpClient;
use crate::session::User;

use super::{expect_json, expect_success};

/// User formatted for pickers and lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDisplay {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
}

impl From<User> for UserDisplay {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            last_name: user.last_name,
            full_name,
        }
    }
}

/// Partial user update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Bindings for /users and the admin password reset. All calls go through the
/// interceptor and therefore carry the bearer credential.
pub struct UserApi {
    http: AuthHttpClient,
    config: Arc<Settings>,
}

impl UserApi {
    pub fn new(http: AuthHttpClient, config: Arc<Settings>) -> Self {
        Self { http, config }
    }

    /// Active users only, formatted for display.
    pub async fn get_users(&self) -> crate::Result<Vec<UserDisplay>> {
        let url = self.config.api.endpoint("/users");
        let response = self.http.send(self.http.get(&url)).await?;
        let users: Vec<User> = expect_json(response).await?;
        Ok(users
            .into_iter()
            .filter(|user| user.active.unwrap_or(false))
            .map(UserDisplay::from)
            .collect())
    }

    /// Full records, active or not; used by the admin users list.
    pub async fn get_all_users(&self) -> crate::Result<Vec<User>> {
        let url = self.config.api.endpoint("/users");
        let response = self.http.send(self.http.get(&url)).await?;
        expect_json(response).await
    }

    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> crate::Result<User> {
        let url = self.config.api.endpoint(&format!("/users/{}", user_id));
        let response = self.http.send(self.http.put(&url).json(update)).await?;
        expect_json(response).await
    }

    /// Soft delete; the backend marks the user inactive.
    pub async fn delete_user(&self, user_id: &str) -> crate::Result<()> {
        let url = self.config.api.endpoint(&format!("/users/{}", user_id));
        let response = self.http.send(self.http.delete(&url)).await?;
        expect_success(response).await?;
        Ok(())
    }

    /// Admin-only password reset. Unlike the session controller's auth calls
    /// this goes through the interceptor, so the admin's own bearer token is
    /// attached.
    pub async fn admin_reset_password(
        &self,
        user_id: &str,
        new_password: &str,
        force_change_on_next_login: bool,
    ) -> crate::Result<()> {
        let url = self.config.api.endpoint("/auth/admin-reset-password");
        let response = self
            .http
            .send(self.http.post(&url).json(&serde_json::json!({
                "userId": user_id,
                "newPassword": new_password,
                "forceChangeOnNextLogin": force_change_on_next_login,
            })))
            .await?;
        expect_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_update_skips_absent_fields() {
        let update = UserUpdate {
            name: Some("Mario".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).expect("Failed to serialize update");
        assert_eq!(json, r#"{"name":"Mario"}"#);
    }

    #[test]
    fn test_user_display_full_name() {
        let user = User {
            id: "3".to_string(),
            username: "mrossi".to_string(),
            email: None,
            name: Some("Mario".to_string()),
            last_name: Some("Rossi".to_string()),
            is_admin: None,
            active: Some(true),
            created_at: None,
            last_active_at: None,
        };
        let display = UserDisplay::from(user);
        assert_eq!(display.full_name, "Mario Rossi");
    }
}
