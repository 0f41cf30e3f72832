//! The typed configuration record and key-based access helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Base URL used when neither the config file nor the environment supply one.
pub const DEFAULT_API_URL: &str = "https://api.mgzon.com/v1";

/// Keys accepted by `mz config set`. Identity fields (userId, email, role
/// flags, session) are written by `login` only and are not settable by hand.
pub const SETTABLE_KEYS: &[&str] = &[
    "apiKey",
    "apiUrl",
    "defaultEnvironment",
    "theme",
    "editor",
    "currentProject",
];

/// The flat record persisted at `<home>/.mgzon/config.json`.
///
/// Wire names are camelCase to match what the platform's other clients write.
/// Every field is optional; a missing file deserializes to all-`None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    /// Bearer credential for the MGZON API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the MGZON API; [`DEFAULT_API_URL`] when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Environment targeted by default (`production`, `staging`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<String>,
    /// Platform user identifier resolved at login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Account email resolved at login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name resolved at login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Primary role name resolved at login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Whether the account carries the developer role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_developer: Option<bool>,
    /// Whether the account carries the seller role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_seller: Option<bool>,
    /// Whether the account carries the admin role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Terminal theme preference recorded by `mz setup`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Preferred editor recorded by `mz setup`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    /// Project most recently initialised or deployed from this machine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_project: Option<String>,
    /// Timestamp of the last successful login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    /// Session token returned by the login endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Expiry of the session token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CliConfig {
    /// Base URL to use for requests, falling back to [`DEFAULT_API_URL`].
    #[must_use]
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Clear credential and identity fields, leaving preferences intact.
    ///
    /// Used by `mz logout`: apiKey, sessionToken, expiresAt and the resolved
    /// profile are dropped; apiUrl, theme, editor, defaultEnvironment and
    /// currentProject survive.
    pub fn clear_credentials(&mut self) {
        self.api_key = None;
        self.session_token = None;
        self.expires_at = None;
        self.user_id = None;
        self.email = None;
        self.name = None;
        self.role = None;
        self.is_developer = None;
        self.is_seller = None;
        self.is_admin = None;
        self.last_login = None;
    }

    /// Shallow-merge `self` over `base`: fields set here win, fields left
    /// `None` keep whatever `base` holds.
    #[must_use]
    pub fn merged_over(self, base: Self) -> Self {
        Self {
            api_key: self.api_key.or(base.api_key),
            api_url: self.api_url.or(base.api_url),
            default_environment: self.default_environment.or(base.default_environment),
            user_id: self.user_id.or(base.user_id),
            email: self.email.or(base.email),
            name: self.name.or(base.name),
            role: self.role.or(base.role),
            is_developer: self.is_developer.or(base.is_developer),
            is_seller: self.is_seller.or(base.is_seller),
            is_admin: self.is_admin.or(base.is_admin),
            theme: self.theme.or(base.theme),
            editor: self.editor.or(base.editor),
            current_project: self.current_project.or(base.current_project),
            last_login: self.last_login.or(base.last_login),
            session_token: self.session_token.or(base.session_token),
            expires_at: self.expires_at.or(base.expires_at),
        }
    }

    /// Read a field by its wire name. `None` when the field is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] when `key` does not name a field.
    pub fn get_key(&self, key: &str) -> ConfigResult<Option<String>> {
        let value = match key {
            "apiKey" => self.api_key.clone(),
            "apiUrl" => self.api_url.clone(),
            "defaultEnvironment" => self.default_environment.clone(),
            "userId" => self.user_id.clone(),
            "email" => self.email.clone(),
            "name" => self.name.clone(),
            "role" => self.role.clone(),
            "isDeveloper" => self.is_developer.map(|flag| flag.to_string()),
            "isSeller" => self.is_seller.map(|flag| flag.to_string()),
            "isAdmin" => self.is_admin.map(|flag| flag.to_string()),
            "theme" => self.theme.clone(),
            "editor" => self.editor.clone(),
            "currentProject" => self.current_project.clone(),
            "lastLogin" => self.last_login.map(|ts| ts.to_rfc3339()),
            "sessionToken" => self.session_token.clone(),
            "expiresAt" => self.expires_at.map(|ts| ts.to_rfc3339()),
            other => {
                return Err(ConfigError::UnknownKey {
                    key: other.to_string(),
                });
            }
        };
        Ok(value)
    }

    /// Set one of the [`SETTABLE_KEYS`] by its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] for anything outside that list,
    /// including valid-but-login-owned fields such as `email`.
    pub fn set_key(&mut self, key: &str, value: String) -> ConfigResult<()> {
        match key {
            "apiKey" => self.api_key = Some(value),
            "apiUrl" => self.api_url = Some(value),
            "defaultEnvironment" => self.default_environment = Some(value),
            "theme" => self.theme = Some(value),
            "editor" => self.editor = Some(value),
            "currentProject" => self.current_project = Some(value),
            other => {
                return Err(ConfigError::UnknownKey {
                    key: other.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether the named field holds a secret that must be redacted on output.
    #[must_use]
    pub fn is_secret_key(key: &str) -> bool {
        matches!(key, "apiKey" | "sessionToken")
    }
}

/// Mask a secret for display, keeping the last four characters.
#[must_use]
pub fn redact_secret(value: &str) -> String {
    let length = value.chars().count();
    if length <= 4 {
        "****".to_string()
    } else {
        let tail: String = value.chars().skip(length - 4).collect();
        format!("****{tail}")
    }
}
