#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the MGZON platform API.
//!
//! The wire format is camelCase JSON throughout, matching what the
//! platform's other clients exchange. These types cover only the slices of
//! the API the CLI consumes; the API itself is an external collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Problem document surfaced by the API on validation and runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// Stable machine-readable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable error summary.
    pub message: String,
    /// Detailed diagnostic text when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Request body for `POST /cli/auth/login` and `POST /auth/verify`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// API key being exchanged or verified.
    pub api_key: String,
    /// Client identifier, e.g. `mz/0.1.0`.
    pub client: String,
}

/// Successful response from `POST /cli/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Short-lived session token minted for this CLI.
    pub session_token: String,
    /// Expiry of the session token.
    pub expires_at: DateTime<Utc>,
    /// Profile of the authenticated user.
    pub user: UserProfile,
}

/// User identity as returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Platform user identifier.
    pub user_id: String,
    /// Account email.
    pub email: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Primary role name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Whether the account carries the developer role.
    #[serde(default)]
    pub is_developer: bool,
    /// Whether the account carries the seller role.
    #[serde(default)]
    pub is_seller: bool,
    /// Whether the account carries the admin role.
    #[serde(default)]
    pub is_admin: bool,
}

/// One application owned by the account, from `GET /apps`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    /// Application identifier.
    pub id: String,
    /// Application name.
    pub name: String,
    /// Runtime environment the app is bound to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Lifecycle status (`running`, `stopped`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Public URL when the app is served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Envelope for `GET /apps`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppListResponse {
    /// Applications visible to the caller.
    pub apps: Vec<AppSummary>,
}

/// Request body for `POST /apps`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppCreateRequest {
    /// Name of the application to create.
    pub name: String,
    /// Target environment; the account default when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// One API key, from `GET /keys`. The secret is never echoed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeySummary {
    /// Key identifier used for revocation.
    pub id: String,
    /// Human label attached at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Redacted key preview (last characters only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Timestamp of last use when the platform tracks it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Envelope for `GET /keys`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyListResponse {
    /// Keys owned by the account.
    pub keys: Vec<ApiKeySummary>,
}

/// Request body for `POST /keys`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCreateRequest {
    /// Human label for the new key.
    pub label: String,
}

/// Response from `POST /keys`; the only time the secret is visible.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCreateResponse {
    /// Key identifier.
    pub id: String,
    /// The full secret. Shown once, never retrievable again.
    pub secret: String,
}

/// One stored object, from `GET /storage`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    /// Object name (the path component used for download/delete).
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type recorded at upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Last modification timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Envelope for `GET /storage`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageListResponse {
    /// Objects in the account's storage bucket.
    pub objects: Vec<StorageObject>,
}

/// Response from `GET /db` (query) and `POST /db` (operation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DbResponse {
    /// Documents matched by a query; empty for write operations.
    #[serde(default)]
    pub documents: Vec<Value>,
    /// Documents matched or affected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Free-form acknowledgement from the platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One webhook registration, from `GET /webhooks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSummary {
    /// Webhook identifier.
    pub id: String,
    /// Destination URL.
    pub url: String,
    /// Event names the webhook subscribes to.
    #[serde(default)]
    pub events: Vec<String>,
    /// Whether deliveries are currently enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Envelope for `GET /webhooks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookListResponse {
    /// Registered webhooks.
    pub webhooks: Vec<WebhookSummary>,
}

/// Request body for `POST /webhooks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookCreateRequest {
    /// Destination URL.
    pub url: String,
    /// Event names to subscribe to.
    pub events: Vec<String>,
}

/// Response from `POST /webhooks/{id}/test`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookTestResponse {
    /// Whether the test delivery was accepted by the destination.
    pub delivered: bool,
    /// HTTP status the destination answered with, when reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Diagnostic text for failed deliveries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Response from `POST /deploy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    /// Identifier of the created deployment.
    pub deployment_id: String,
    /// Deployment status at acceptance time (`queued`, `building`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// URL the deployment will be served from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Response from `GET /cli/version`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Latest released CLI version.
    pub latest: String,
    /// Oldest version the platform still accepts, when enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_supported: Option<String>,
    /// Where to fetch the release from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Response from `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Platform-reported health status, normally `ok`.
    pub status: String,
}

const fn default_true() -> bool {
    true
}
