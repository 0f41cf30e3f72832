//! Shared HTTP client, application context, and error classification.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use mgzon_api_models::ProblemDetails;
use mgzon_config::{CliConfig, ConfigStore};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode, Url};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const ENV_API_KEY: &str = "MGZON_API_KEY";
pub(crate) const USER_AGENT: &str = concat!("mz/", env!("CARGO_PKG_VERSION"));

/// CLI-level error type to distinguish validation from operational failures.
///
/// Both variants exit with code 1; the split only shapes the message
/// (validation errors print bare, failures print the error chain).
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Failure(_) => 1,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<mgzon_config::ConfigError> for CliError {
    fn from(error: mgzon_config::ConfigError) -> Self {
        Self::Failure(error.into())
    }
}

/// Build the HTTP client shared by all commands for one invocation.
pub(crate) fn build_http_client(timeout_secs: u64, trace_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(trace_id)
        .map_err(|_| CliError::failure(anyhow!("trace identifier contains invalid characters")))?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .default_headers(default_headers)
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Application context passed to command handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) store: ConfigStore,
    pub(crate) config: CliConfig,
    /// Key supplied via `--api-key` or `MGZON_API_KEY`; wins over the config
    /// file per the platform's override contract.
    pub(crate) api_key_override: Option<String>,
}

impl AppContext {
    /// Resolve the effective API key: flag/env override, then config file.
    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key_override
            .as_deref()
            .or(self.config.api_key.as_deref())
    }

    /// The effective API key, or a validation error pointing at `mz login`.
    pub(crate) fn require_api_key(&self) -> CliResult<&str> {
        self.api_key().ok_or_else(|| {
            CliError::validation(format!(
                "no API key found; run `mz login`, pass --api-key, or set {ENV_API_KEY}"
            ))
        })
    }

    /// Join `path` onto the base URL without discarding its path segments.
    ///
    /// The default base already carries `/v1`, so a plain `Url::join` with an
    /// absolute path would drop it.
    pub(crate) fn endpoint(&self, path: &str) -> CliResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                CliError::validation(format!("API URL '{}' cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|segment| !segment.is_empty()) {
                segments.push(segment);
            }
        }
        url.set_query(None);
        Ok(url)
    }

    /// Attach the bearer credential to a request, failing when none is set.
    pub(crate) fn authorized(&self, builder: RequestBuilder) -> CliResult<RequestBuilder> {
        let key = self.require_api_key()?;
        Ok(builder.bearer_auth(key))
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Wrap a transport-level failure with connectivity hints.
pub(crate) fn transport_error(path: &str, err: &reqwest::Error) -> CliError {
    if err.is_timeout() {
        CliError::failure(anyhow!(
            "request to {path} timed out; raise --timeout or check your connection"
        ))
    } else if err.is_connect() {
        CliError::failure(anyhow!(
            "could not reach the MGZON API for {path}: {err}; check your network, \
             proxy settings, and the API base URL (--api-url or config apiUrl)"
        ))
    } else {
        CliError::failure(anyhow!("request to {path} failed: {err}"))
    }
}

/// Classify a non-success HTTP response into a CLI error with a hint.
pub(crate) async fn classify_response(response: reqwest::Response) -> CliError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();

    let body_text = String::from_utf8_lossy(&bytes).to_string();
    let problem = serde_json::from_slice::<ProblemDetails>(&bytes).ok();
    let server_message = problem.as_ref().map_or_else(
        || body_text.trim().to_string(),
        |p| p.detail.clone().unwrap_or_else(|| p.message.clone()),
    );

    match status {
        StatusCode::UNAUTHORIZED => CliError::validation(with_detail(
            "authentication failed: the API key was rejected or the session expired; run `mz login`",
            &server_message,
        )),
        StatusCode::FORBIDDEN => CliError::validation(with_detail(
            "permission denied: your account role does not allow this operation",
            &server_message,
        )),
        StatusCode::NOT_FOUND => CliError::validation(with_detail(
            "not found (status 404); check the API base URL (--api-url or config apiUrl) and the identifier",
            &server_message,
        )),
        status if status.is_client_error() => {
            if server_message.is_empty() {
                CliError::validation(format!("request rejected with status {status}"))
            } else {
                CliError::validation(server_message)
            }
        }
        status => {
            if server_message.is_empty() {
                CliError::failure(anyhow!("request failed with status {status}"))
            } else {
                CliError::failure(anyhow!("{server_message} (status {status})"))
            }
        }
    }
}

fn with_detail(hint: &str, detail: &str) -> String {
    if detail.is_empty() {
        hint.to_string()
    } else {
        format!("{hint} ({detail})")
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::context_for;
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn endpoint_preserves_base_path_segments() {
        let ctx = AppContext {
            client: Client::new(),
            base_url: "https://api.mgzon.com/v1".parse().expect("valid URL"),
            store: ConfigStore::at_path("/tmp/unused-config.json"),
            config: CliConfig::default(),
            api_key_override: None,
        };
        let url = ctx.endpoint("apps/app_42").expect("endpoint");
        assert_eq!(url.as_str(), "https://api.mgzon.com/v1/apps/app_42");
    }

    #[test]
    fn api_key_override_wins_over_config() {
        let server = MockServer::start();
        let mut ctx = context_for(&server, Some("flag-key"));
        ctx.config.api_key = Some("stored-key".to_string());
        assert_eq!(ctx.api_key(), Some("flag-key"));

        ctx.api_key_override = None;
        assert_eq!(ctx.api_key(), Some("stored-key"));
    }

    #[test]
    fn require_api_key_names_the_login_command() {
        let server = MockServer::start();
        let ctx = context_for(&server, None);
        let err = ctx.require_api_key().expect_err("no key configured");
        assert!(matches!(err, CliError::Validation(message) if message.contains("mz login")));
    }

    #[tokio::test]
    async fn classify_response_maps_unauthorized_to_login_hint() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/auth-check");
            then.status(401)
                .json_body(serde_json::json!({"message": "bad key"}));
        });

        let response = Client::new()
            .get(format!("{}/auth-check", server.base_url()))
            .send()
            .await
            .expect("request");
        let err = classify_response(response).await;
        let message = err.display_message();
        assert!(message.contains("mz login"), "got: {message}");
        assert!(message.contains("bad key"), "got: {message}");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn classify_response_maps_not_found_to_url_hint() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let response = Client::new()
            .get(format!("{}/missing", server.base_url()))
            .send()
            .await
            .expect("request");
        let err = classify_response(response).await;
        assert!(err.display_message().contains("--api-url"));
    }

    #[tokio::test]
    async fn classify_response_keeps_server_detail_for_forbidden() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/forbidden");
            then.status(403)
                .json_body(serde_json::json!({"message": "seller role required"}));
        });

        let response = Client::new()
            .get(format!("{}/forbidden", server.base_url()))
            .send()
            .await
            .expect("request");
        let err = classify_response(response).await;
        let message = err.display_message();
        assert!(message.contains("permission denied"), "got: {message}");
        assert!(message.contains("seller role required"), "got: {message}");
    }

    #[tokio::test]
    async fn transport_error_hints_at_connectivity_when_refused() {
        // Grab a free port, then release it so nothing is listening.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("free port")
            .port();

        let err = Client::new()
            .get(format!("http://127.0.0.1:{port}/apps"))
            .send()
            .await
            .expect_err("nothing listens on the released port");
        let classified = transport_error("/apps", &err);
        let message = classified.display_message();
        assert!(message.contains("could not reach the MGZON API"), "got: {message}");
        assert!(message.contains("--api-url"), "got: {message}");
    }

    #[tokio::test]
    async fn transport_error_hints_at_timeout_for_slow_servers() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });

        let client = Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .expect("client");
        let err = client
            .get(format!("{}/slow", server.base_url()))
            .send()
            .await
            .expect_err("request outlives the timeout");
        let classified = transport_error("/slow", &err);
        assert!(
            classified.display_message().contains("raise --timeout"),
            "got: {}",
            classified.display_message()
        );
    }

    #[tokio::test]
    async fn classify_response_treats_server_errors_as_failures() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/boom");
            then.status(500);
        });

        let response = Client::new()
            .get(format!("{}/boom", server.base_url()))
            .send()
            .await
            .expect("request");
        let err = classify_response(response).await;
        assert!(matches!(err, CliError::Failure(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
