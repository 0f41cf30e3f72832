//! Local project commands: init, generate, serve.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::{DateTime, Utc};
use colored::Colorize;
use mgzon_config::CliConfig;
use serde::{Deserialize, Serialize};

use crate::cli::{GenerateDockerfileArgs, GenerateWebhookArgs, InitArgs, ServeArgs};
use crate::client::{AppContext, CliError, CliResult};

/// File name of the project manifest written by `mz init`.
pub(crate) const MANIFEST_FILE: &str = "mgzon.json";

/// The project manifest persisted next to the project sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectManifest {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<DateTime<Utc>>,
}

impl ProjectManifest {
    /// Read the manifest from `dir`, `None` when absent.
    pub(crate) fn read_from(dir: &Path) -> CliResult<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(CliError::failure(anyhow!(
                    "failed to read '{}': {err}",
                    path.display()
                )));
            }
        };
        let manifest = serde_json::from_str(&raw).map_err(|err| {
            CliError::validation(format!("'{}' is not a valid manifest: {err}", path.display()))
        })?;
        Ok(Some(manifest))
    }
}

pub(crate) fn handle_init(ctx: &AppContext, args: InitArgs) -> CliResult<()> {
    let dir = std::env::current_dir()
        .map_err(|err| CliError::failure(anyhow!("failed to resolve working directory: {err}")))?;
    let name = match args.name {
        Some(name) => name,
        None => dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::validation("could not derive a project name; pass one explicitly")
            })?,
    };

    let path = dir.join(MANIFEST_FILE);
    if path.exists() && !args.force {
        return Err(CliError::validation(format!(
            "'{MANIFEST_FILE}' already exists; rerun with --force to overwrite"
        )));
    }

    let manifest = ProjectManifest {
        name: name.clone(),
        environment: args
            .environment
            .or_else(|| ctx.config.default_environment.clone()),
        created_at: Some(Utc::now()),
    };
    write_manifest(&path, &manifest)?;

    ctx.store.save(CliConfig {
        current_project: Some(name.clone()),
        ..CliConfig::default()
    })?;

    println!("{} project '{name}' ({MANIFEST_FILE})", "Initialized".green());
    Ok(())
}

pub(crate) fn handle_generate_webhook(args: GenerateWebhookArgs) -> CliResult<()> {
    let name = args.name.trim().to_lowercase().replace([' ', '_'], "-");
    if name.is_empty() {
        return Err(CliError::validation("handler name cannot be empty"));
    }

    let path = PathBuf::from("webhooks").join(format!("{name}.js"));
    if path.exists() && !args.force {
        return Err(CliError::validation(format!(
            "'{}' already exists; rerun with --force to overwrite",
            path.display()
        )));
    }

    let event = name.replace('-', ".");
    let stub = format!(
        "// Webhook handler for `{event}` events.\n\
         // Deployed endpoints receive one POST per delivery.\n\
         export default async function handler(event) {{\n\
         \x20 console.log('received', event.id);\n\
         \x20 return {{ ok: true }};\n\
         }}\n"
    );
    write_text(&path, &stub)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

pub(crate) fn handle_generate_dockerfile(args: GenerateDockerfileArgs) -> CliResult<()> {
    let path = PathBuf::from("Dockerfile");
    if path.exists() && !args.force {
        return Err(CliError::validation(
            "'Dockerfile' already exists; rerun with --force to overwrite",
        ));
    }

    let dockerfile = "FROM node:22-alpine\n\
                      WORKDIR /app\n\
                      COPY package*.json ./\n\
                      RUN npm ci --omit=dev\n\
                      COPY . .\n\
                      EXPOSE 4100\n\
                      CMD [\"npm\", \"start\"]\n";
    write_text(&path, dockerfile)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

pub(crate) async fn handle_serve(args: ServeArgs) -> CliResult<()> {
    if !args.dir.is_dir() {
        return Err(CliError::validation(format!(
            "'{}' is not a directory",
            args.dir.display()
        )));
    }

    let root = Arc::new(args.dir.clone());
    let router = Router::new()
        .route("/", get(serve_file))
        .fallback(get(serve_file))
        .with_state(root);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to bind {addr}: {err}")))?;
    let local = listener
        .local_addr()
        .map_err(|err| CliError::failure(anyhow!("failed to resolve bound address: {err}")))?;
    println!(
        "{} {} at http://{local}/ (ctrl-c to stop)",
        "Serving".green(),
        args.dir.display()
    );

    axum::serve(listener, router)
        .await
        .map_err(|err| CliError::failure(anyhow!("preview server failed: {err}")))
}

async fn serve_file(State(root): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let Some(relative) = sanitize_request_path(uri.path()) else {
        return (StatusCode::BAD_REQUEST, "invalid path\n").into_response();
    };
    let path = root.join(relative);
    let path = if path.is_dir() { path.join("index.html") } else { path };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = content_type_for(&path);
            ([(header::CONTENT_TYPE, content_type)], Body::from(bytes)).into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "not found\n").into_response(),
    }
}

/// Normalize a request path to a safe relative path, rejecting traversal.
pub(crate) fn sanitize_request_path(path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            segment => clean.push(segment),
        }
    }
    Some(clean)
}

/// Map a file extension to a content type; octet-stream for the rest.
pub(crate) fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js" | "mjs") => "text/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

fn write_manifest(path: &Path, manifest: &ProjectManifest) -> CliResult<()> {
    let raw = serde_json::to_string_pretty(manifest)
        .map_err(|err| CliError::failure(anyhow!("failed to serialize manifest: {err}")))?;
    write_text(path, &raw)
}

fn write_text(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| {
            CliError::failure(anyhow!("failed to create '{}': {err}", parent.display()))
        })?;
    }
    fs::write(path, contents).map_err(|err| {
        CliError::failure(anyhow!("failed to write '{}': {err}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_request_path_rejects_traversal() {
        assert_eq!(
            sanitize_request_path("/assets/app.js"),
            Some(PathBuf::from("assets/app.js"))
        );
        assert_eq!(sanitize_request_path("/"), Some(PathBuf::new()));
        assert!(sanitize_request_path("/../etc/passwd").is_none());
        assert!(sanitize_request_path("/a/../../b").is_none());
    }

    #[test]
    fn content_type_covers_common_extensions() {
        assert_eq!(
            content_type_for(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("app.mjs")), "text/javascript");
        assert_eq!(
            content_type_for(Path::new("blob.bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = TempDir::new().expect("tempdir");
        let manifest = ProjectManifest {
            name: "shop".to_string(),
            environment: Some("staging".to_string()),
            created_at: Some(Utc::now()),
        };
        write_manifest(&dir.path().join(MANIFEST_FILE), &manifest).expect("write");

        let loaded = ProjectManifest::read_from(dir.path())
            .expect("read")
            .expect("present");
        assert_eq!(loaded.name, "shop");
        assert_eq!(loaded.environment.as_deref(), Some("staging"));
    }

    #[test]
    fn missing_manifest_reads_as_none() {
        let dir = TempDir::new().expect("tempdir");
        assert!(ProjectManifest::read_from(dir.path())
            .expect("read")
            .is_none());
    }

    #[test]
    fn malformed_manifest_is_a_validation_error() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(MANIFEST_FILE), "{broken").expect("write");
        let err = ProjectManifest::read_from(dir.path()).expect_err("malformed");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn serve_file_returns_content_with_type() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("index.html"), "<h1>hi</h1>").expect("write");

        let response = serve_file(
            State(Arc::new(dir.path().to_path_buf())),
            Uri::from_static("/"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/html; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn serve_file_answers_missing_paths_with_404() {
        let dir = TempDir::new().expect("tempdir");
        let response = serve_file(
            State(Arc::new(dir.path().to_path_buf())),
            Uri::from_static("/nope.js"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
