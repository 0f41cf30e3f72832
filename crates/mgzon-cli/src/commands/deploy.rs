//! Packaging and deployment: build the project zip, upload it to `/deploy`.

use std::path::Path;

use anyhow::anyhow;
use colored::Colorize;
use mgzon_api_models::DeployResponse;
use reqwest::multipart::{Form, Part};
use uuid::Uuid;

use crate::cli::{BuildArgs, DeployArgs};
use crate::client::{AppContext, CliError, CliResult, classify_response, transport_error};
use crate::commands::project::ProjectManifest;
use crate::output::format_bytes;
use crate::package::package_project;

pub(crate) fn handle_build(args: BuildArgs) -> CliResult<()> {
    let output = args
        .output
        .unwrap_or_else(|| args.dir.join(".mgzon").join("build.zip"));
    let summary = package_project(&args.dir, &output)?;
    println!(
        "{} {} ({} files, {})",
        "Packaged".green(),
        summary.archive.display(),
        summary.files,
        format_bytes(summary.total_bytes)
    );
    Ok(())
}

pub(crate) async fn handle_deploy(ctx: &AppContext, args: DeployArgs) -> CliResult<()> {
    let manifest = ProjectManifest::read_from(&args.dir)?;

    let project = args
        .project
        .or_else(|| manifest.as_ref().map(|m| m.name.clone()))
        .or_else(|| ctx.config.current_project.clone())
        .ok_or_else(|| {
            CliError::validation(
                "no project name found; run `mz init` in the project or pass --project",
            )
        })?;
    let environment = args
        .environment
        .or_else(|| manifest.as_ref().and_then(|m| m.environment.clone()))
        .or_else(|| ctx.config.default_environment.clone());

    let (archive, packaged_here) = match args.archive {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::validation(format!(
                    "archive '{}' does not exist",
                    path.display()
                )));
            }
            (path, false)
        }
        None => {
            let output = args
                .dir
                .join(".mgzon")
                .join(format!("deploy-{}.zip", Uuid::new_v4()));
            let summary = package_project(&args.dir, &output)?;
            println!(
                "{} {} files ({})",
                "Packaged".green(),
                summary.files,
                format_bytes(summary.total_bytes)
            );
            (summary.archive, true)
        }
    };

    let result = upload(ctx, &archive, &project, environment.as_deref()).await;

    if packaged_here && !args.keep_archive {
        if let Err(err) = std::fs::remove_file(&archive) {
            tracing::debug!(archive = %archive.display(), error = %err, "failed to remove archive");
        }
    }

    let deployment = result?;
    println!(
        "{} deployment {} for '{project}'",
        "Accepted".green(),
        deployment.deployment_id
    );
    if let Some(status) = &deployment.status {
        println!("status: {status}");
    }
    if let Some(url) = &deployment.url {
        println!("url: {url}");
    }
    Ok(())
}

async fn upload(
    ctx: &AppContext,
    archive: &Path,
    project: &str,
    environment: Option<&str>,
) -> CliResult<DeployResponse> {
    let bytes = tokio::fs::read(archive).await.map_err(|err| {
        CliError::failure(anyhow!("failed to read '{}': {err}", archive.display()))
    })?;
    let part = Part::bytes(bytes)
        .file_name("bundle.zip")
        .mime_str("application/zip")
        .map_err(|err| CliError::failure(anyhow!("failed to build upload part: {err}")))?;

    let mut form = Form::new()
        .text("project", project.to_string())
        .part("bundle", part);
    if let Some(environment) = environment {
        form = form.text("environment", environment.to_string());
    }

    let url = ctx.endpoint("deploy")?;
    let request = ctx.authorized(ctx.client.post(url))?;
    let response = request
        .multipart(form)
        .send()
        .await
        .map_err(|err| transport_error("/deploy", &err))?;

    if response.status().is_success() {
        response
            .json::<DeployResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse deploy response: {err}")))
    } else {
        Err(classify_response(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testutil::context_for;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn seed_project(dir: &TempDir, manifest: Option<&str>) {
        std::fs::write(dir.path().join("index.html"), "<html></html>").expect("write");
        if let Some(manifest) = manifest {
            std::fs::write(dir.path().join("mgzon.json"), manifest).expect("write manifest");
        }
    }

    #[test]
    fn build_writes_archive_under_dot_mgzon() {
        let dir = TempDir::new().expect("tempdir");
        seed_project(&dir, None);

        handle_build(BuildArgs {
            dir: dir.path().to_path_buf(),
            output: None,
        })
        .expect("build");
        assert!(dir.path().join(".mgzon/build.zip").is_file());
    }

    #[tokio::test]
    async fn deploy_uploads_multipart_bundle_with_manifest_name() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/deploy")
                .header("authorization", "Bearer mgz_key")
                .body_includes("name=\"project\"")
                .body_includes("shop")
                .body_includes("name=\"bundle\"");
            then.status(202).json_body(json!({
                "deploymentId": "dep_1",
                "status": "queued",
                "url": "https://shop.mgzon.app"
            }));
        });

        let dir = TempDir::new().expect("tempdir");
        seed_project(&dir, Some(r#"{"name":"shop","environment":"production"}"#));

        let ctx = context_for(&server, Some("mgz_key"));
        handle_deploy(
            &ctx,
            DeployArgs {
                dir: dir.path().to_path_buf(),
                archive: None,
                environment: None,
                project: None,
                keep_archive: false,
            },
        )
        .await
        .expect("deploy");
        mock.assert();

        // The throwaway archive is removed after upload.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join(".mgzon"))
            .map(|entries| entries.filter_map(Result::ok).collect())
            .unwrap_or_default();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn deploy_without_any_project_name_is_a_validation_error() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("tempdir");
        seed_project(&dir, None);

        let ctx = context_for(&server, Some("mgz_key"));
        let err = handle_deploy(
            &ctx,
            DeployArgs {
                dir: dir.path().to_path_buf(),
                archive: None,
                environment: None,
                project: None,
                keep_archive: false,
            },
        )
        .await
        .expect_err("no project name");
        assert!(matches!(err, CliError::Validation(message) if message.contains("mz init")));
    }

    #[tokio::test]
    async fn deploy_accepts_a_prebuilt_archive() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/deploy").body_includes("bundle.zip");
            then.status(202).json_body(json!({"deploymentId": "dep_2"}));
        });

        let dir = TempDir::new().expect("tempdir");
        let archive = dir.path().join("bundle.zip");
        std::fs::write(&archive, b"PK\x03\x04fake").expect("write archive");

        let ctx = context_for(&server, Some("mgz_key"));
        handle_deploy(
            &ctx,
            DeployArgs {
                dir: dir.path().to_path_buf(),
                archive: Some(archive.clone()),
                environment: Some("staging".to_string()),
                project: Some("shop".to_string()),
                keep_archive: false,
            },
        )
        .await
        .expect("deploy");
        mock.assert();
        // Caller-supplied archives are never deleted.
        assert!(archive.is_file());
    }
}
