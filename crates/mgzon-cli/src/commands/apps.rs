//! Application management against the `/apps` endpoints.

use anyhow::anyhow;
use colored::Colorize;
use mgzon_api_models::{AppCreateRequest, AppListResponse, AppSummary};

use crate::cli::{AppCreateArgs, AppIdArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, classify_response, transport_error};
use crate::output::{render_app_detail, render_app_list};

pub(crate) async fn handle_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let url = ctx.endpoint("apps")?;
    let request = ctx.authorized(ctx.client.get(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/apps", &err))?;

    if response.status().is_success() {
        let list = response
            .json::<AppListResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse app list: {err}")))?;
        render_app_list(&list, format)
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_create(ctx: &AppContext, args: AppCreateArgs) -> CliResult<()> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::validation("application name cannot be empty"));
    }

    let payload = AppCreateRequest {
        name: name.to_string(),
        environment: args
            .environment
            .or_else(|| ctx.config.default_environment.clone()),
    };

    let url = ctx.endpoint("apps")?;
    let request = ctx.authorized(ctx.client.post(url))?;
    let response = request
        .json(&payload)
        .send()
        .await
        .map_err(|err| transport_error("/apps", &err))?;

    if response.status().is_success() {
        let app = response
            .json::<AppSummary>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse created app: {err}")))?;
        println!("{} {} (id: {})", "Created app".green(), app.name, app.id);
        if let Some(url) = &app.url {
            println!("url: {url}");
        }
        Ok(())
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_info(
    ctx: &AppContext,
    args: AppIdArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let url = ctx.endpoint(&format!("apps/{}", args.id))?;
    let request = ctx.authorized(ctx.client.get(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/apps/{id}", &err))?;

    if response.status().is_success() {
        let app = response
            .json::<AppSummary>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse app detail: {err}")))?;
        render_app_detail(&app, format)
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_delete(ctx: &AppContext, args: AppIdArgs) -> CliResult<()> {
    let url = ctx.endpoint(&format!("apps/{}", args.id))?;
    let request = ctx.authorized(ctx.client.delete(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/apps/{id}", &err))?;

    if response.status().is_success() {
        println!("{} {}", "Deleted app".green(), args.id);
        Ok(())
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

    #[tokio::test]
    async fn list_sends_bearer_credential() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/apps")
                .header("authorization", "Bearer mgz_key");
            then.status(200).json_body(json!({
                "apps": [
                    {"id": "app_1", "name": "shop", "environment": "production", "status": "running"}
                ]
            }));
        });

        let ctx = context_for(&server, Some("mgz_key"));
        handle_list(&ctx, OutputFormat::Table).await.expect("list");
        mock.assert();
    }

    #[tokio::test]
    async fn create_defaults_environment_from_config() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/apps")
                .json_body(json!({"name": "shop", "environment": "staging"}));
            then.status(201)
                .json_body(json!({"id": "app_9", "name": "shop"}));
        });

        let mut ctx = context_for(&server, Some("mgz_key"));
        ctx.config.default_environment = Some("staging".to_string());
        handle_create(
            &ctx,
            AppCreateArgs {
                name: "shop".to_string(),
                environment: None,
            },
        )
        .await
        .expect("create");
        mock.assert();
    }

    #[tokio::test]
    async fn create_rejects_blank_names_without_a_request() {
        let server = MockServer::start_async().await;
        let ctx = context_for(&server, Some("mgz_key"));
        let err = handle_create(
            &ctx,
            AppCreateArgs {
                name: "   ".to_string(),
                environment: None,
            },
        )
        .await
        .expect_err("blank name");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_targets_the_app_path() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/apps/app_1");
            then.status(204);
        });

        let ctx = context_for(&server, Some("mgz_key"));
        handle_delete(
            &ctx,
            AppIdArgs {
                id: "app_1".to_string(),
            },
        )
        .await
        .expect("delete");
        mock.assert();
    }

    #[tokio::test]
    async fn info_surfaces_not_found_hint() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/apps/app_missing");
            then.status(404);
        });

        let ctx = context_for(&server, Some("mgz_key"));
        let err = handle_info(
            &ctx,
            AppIdArgs {
                id: "app_missing".to_string(),
            },
            OutputFormat::Table,
        )
        .await
        .expect_err("missing app");
        assert!(err.display_message().contains("--api-url"));
    }
}
