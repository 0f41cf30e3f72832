//! API key management against the `/keys` endpoints.

use anyhow::anyhow;
use colored::Colorize;
use mgzon_api_models::{ApiKeyCreateRequest, ApiKeyCreateResponse, ApiKeyListResponse};

use crate::cli::{KeyCreateArgs, KeyIdArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, classify_response, transport_error};
use crate::output::render_key_list;

pub(crate) async fn handle_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let url = ctx.endpoint("keys")?;
    let request = ctx.authorized(ctx.client.get(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/keys", &err))?;

    if response.status().is_success() {
        let list = response
            .json::<ApiKeyListResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse key list: {err}")))?;
        render_key_list(&list, format)
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_create(ctx: &AppContext, args: KeyCreateArgs) -> CliResult<()> {
    let label = args.label.trim();
    if label.is_empty() {
        return Err(CliError::validation("key label cannot be empty"));
    }

    let url = ctx.endpoint("keys")?;
    let request = ctx.authorized(ctx.client.post(url))?;
    let response = request
        .json(&ApiKeyCreateRequest {
            label: label.to_string(),
        })
        .send()
        .await
        .map_err(|err| transport_error("/keys", &err))?;

    if response.status().is_success() {
        let created = response
            .json::<ApiKeyCreateResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse created key: {err}")))?;
        println!("{} {}", "Created key".green(), created.id);
        // The platform never returns the secret again.
        println!("secret (store securely, shown once): {}", created.secret);
        Ok(())
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_revoke(ctx: &AppContext, args: KeyIdArgs) -> CliResult<()> {
    let url = ctx.endpoint(&format!("keys/{}", args.id))?;
    let request = ctx.authorized(ctx.client.delete(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/keys/{id}", &err))?;

    if response.status().is_success() {
        println!("{} {}", "Revoked key".green(), args.id);
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
    async fn create_sends_label_and_prints_secret_once() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/keys")
                .header("authorization", "Bearer mgz_key")
                .json_body(json!({"label": "ci"}));
            then.status(201)
                .json_body(json!({"id": "key_7", "secret": "mgz_live_xyz"}));
        });

        let ctx = context_for(&server, Some("mgz_key"));
        handle_create(
            &ctx,
            KeyCreateArgs {
                label: "ci".to_string(),
            },
        )
        .await
        .expect("create");
        mock.assert();
    }

    #[tokio::test]
    async fn revoke_issues_delete() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/keys/key_7");
            then.status(204);
        });

        let ctx = context_for(&server, Some("mgz_key"));
        handle_revoke(
            &ctx,
            KeyIdArgs {
                id: "key_7".to_string(),
            },
        )
        .await
        .expect("revoke");
        mock.assert();
    }

    #[tokio::test]
    async fn list_maps_forbidden_to_permission_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/keys");
            then.status(403)
                .json_body(json!({"message": "admin role required"}));
        });

        let ctx = context_for(&server, Some("mgz_key"));
        let err = handle_list(&ctx, OutputFormat::Table)
            .await
            .expect_err("forbidden");
        let message = err.display_message();
        assert!(message.contains("permission denied"), "got: {message}");
        assert!(message.contains("admin role required"), "got: {message}");
    }
}
