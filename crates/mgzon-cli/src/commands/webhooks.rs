//! Webhook management against the `/webhooks` endpoints.

use anyhow::anyhow;
use colored::Colorize;
use mgzon_api_models::{
    WebhookCreateRequest, WebhookListResponse, WebhookSummary, WebhookTestResponse,
};
use reqwest::Url;

use crate::cli::{OutputFormat, WebhookCreateArgs, WebhookIdArgs};
use crate::client::{AppContext, CliError, CliResult, classify_response, transport_error};
use crate::output::render_webhook_list;

pub(crate) async fn handle_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let url = ctx.endpoint("webhooks")?;
    let request = ctx.authorized(ctx.client.get(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/webhooks", &err))?;

    if response.status().is_success() {
        let list = response
            .json::<WebhookListResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse webhook list: {err}")))?;
        render_webhook_list(&list, format)
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_create(ctx: &AppContext, args: WebhookCreateArgs) -> CliResult<()> {
    let destination = args
        .url
        .parse::<Url>()
        .map_err(|err| CliError::validation(format!("invalid webhook URL '{}': {err}", args.url)))?;
    if destination.scheme() != "https" && destination.scheme() != "http" {
        return Err(CliError::validation(
            "webhook URL must use http or https",
        ));
    }
    if args.events.is_empty() {
        return Err(CliError::validation(
            "provide at least one event via --events, e.g. --events order.created",
        ));
    }

    let url = ctx.endpoint("webhooks")?;
    let request = ctx.authorized(ctx.client.post(url))?;
    let response = request
        .json(&WebhookCreateRequest {
            url: destination.to_string(),
            events: args.events,
        })
        .send()
        .await
        .map_err(|err| transport_error("/webhooks", &err))?;

    if response.status().is_success() {
        let webhook = response
            .json::<WebhookSummary>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse created webhook: {err}")))?;
        println!("{} {} -> {}", "Created webhook".green(), webhook.id, webhook.url);
        Ok(())
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_delete(ctx: &AppContext, args: WebhookIdArgs) -> CliResult<()> {
    let url = ctx.endpoint(&format!("webhooks/{}", args.id))?;
    let request = ctx.authorized(ctx.client.delete(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/webhooks/{id}", &err))?;

    if response.status().is_success() {
        println!("{} {}", "Deleted webhook".green(), args.id);
        Ok(())
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_test(ctx: &AppContext, args: WebhookIdArgs) -> CliResult<()> {
    let url = ctx.endpoint(&format!("webhooks/{}/test", args.id))?;
    let request = ctx.authorized(ctx.client.post(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/webhooks/{id}/test", &err))?;

    if response.status().is_success() {
        let outcome = response
            .json::<WebhookTestResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse test outcome: {err}")))?;
        if outcome.delivered {
            println!(
                "{} destination answered {}",
                "Delivered:".green(),
                outcome.status.map_or_else(|| "-".to_string(), |s| s.to_string())
            );
            Ok(())
        } else {
            Err(CliError::validation(format!(
                "test delivery failed: {}",
                outcome.detail.as_deref().unwrap_or("destination unreachable")
            )))
        }
    } else {
        Err(classify_response(response).await)
    }
}
