//! Database queries and operations against the `/db` endpoints.

use anyhow::anyhow;
use mgzon_api_models::DbResponse;
use serde_json::Value;

use crate::cli::{DbQueryArgs, DbRunArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, classify_response, transport_error};
use crate::output::render_db_response;

pub(crate) async fn handle_query(
    ctx: &AppContext,
    args: DbQueryArgs,
    format: OutputFormat,
) -> CliResult<()> {
    // Validate the filter locally so a typo fails before the round-trip.
    if let Some(filter) = &args.filter {
        serde_json::from_str::<Value>(filter)
            .map_err(|err| CliError::validation(format!("--filter is not valid JSON: {err}")))?;
    }

    let mut url = ctx.endpoint("db")?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("collection", &args.collection);
        if let Some(filter) = &args.filter {
            pairs.append_pair("filter", filter);
        }
        if let Some(limit) = args.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
    }

    let request = ctx.authorized(ctx.client.get(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/db", &err))?;

    if response.status().is_success() {
        let body = response
            .json::<DbResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse query result: {err}")))?;
        render_db_response(&body, format)
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_run(
    ctx: &AppContext,
    args: DbRunArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let raw = match (args.op, args.file) {
        (Some(_), Some(_)) => {
            return Err(CliError::validation(
                "provide the operation inline or via --file, not both",
            ));
        }
        (Some(op), None) => op,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(|err| {
            CliError::failure(anyhow!("failed to read '{}': {err}", path.display()))
        })?,
        (None, None) => {
            return Err(CliError::validation(
                "provide an operation document inline or via --file",
            ));
        }
    };

    let operation: Value = serde_json::from_str(&raw)
        .map_err(|err| CliError::validation(format!("operation document is not valid JSON: {err}")))?;

    let url = ctx.endpoint("db")?;
    let request = ctx.authorized(ctx.client.post(url))?;
    let response = request
        .json(&operation)
        .send()
        .await
        .map_err(|err| transport_error("/db", &err))?;

    if response.status().is_success() {
        let body = response
            .json::<DbResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse operation result: {err}")))?;
        render_db_response(&body, format)
    } else {
        Err(classify_response(response).await)
    }
}
