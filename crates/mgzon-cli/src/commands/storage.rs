//! File storage against the `/storage` endpoints.

use std::path::PathBuf;

use anyhow::anyhow;
use colored::Colorize;
use mgzon_api_models::{StorageListResponse, StorageObject};
use reqwest::multipart::{Form, Part};
use tokio::fs;

use crate::cli::{OutputFormat, StorageDownloadArgs, StorageNameArgs, StorageUploadArgs};
use crate::client::{AppContext, CliError, CliResult, classify_response, transport_error};
use crate::output::{format_bytes, render_storage_list};

pub(crate) async fn handle_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let url = ctx.endpoint("storage")?;
    let request = ctx.authorized(ctx.client.get(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/storage", &err))?;

    if response.status().is_success() {
        let list = response
            .json::<StorageListResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse storage list: {err}")))?;
        render_storage_list(&list, format)
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_upload(ctx: &AppContext, args: StorageUploadArgs) -> CliResult<()> {
    let name = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::validation("could not derive an object name; pass --name")
            })?,
    };

    let bytes = fs::read(&args.file).await.map_err(|err| {
        CliError::failure(anyhow!("failed to read '{}': {err}", args.file.display()))
    })?;
    let size = bytes.len() as u64;

    let mut part = Part::bytes(bytes).file_name(name.clone());
    if let Some(content_type) = &args.content_type {
        part = part.mime_str(content_type).map_err(|err| {
            CliError::validation(format!("invalid content type '{content_type}': {err}"))
        })?;
    }
    let form = Form::new().text("name", name.clone()).part("file", part);

    let url = ctx.endpoint("storage")?;
    let request = ctx.authorized(ctx.client.post(url))?;
    let response = request
        .multipart(form)
        .send()
        .await
        .map_err(|err| transport_error("/storage", &err))?;

    if response.status().is_success() {
        let object = response.json::<StorageObject>().await.ok();
        let stored = object.map_or(name, |object| object.name);
        println!("{} {} ({})", "Uploaded".green(), stored, format_bytes(size));
        Ok(())
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_download(ctx: &AppContext, args: StorageDownloadArgs) -> CliResult<()> {
    let url = ctx.endpoint(&format!("storage/{}", args.name))?;
    let request = ctx.authorized(ctx.client.get(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/storage/{name}", &err))?;

    if !response.status().is_success() {
        return Err(classify_response(response).await);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to read object body: {err}")))?;
    let target = args
        .output
        .unwrap_or_else(|| PathBuf::from(&args.name));
    fs::write(&target, &bytes).await.map_err(|err| {
        CliError::failure(anyhow!("failed to write '{}': {err}", target.display()))
    })?;
    println!(
        "{} {} ({})",
        "Downloaded".green(),
        target.display(),
        format_bytes(bytes.len() as u64)
    );
    Ok(())
}

pub(crate) async fn handle_delete(ctx: &AppContext, args: StorageNameArgs) -> CliResult<()> {
    let url = ctx.endpoint(&format!("storage/{}", args.name))?;
    let request = ctx.authorized(ctx.client.delete(url))?;
    let response = request
        .send()
        .await
        .map_err(|err| transport_error("/storage/{name}", &err))?;

    if response.status().is_success() {
        println!("{} {}", "Deleted".green(), args.name);
        Ok(())
    } else {
        Err(classify_response(response).await)
    }
}
