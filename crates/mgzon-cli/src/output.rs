//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use mgzon_api_models::{
    ApiKeyListResponse, AppListResponse, AppSummary, DbResponse, StorageListResponse, UserProfile,
    WebhookListResponse,
};
use mgzon_config::{CliConfig, redact_secret};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn json_pretty<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn render_profile(profile: &UserProfile, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(profile)?),
        OutputFormat::Table => {
            println!("user: {}", profile.user_id);
            println!("email: {}", profile.email);
            if let Some(name) = &profile.name {
                println!("name: {name}");
            }
            if let Some(role) = &profile.role {
                println!("role: {role}");
            }
            let mut flags = Vec::new();
            if profile.is_developer {
                flags.push("developer");
            }
            if profile.is_seller {
                flags.push("seller");
            }
            if profile.is_admin {
                flags.push("admin");
            }
            if !flags.is_empty() {
                println!("flags: {}", flags.join(", "));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_app_list(list: &AppListResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(list)?),
        OutputFormat::Table => {
            println!("{:<24} {:<14} {:<10} NAME", "ID", "ENVIRONMENT", "STATUS");
            for app in &list.apps {
                println!(
                    "{:<24} {:<14} {:<10} {}",
                    app.id,
                    app.environment.as_deref().unwrap_or("-"),
                    app.status.as_deref().unwrap_or("-"),
                    app.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_app_detail(app: &AppSummary, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(app)?),
        OutputFormat::Table => {
            println!("id: {}", app.id);
            println!("name: {}", app.name);
            if let Some(environment) = &app.environment {
                println!("environment: {environment}");
            }
            if let Some(status) = &app.status {
                println!("status: {status}");
            }
            if let Some(url) = &app.url {
                println!("url: {url}");
            }
            if let Some(created_at) = &app.created_at {
                println!("created: {created_at}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_key_list(list: &ApiKeyListResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(list)?),
        OutputFormat::Table => {
            println!("{:<24} {:<14} {:<22} LABEL", "ID", "PREVIEW", "CREATED");
            for key in &list.keys {
                let created = key
                    .created_at
                    .map_or_else(|| "-".to_string(), |ts| ts.to_rfc3339());
                println!(
                    "{:<24} {:<14} {:<22} {}",
                    key.id,
                    key.preview.as_deref().unwrap_or("-"),
                    created,
                    key.label.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_storage_list(
    list: &StorageListResponse,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(list)?),
        OutputFormat::Table => {
            println!("{:>10} {:<26} NAME", "SIZE", "TYPE");
            for object in &list.objects {
                println!(
                    "{:>10} {:<26} {}",
                    format_bytes(object.size_bytes),
                    object.content_type.as_deref().unwrap_or("-"),
                    object.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_webhook_list(
    list: &WebhookListResponse,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(list)?),
        OutputFormat::Table => {
            println!("{:<24} {:<9} {:<30} EVENTS", "ID", "ENABLED", "URL");
            for webhook in &list.webhooks {
                println!(
                    "{:<24} {:<9} {:<30} {}",
                    webhook.id,
                    webhook.enabled,
                    webhook.url,
                    webhook.events.join(",")
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_db_response(response: &DbResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(response)?),
        OutputFormat::Table => {
            for document in &response.documents {
                println!("{}", json_pretty(document)?);
            }
            if let Some(count) = response.count {
                println!("count: {count}");
            }
            if let Some(message) = &response.message {
                println!("{message}");
            }
        }
    }
    Ok(())
}

/// Render the local config record with secrets redacted.
pub(crate) fn render_config(config: &CliConfig, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_pretty(&redact_config(config))?),
        OutputFormat::Table => {
            for line in redacted_config_lines(config)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// The config record as `key: value` lines, secrets redacted. Shared by
/// `mz config list` and the `mz debug` report.
pub(crate) fn redacted_config_lines(config: &CliConfig) -> CliResult<Vec<String>> {
    let value = serde_json::to_value(redact_config(config))
        .map_err(|err| CliError::failure(anyhow!("failed to format config: {err}")))?;
    let Some(object) = value.as_object() else {
        return Err(CliError::failure(anyhow!("config did not render as an object")));
    };
    Ok(object
        .iter()
        .map(|(key, field)| {
            let text = field
                .as_str()
                .map_or_else(|| field.to_string(), str::to_string);
            format!("{key}: {text}")
        })
        .collect())
}

fn redact_config(config: &CliConfig) -> CliConfig {
    let mut redacted = config.clone();
    redacted.api_key = redacted.api_key.as_deref().map(redact_secret);
    redacted.session_token = redacted.session_token.as_deref().map(redact_secret);
    redacted
}

#[must_use]
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64;
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}
