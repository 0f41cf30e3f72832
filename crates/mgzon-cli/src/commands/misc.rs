//! Update checks, diagnostics, and the static help commands.

use anyhow::anyhow;
use colored::Colorize;
use mgzon_api_models::{HealthResponse, VersionInfo};
use mgzon_config::redact_secret;

use crate::client::{AppContext, CliError, CliResult, classify_response, transport_error};
use crate::output::redacted_config_lines;

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const DOCS_URL: &str = "https://docs.mgzon.com/cli";
const SUPPORT_URL: &str = "https://mgzon.com/support";
const SUPPORT_EMAIL: &str = "support@mgzon.com";

pub(crate) async fn handle_update(ctx: &AppContext) -> CliResult<()> {
    let url = ctx.endpoint("cli/version")?;
    // Unauthenticated: the release channel is public.
    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| transport_error("/cli/version", &err))?;

    if !response.status().is_success() {
        return Err(classify_response(response).await);
    }
    let info = response
        .json::<VersionInfo>()
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to parse version info: {err}")))?;

    if let Some(min) = &info.min_supported
        && version_lt(CURRENT_VERSION, min)
    {
        println!(
            "{} mz {CURRENT_VERSION} is below the minimum supported release {min}; update now",
            "warning:".yellow().bold()
        );
    }

    if version_lt(CURRENT_VERSION, &info.latest) {
        println!("{} {} is available (you have {CURRENT_VERSION})", "Update".green(), info.latest);
        if let Some(url) = &info.download_url {
            println!("download: {url}");
        }
    } else {
        println!("mz {CURRENT_VERSION} is up to date");
    }
    Ok(())
}

pub(crate) async fn handle_debug(ctx: &AppContext) -> CliResult<()> {
    println!("mz version: {CURRENT_VERSION}");
    println!("platform: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    println!("config file: {}", ctx.store.path().display());
    println!("api url: {}", ctx.base_url);
    match ctx.api_key() {
        Some(key) => println!("api key: {}", redact_secret(key)),
        None => println!("api key: (not set)"),
    }
    println!("config:");
    for line in redacted_config_lines(&ctx.config)? {
        println!("  {line}");
    }

    let url = ctx.endpoint("health")?;
    match ctx.client.get(url).send().await {
        Ok(response) if response.status().is_success() => {
            let status = response
                .json::<HealthResponse>()
                .await
                .map_or_else(|_| "ok".to_string(), |health| health.status);
            println!("api health: {} ({status})", "reachable".green());
        }
        Ok(response) => {
            println!(
                "api health: {} (status {})",
                "unhealthy".red(),
                response.status()
            );
        }
        Err(err) => {
            println!(
                "api health: {} ({})",
                "unreachable".red(),
                transport_error("/health", &err).display_message()
            );
        }
    }
    Ok(())
}

pub(crate) fn handle_docs() {
    println!("documentation: {DOCS_URL}");
    println!("api reference: {DOCS_URL}/api");
}

pub(crate) fn handle_support() {
    println!("support portal: {SUPPORT_URL}");
    println!("email: {SUPPORT_EMAIL}");
}

/// Numeric major.minor.patch comparison; unparsable versions never warn.
fn version_lt(current: &str, other: &str) -> bool {
    match (parse_version(current), parse_version(other)) {
        (Some(current), Some(other)) => current < other,
        _ => false,
    }
}

fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.trim().trim_start_matches('v').splitn(3, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts
        .next()
        .map_or(Some(0), |part| part.parse().ok())?;
    Some((major, minor, patch))
}
