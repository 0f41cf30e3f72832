//! Local configuration commands backed by the `~/.mgzon/config.json` store.

use colored::Colorize;
use mgzon_config::{CliConfig, ConfigError, SETTABLE_KEYS, redact_secret};

use crate::cli::{ConfigKeyArgs, ConfigSetArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_config;

pub(crate) fn handle_get(ctx: &AppContext, args: &ConfigKeyArgs) -> CliResult<()> {
    let value = ctx
        .config
        .get_key(&args.key)
        .map_err(unknown_key_to_validation)?;
    match value {
        Some(value) if CliConfig::is_secret_key(&args.key) => {
            println!("{}", redact_secret(&value));
        }
        Some(value) => println!("{value}"),
        None => println!("(unset)"),
    }
    Ok(())
}

pub(crate) fn handle_set(ctx: &AppContext, args: ConfigSetArgs) -> CliResult<()> {
    if args.key == "apiUrl" {
        args.value.parse::<reqwest::Url>().map_err(|err| {
            CliError::validation(format!("'{}' is not a valid URL: {err}", args.value))
        })?;
    }

    let mut config = ctx.store.load()?;
    config
        .set_key(&args.key, args.value.clone())
        .map_err(unknown_key_to_validation)?;
    ctx.store.replace(&config)?;

    let shown = if CliConfig::is_secret_key(&args.key) {
        redact_secret(&args.value)
    } else {
        args.value
    };
    println!("{} {} = {shown}", "Set".green(), args.key);
    Ok(())
}

pub(crate) fn handle_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    render_config(&ctx.config, format)
}

pub(crate) fn handle_path(ctx: &AppContext) -> CliResult<()> {
    println!("{}", ctx.store.path().display());
    Ok(())
}

pub(crate) fn handle_clear(ctx: &AppContext) -> CliResult<()> {
    ctx.store.replace(&CliConfig::default())?;
    println!("{} {}", "Cleared".green(), ctx.store.path().display());
    Ok(())
}

/// `config get`/`config set` treat unknown keys as user error, not failure.
fn unknown_key_to_validation(error: ConfigError) -> CliError {
    match error {
        ConfigError::UnknownKey { key } => CliError::validation(format!(
            "unknown configuration key '{key}'; settable keys: {}",
            SETTABLE_KEYS.join(", ")
        )),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testutil::context_for;
    use httpmock::MockServer;

    #[test]
    fn get_redacts_secret_keys() {
        let server = MockServer::start();
        let mut ctx = context_for(&server, None);
        ctx.config.api_key = Some("mgz_live_abcd1234".to_string());

        handle_get(
            &ctx,
            &ConfigKeyArgs {
                key: "apiKey".to_string(),
            },
        )
        .expect("get");
    }

    #[test]
    fn get_rejects_unknown_keys_with_the_settable_list() {
        let server = MockServer::start();
        let ctx = context_for(&server, None);
        let err = handle_get(
            &ctx,
            &ConfigKeyArgs {
                key: "nope".to_string(),
            },
        )
        .expect_err("unknown key");
        assert!(matches!(err, CliError::Validation(message) if message.contains("apiUrl")));
    }

    #[test]
    fn set_persists_the_value() {
        let server = MockServer::start();
        let ctx = context_for(&server, None);

        handle_set(
            &ctx,
            ConfigSetArgs {
                key: "theme".to_string(),
                value: "dark".to_string(),
            },
        )
        .expect("set");

        let reloaded = ctx.store.load().expect("load");
        assert_eq!(reloaded.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn set_validates_api_url() {
        let server = MockServer::start();
        let ctx = context_for(&server, None);
        let err = handle_set(
            &ctx,
            ConfigSetArgs {
                key: "apiUrl".to_string(),
                value: "not a url".to_string(),
            },
        )
        .expect_err("bad URL");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[test]
    fn clear_resets_the_file_to_defaults() {
        let server = MockServer::start();
        let ctx = context_for(&server, None);
        ctx.store
            .save(CliConfig {
                api_key: Some("key".to_string()),
                theme: Some("dark".to_string()),
                ..CliConfig::default()
            })
            .expect("seed");

        handle_clear(&ctx).expect("clear");
        let reloaded = ctx.store.load().expect("load");
        assert_eq!(reloaded, CliConfig::default());
    }
}
