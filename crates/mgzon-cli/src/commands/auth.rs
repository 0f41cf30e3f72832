//! Authentication and session management: login, logout, whoami, setup.

use std::io::{self, IsTerminal, Write};

use chrono::Utc;
use colored::Colorize;
use mgzon_api_models::{LoginRequest, LoginResponse, UserProfile};
use mgzon_config::CliConfig;
use reqwest::StatusCode;

use crate::cli::{LoginArgs, OutputFormat};
use crate::client::{
    AppContext, CliError, CliResult, ENV_API_KEY, USER_AGENT, classify_response, transport_error,
};
use crate::output::render_profile;

/// Outcome of one login attempt: rejected keys are recoverable (the user can
/// be prompted once more), everything else is terminal.
enum LoginAttempt {
    Success(Box<LoginResponse>),
    Rejected(CliError),
}

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let key = match args.key.or_else(|| ctx.api_key().map(str::to_string)) {
        Some(key) => key,
        None => prompt_api_key("MGZON API key: ")?,
    };

    match attempt_login(ctx, &key).await? {
        LoginAttempt::Success(response) => persist_session(ctx, key, &response),
        LoginAttempt::Rejected(rejection) => {
            if !io::stdin().is_terminal() {
                return Err(rejection);
            }
            // One interactive re-login, then give up.
            eprintln!("{} {}", "warning:".yellow(), rejection.display_message());
            let retry_key = prompt_api_key("Try another API key: ")?;
            match attempt_login(ctx, &retry_key).await? {
                LoginAttempt::Success(response) => persist_session(ctx, retry_key, &response),
                LoginAttempt::Rejected(rejection) => Err(rejection),
            }
        }
    }
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    // Best effort server-side: a dead network must not lock the user into a
    // stale local session.
    if let Some(key) = ctx.api_key() {
        let url = ctx.endpoint("auth/logout")?;
        match ctx.client.post(url).bearer_auth(key).send().await {
            Ok(response) if !response.status().is_success() => {
                let err = classify_response(response).await;
                eprintln!(
                    "{} server-side logout failed: {}",
                    "warning:".yellow(),
                    err.display_message()
                );
            }
            Err(err) => {
                eprintln!(
                    "{} server-side logout failed: {}",
                    "warning:".yellow(),
                    transport_error("/auth/logout", &err).display_message()
                );
            }
            Ok(_) => {}
        }
    }

    let mut config = ctx.store.load()?;
    config.clear_credentials();
    ctx.store.replace(&config)?;
    println!("{} local credentials cleared", "Logged out:".green());
    Ok(())
}

pub(crate) async fn handle_whoami(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let key = ctx.require_api_key()?;
    let url = ctx.endpoint("auth/verify")?;
    let response = ctx
        .client
        .post(url)
        .bearer_auth(key)
        .json(&LoginRequest {
            api_key: key.to_string(),
            client: USER_AGENT.to_string(),
        })
        .send()
        .await
        .map_err(|err| transport_error("/auth/verify", &err))?;

    if response.status().is_success() {
        let profile = response.json::<UserProfile>().await.map_err(|err| {
            CliError::failure(anyhow::anyhow!("failed to parse profile: {err}"))
        })?;
        render_profile(&profile, format)
    } else {
        Err(classify_response(response).await)
    }
}

pub(crate) async fn handle_setup(ctx: &AppContext) -> CliResult<()> {
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "setup is interactive; use `mz config set` and `mz login` when scripting",
        ));
    }

    println!("MGZON CLI setup. Press enter to keep the value in brackets.");

    let current = ctx.store.load()?;
    let api_url = prompt_line("API URL", current.api_url())?;
    let environment = prompt_line(
        "Default environment",
        current.default_environment.as_deref().unwrap_or("production"),
    )?;
    let theme = prompt_line("Theme (dark/light)", current.theme.as_deref().unwrap_or("dark"))?;
    let editor = prompt_line("Editor", current.editor.as_deref().unwrap_or("code"))?;

    ctx.store.save(CliConfig {
        api_url: Some(api_url),
        default_environment: Some(environment),
        theme: Some(theme),
        editor: Some(editor),
        ..CliConfig::default()
    })?;
    println!("{} preferences written to {}", "Saved:".green(), ctx.store.path().display());

    let key = rpassword::prompt_password("API key (leave blank to skip login): ")
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read API key: {err}")))?;
    let key = key.trim().to_string();
    if key.is_empty() {
        println!("Skipped login; run `mz login` when ready.");
        return Ok(());
    }

    match attempt_login(ctx, &key).await? {
        LoginAttempt::Success(response) => persist_session(ctx, key, &response),
        LoginAttempt::Rejected(rejection) => Err(rejection),
    }
}

async fn attempt_login(ctx: &AppContext, key: &str) -> CliResult<LoginAttempt> {
    let url = ctx.endpoint("cli/auth/login")?;
    let response = ctx
        .client
        .post(url)
        .json(&LoginRequest {
            api_key: key.to_string(),
            client: USER_AGENT.to_string(),
        })
        .send()
        .await
        .map_err(|err| transport_error("/cli/auth/login", &err))?;

    if response.status().is_success() {
        let body = response.json::<LoginResponse>().await.map_err(|err| {
            CliError::failure(anyhow::anyhow!("failed to parse login response: {err}"))
        })?;
        Ok(LoginAttempt::Success(Box::new(body)))
    } else if response.status() == StatusCode::UNAUTHORIZED {
        Ok(LoginAttempt::Rejected(classify_response(response).await))
    } else {
        Err(classify_response(response).await)
    }
}

fn persist_session(ctx: &AppContext, key: String, response: &LoginResponse) -> CliResult<()> {
    let user = &response.user;
    ctx.store.save(CliConfig {
        api_key: Some(key),
        session_token: Some(response.session_token.clone()),
        expires_at: Some(response.expires_at),
        last_login: Some(Utc::now()),
        user_id: Some(user.user_id.clone()),
        email: Some(user.email.clone()),
        name: user.name.clone(),
        role: user.role.clone(),
        is_developer: Some(user.is_developer),
        is_seller: Some(user.is_seller),
        is_admin: Some(user.is_admin),
        ..CliConfig::default()
    })?;
    println!("{} {}", "Logged in as".green(), user.email);
    Ok(())
}

fn prompt_api_key(label: &str) -> CliResult<String> {
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(format!(
            "API key required; pass it as an argument or set {ENV_API_KEY} when running non-interactively"
        )));
    }
    let key = rpassword::prompt_password(label)
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read API key: {err}")))?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(CliError::validation("API key cannot be empty"));
    }
    Ok(key)
}

fn prompt_line(label: &str, default: &str) -> CliResult<String> {
    print!("{label} [{default}]: ");
    io::stdout()
        .flush()
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to flush stdout: {err}")))?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read input: {err}")))?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testutil::context_for;
    use httpmock::prelude::*;
    use serde_json::json;

    fn login_body() -> serde_json::Value {
        json!({
            "sessionToken": "tok_123",
            "expiresAt": "2026-12-01T00:00:00Z",
            "user": {
                "userId": "u_1",
                "email": "dev@example.com",
                "name": "Dev",
                "role": "developer",
                "isDeveloper": true
            }
        })
    }

    #[tokio::test]
    async fn login_posts_key_and_persists_session() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/cli/auth/login")
                .json_body_includes(r#"{"apiKey": "mgz_key"}"#);
            then.status(200).json_body(login_body());
        });

        let ctx = context_for(&server, None);
        handle_login(
            &ctx,
            LoginArgs {
                key: Some("mgz_key".to_string()),
            },
        )
        .await
        .expect("login succeeds");
        mock.assert();

        let stored = ctx.store.load().expect("config readable");
        assert_eq!(stored.api_key.as_deref(), Some("mgz_key"));
        assert_eq!(stored.session_token.as_deref(), Some("tok_123"));
        assert_eq!(stored.email.as_deref(), Some("dev@example.com"));
        assert_eq!(stored.is_developer, Some(true));
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn login_rejection_surfaces_auth_hint_when_non_interactive() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/cli/auth/login");
            then.status(401).json_body(json!({"message": "unknown key"}));
        });

        let ctx = context_for(&server, None);
        let err = handle_login(
            &ctx,
            LoginArgs {
                key: Some("bad_key".to_string()),
            },
        )
        .await
        .expect_err("rejected key fails");
        assert!(err.display_message().contains("mz login"));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn logout_clears_credentials_even_when_server_fails() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/logout");
            then.status(500);
        });

        let ctx = context_for(&server, Some("mgz_key"));
        ctx.store
            .save(CliConfig {
                api_key: Some("mgz_key".to_string()),
                session_token: Some("tok".to_string()),
                email: Some("dev@example.com".to_string()),
                theme: Some("dark".to_string()),
                ..CliConfig::default()
            })
            .expect("seed config");

        handle_logout(&ctx).await.expect("logout succeeds locally");

        let stored = ctx.store.load().expect("config readable");
        assert!(stored.api_key.is_none());
        assert!(stored.session_token.is_none());
        assert!(stored.email.is_none());
        assert_eq!(stored.theme.as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn whoami_verifies_with_bearer_credential() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/verify")
                .header("authorization", "Bearer mgz_key");
            then.status(200).json_body(json!({
                "userId": "u_1",
                "email": "dev@example.com",
                "isAdmin": true
            }));
        });

        let ctx = context_for(&server, Some("mgz_key"));
        handle_whoami(&ctx, OutputFormat::Table)
            .await
            .expect("whoami succeeds");
        mock.assert();
    }

    #[tokio::test]
    async fn whoami_without_key_points_at_login() {
        let server = MockServer::start_async().await;
        let ctx = context_for(&server, None);
        let err = handle_whoami(&ctx, OutputFormat::Table)
            .await
            .expect_err("no key configured");
        assert!(matches!(err, CliError::Validation(message) if message.contains("mz login")));
    }
}
