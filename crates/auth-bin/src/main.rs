// ============================
// crates/auth-bin/src/main.rs
// ============================
//! `tokenwarden` operator CLI.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use auth_lib::{
    auth::{select_hasher, TokenIssuer},
    config::{Settings, DEFAULT_CONFIG_FILE, DEFAULT_HASH_COST},
    AppState,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokenwarden_common::{LoginRequest, SignupRequest};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tokenwarden", version, about = "Credential and session core tooling")]
struct Cli {
    /// Config file, layered under TOKENWARDEN_* environment variables
    #[arg(long, short, global = true, env = "TOKENWARDEN_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hash a password or token with the compiled-in backend
    Hash {
        value: String,
        #[arg(long, default_value_t = DEFAULT_HASH_COST)]
        cost: u32,
    },
    /// Check a value against a stored hash
    Verify { value: String, hash: String },
    /// Verify a token and print its claims
    Inspect {
        token: String,
        #[arg(long, value_enum, default_value_t = TokenKind::Access)]
        kind: TokenKind,
    },
    /// Run signup, login, refresh and logout against the configured store
    Lifecycle {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Client origin used for the rate-limit key
        #[arg(long, default_value = "127.0.0.1")]
        origin: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TokenKind {
    Access,
    Refresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Hash { value, cost } => {
            init_tracing("warn", false);
            let hasher = select_hasher();
            let hash = tokio::task::spawn_blocking(move || hasher.hash(&value, cost)).await??;
            println!("{hash}");
        }
        Command::Verify { value, hash } => {
            init_tracing("warn", false);
            if !select_hasher().verify(&value, &hash) {
                bail!("value does not match hash");
            }
            println!("ok");
        }
        Command::Inspect { token, kind } => {
            let settings = load_settings(&cli.config)?;
            let issuer = TokenIssuer::from_settings(&settings)?;
            let claims = match kind {
                TokenKind::Access => serde_json::to_value(issuer.verify_access_token(&token)?)?,
                TokenKind::Refresh => serde_json::to_value(issuer.verify_refresh_token(&token)?)?,
            };
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Command::Lifecycle {
            email,
            password,
            origin,
        } => {
            let settings = load_settings(&cli.config)?;
            let state = AppState::from_settings(settings)?;
            lifecycle(&state, &email, &password, &origin).await?;
        }
    }

    Ok(())
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let settings = Settings::load_from(path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    init_tracing(&settings.log_level, settings.log_json);
    tracing::debug!(path = %path.display(), environment = %settings.environment, "settings loaded");
    Ok(settings)
}

/// RUST_LOG wins over the configured level
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn lifecycle(
    state: &AppState,
    email: &str,
    password: &str,
    origin: &str,
) -> anyhow::Result<()> {
    let auth = &state.auth;

    let signup = auth
        .signup(SignupRequest {
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            ..SignupRequest::default()
        })
        .await?;
    let user_id = signup.user.id;
    report("signup", json!({ "user": signup.user }));

    let login = auth
        .login(
            Some(origin),
            LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await?;
    report("login", json!({ "accessToken": login.access_token }));

    let rotated = auth.refresh(user_id, &login.refresh_token).await?;
    report("refresh", json!({ "accessToken": rotated.access_token }));

    let stale = auth.refresh(user_id, &login.refresh_token).await;
    report(
        "stale_refresh",
        json!({ "rejected": stale.is_err(), "error": stale.err().map(|e| e.to_string()) }),
    );

    auth.logout(user_id).await?;
    report("logout", json!({ "userId": user_id }));

    let revoked = auth.refresh(user_id, &rotated.refresh_token).await;
    report("refresh_after_logout", json!({ "rejected": revoked.is_err() }));

    report(
        "cookie",
        serde_json::to_value(auth.refresh_cookie_options())?,
    );
    Ok(())
}

fn report(step: &str, detail: serde_json::Value) {
    println!("{}", json!({ "step": step, "detail": detail }));
}
