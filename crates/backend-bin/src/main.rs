mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use passgate_lib::{
    auth::{
        secret_generator::generate_secret_with_size, validate_password, CredentialHasher,
        HashedCredential,
    },
    common::{LoginRequest, RegisterRequest, TokenDomain},
    config::Settings,
    error::AppError,
    AppState,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging comes from the config when it parses; secrets are validated
    // only by the commands that need them.
    let loaded: Result<Settings, AppError> = Settings::figment(&cli.config)
        .extract()
        .map_err(AppError::from);
    let (level, json) = match &loaded {
        Ok(settings) => (settings.log_level.clone(), settings.log_json),
        Err(_) => ("info".to_string(), false),
    };
    init_tracing(&level, json);
    if let Err(e) = &loaded {
        tracing::debug!(config = %cli.config.display(), error = %e, "configuration not loaded");
    }

    match cli.command {
        Command::CheckPassword { password } => {
            validate_password(&password)?;
            println!("password satisfies the policy");
        },
        Command::HashPassword { password } => {
            let hash = CredentialHasher::new().hash(&password)?;
            println!("{}", hash.as_str());
        },
        Command::VerifyPassword { hash, password } => {
            let stored = HashedCredential::from_phc(hash);
            if !CredentialHasher::new().verify(&stored, &password) {
                bail!("password does not match");
            }
            println!("password matches");
        },
        Command::GenerateSecret { bytes } => {
            println!("{}", generate_secret_with_size(bytes));
        },
        Command::IssueToken { domain, subject } => {
            let state = app_state(loaded)?;
            let token = state.issuer.issue(&subject.into(), domain.into())?;
            println!("{token}");
        },
        Command::ValidateToken { domain, token } => {
            let state = app_state(loaded)?;
            let claims = state.validator.validate_claims(&token, domain.into())?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        },
        Command::ShowConfig => {
            let settings = loaded?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            println!(
                "access secret: {} bytes, refresh secret: {} bytes",
                settings.tokens.access_secret.len(),
                settings.tokens.refresh_secret.len()
            );
        },
        Command::Demo {
            email,
            username,
            password,
        } => {
            let state = app_state(loaded)?;
            run_demo(&state, email, username, password).await?;
        },
    }

    Ok(())
}

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

fn app_state(loaded: Result<Settings, AppError>) -> anyhow::Result<AppState> {
    let settings = loaded.context("failed to load configuration")?;
    AppState::in_memory(settings).context("invalid configuration")
}

async fn run_demo(
    state: &AppState,
    email: String,
    username: String,
    password: String,
) -> anyhow::Result<()> {
    let account = state
        .auth
        .register(RegisterRequest {
            email,
            username: username.clone(),
            password: password.clone(),
        })
        .await?;
    println!("registered: {}", serde_json::to_string_pretty(&account)?);

    let tokens = state
        .auth
        .login(LoginRequest {
            identifier: username,
            password,
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: Some("passgate-cli".to_string()),
        })
        .await?;
    println!("login: {}", serde_json::to_string_pretty(&tokens)?);

    let subject = state.auth.authenticate(&tokens.access_token).await?;
    let sessions = state.auth.list_sessions(&subject).await?;
    println!("sessions: {}", serde_json::to_string_pretty(&sessions)?);

    let refreshed = state.auth.refresh(&tokens.refresh_token).await?;
    let claims = state
        .validator
        .validate_claims(&refreshed.access_token, TokenDomain::Access)?;
    println!("refreshed access token expires at {}", claims.exp);

    state.auth.logout(&tokens.refresh_token).await?;
    match state.auth.refresh(&tokens.refresh_token).await {
        Err(AppError::SessionRevoked) => println!("logout: refresh token revoked"),
        Err(e) => return Err(e.into()),
        Ok(_) => bail!("refresh token still accepted after logout"),
    }

    Ok(())
}
