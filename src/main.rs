// Operator CLI for the VolunChain identity core

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::process::ExitCode;
use tracing::{error, info};
use uuid::Uuid;

use volunchain_identity::config::Config;
use volunchain_identity::store::PgCredentialStore;
use volunchain_identity::telemetry::init_tracing;
use volunchain_identity::workflows::RegistrationRequest;
use volunchain_identity::{IdentityError, IdentityService};

#[derive(Parser, Debug)]
#[command(version, about = "Account registration, email verification and wallet login", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the credential tables (requires DATABASE_URL)
    Migrate,

    #[command(flatten)]
    Account(AccountCommand),
}

/// Commands served by a wired identity service
#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Register an account bound to a ledger wallet
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        wallet: String,
    },

    /// Submit an email verification token
    Verify { token: String },

    /// Re-issue and re-send the verification token
    Resend { email: String },

    /// Issue a session token for a verified wallet
    Login { wallet: String },

    /// Show the verification state of an account
    Status {
        /// Account id
        #[arg(long, conflicts_with = "session")]
        account_id: Option<Uuid>,

        /// Session token issued by `login`
        #[arg(long)]
        session: Option<String>,
    },

    /// Show the stored binding and ledger presence of a wallet
    WalletStatus { wallet: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config).context("Failed to initialize logging")?;

    info!(config = ?config, "Configuration loaded");

    match run(cli.command, &config).await {
        Ok(output) => {
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, status = e.status_code(), "Command failed");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<Value, IdentityError> {
    match command {
        Command::Migrate => migrate(config).await,
        Command::Account(command) => {
            let service = IdentityService::from_config(config).await?;
            execute(command, &service).await
        }
    }
}

async fn migrate(config: &Config) -> Result<Value, IdentityError> {
    let url = config.database_url.as_deref().ok_or_else(|| {
        IdentityError::Configuration("DATABASE_URL must be set to migrate".to_string())
    })?;
    PgCredentialStore::connect(url).await?.migrate().await?;
    Ok(json!({ "message": "Schema is up to date" }))
}

async fn execute(command: AccountCommand, service: &IdentityService) -> Result<Value, IdentityError> {
    match command {
        AccountCommand::Register { name, last_name, email, password, wallet } => {
            let request = RegistrationRequest::new(&name, &last_name, &email, &password, &wallet);
            to_json(&service.registration.register(request).await?)
        }
        AccountCommand::Verify { token } => {
            let outcome = service.verification.verify(&token).await?;
            Ok(json!({ "message": outcome.message() }))
        }
        AccountCommand::Resend { email } => {
            let outcome = service.verification.resend(&email).await?;
            Ok(json!({ "message": outcome.message() }))
        }
        AccountCommand::Login { wallet } => to_json(&service.authentication.authenticate(&wallet).await?),
        AccountCommand::Status { account_id, session } => {
            let status = match (account_id, session) {
                (Some(id), _) => service.status.check_status(id).await?,
                (None, Some(token)) => service.status.check_status_for_session(&token).await?,
                (None, None) => {
                    return Err(IdentityError::Validation(
                        "Either --account-id or --session is required".to_string(),
                    ))
                }
            };
            to_json(&status)
        }
        AccountCommand::WalletStatus { wallet } => to_json(&service.wallets.status(&wallet).await?),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, IdentityError> {
    serde_json::to_value(value)
        .map_err(|e| IdentityError::Internal(format!("Failed to serialize output: {}", e)))
}
