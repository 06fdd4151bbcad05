//! Command-line entry points: serve the API, migrate the schema, and
//! provision staff accounts out of band.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::api::start_api_server;
use crate::config::{self, Settings};
use crate::core_state::CoreState;
use crate::crypto;
use crate::db::{self, DatabaseError};
use crate::models::{NewUser, Role};

#[derive(Debug, Parser)]
#[command(name = "ophtha-core", version, about = config::APP_NAME)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API until Ctrl-C.
    Serve {
        /// Overrides BIND_ADDR.
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Create or upgrade the database schema and exit.
    Migrate,
    /// Provision a staff account. Does nothing if the email already exists.
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long, env = "OPHTHA_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long, default_value = "doctor", value_parser = parse_role)]
        role: Role,
    },
    /// Activate or deactivate a staff account.
    SetActive {
        #[arg(long)]
        email: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| format!("expected one of admin, doctor, tech, reception; got {raw}"))
}

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;
    tracing::info!(
        env = %settings.env,
        database = %settings.database_path.display(),
        "{} v{}",
        config::APP_NAME,
        config::APP_VERSION
    );

    match cli.command {
        Command::Serve { bind } => serve(settings, bind).await,
        Command::Migrate => {
            let conn = db::open_database(&settings.database_path).context("Migration failed")?;
            let tables = db::count_tables(&conn)?;
            println!(
                "Database ready at {} ({tables} tables)",
                settings.database_path.display()
            );
            Ok(())
        }
        Command::CreateUser {
            email,
            password,
            full_name,
            role,
        } => create_user(&settings, &email, &password, &full_name, role),
        Command::SetActive { email, active } => {
            let conn = db::open_database(&settings.database_path)?;
            db::set_user_active(&conn, email.trim(), active)
                .with_context(|| format!("Cannot update {email}"))?;
            println!("{email}: active={active}");
            Ok(())
        }
    }
}

async fn serve(mut settings: Settings, bind: Option<std::net::SocketAddr>) -> Result<()> {
    if let Some(addr) = bind {
        settings.bind_addr = addr;
    }
    let addr = settings.bind_addr;

    let core = Arc::new(CoreState::new(settings));
    core.prepare_database().context("Cannot prepare database")?;

    let mut server = start_api_server(core, addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    println!("Listening on http://{}", server.addr);

    tokio::signal::ctrl_c()
        .await
        .context("Cannot listen for Ctrl-C")?;
    tracing::info!("Ctrl-C received, shutting down");
    server.shutdown();
    server.stopped().await;
    Ok(())
}

fn create_user(
    settings: &Settings,
    email: &str,
    password: &str,
    full_name: &str,
    role: Role,
) -> Result<()> {
    let email = email.trim();
    anyhow::ensure!(!email.is_empty(), "email must not be empty");
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    let conn = db::open_database(&settings.database_path)?;
    if db::get_user_by_email(&conn, email)?.is_some() {
        println!("User {email} already exists");
        return Ok(());
    }

    let user = NewUser {
        email: email.to_string(),
        full_name: full_name.to_string(),
        role,
        password_hash: crypto::hash_password(password)?,
    };
    match db::insert_user(&conn, &user) {
        Ok(created) => {
            tracing::info!(user_id = created.id, role = %created.role, "User provisioned");
            println!("Created {} ({})", created.email, created.role);
            Ok(())
        }
        // Lost a race with another provisioning run
        Err(DatabaseError::ConstraintViolation(_)) => {
            println!("User {email} already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
