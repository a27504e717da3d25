mod config;
mod plan_cmds;
mod serve_cmd;
mod tenant_cmds;
mod user_cmds;

#[cfg(test)]
mod test_util;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use jornada_core::credits::SimulatedGateway;
use jornada_core::generate::GeminiProvider;
use jornada_db::config::DbConfig;
use jornada_db::pool;
use jornada_db::store::PgStore;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "jornada", about = "Multi-tenant backend for 21-day mentoring journeys")]
struct Cli {
    /// Database URL (overrides JORNADA_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a jornada config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = config::DEFAULT_DATABASE_URL)]
        db_url: String,
        /// API key for the generation service
        #[arg(long)]
        ai_api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database and apply migrations
    DbInit,
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Tenant bundle management
    Tenant {
        #[command(subcommand)]
        command: TenantCommands,
    },
    /// User account management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Inspect plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

#[derive(Subcommand)]
pub enum TenantCommands {
    /// Create or update a tenant bundle. Omitted fields keep their current
    /// value (or the default for a new tenant).
    Set {
        /// Subdomain slug (e.g. acme for acme.example.com)
        slug: String,
        #[arg(long)]
        program_name: Option<String>,
        #[arg(long)]
        expert_name: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
        #[arg(long)]
        primary_color: Option<String>,
        #[arg(long)]
        secondary_color: Option<String>,
        #[arg(long)]
        accent_color: Option<String>,
        #[arg(long)]
        headline: Option<String>,
        #[arg(long)]
        subheadline: Option<String>,
        #[arg(long)]
        call_to_action: Option<String>,
        /// Landing page bullet (repeatable; replaces existing bullets)
        #[arg(long = "highlight")]
        highlights: Vec<String>,
    },
    /// List tenant bundles
    List,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account (the only way to create admins)
    Create {
        /// Display name
        name: String,
        /// Email address
        email: String,
        /// Role: mentor, student, admin
        #[arg(long, default_value = "mentor")]
        role: String,
        /// Tenant slug
        #[arg(long, default_value = "default")]
        tenant: String,
        /// Mentor ID (students only)
        #[arg(long)]
        mentor_id: Option<String>,
        /// Starting credits for a mentor (defaults to the signup grant)
        #[arg(long)]
        credits: Option<i32>,
    },
    /// List accounts in a tenant
    List {
        #[arg(long, default_value = "default")]
        tenant: String,
    },
    /// Issue a session token for a user
    Token {
        /// User ID
        user_id: String,
    },
    /// Grant credits without a payment
    Grant {
        /// User ID
        user_id: String,
        /// Credits to add
        amount: i32,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show a mentor's current plan with progress
    Show {
        /// Mentor ID
        mentor_id: String,
    },
}

/// Execute the `jornada init` command: write config file.
fn cmd_init(db_url: &str, ai_api_key: Option<&str>, force: bool) -> anyhow::Result<()> {
    DbConfig::parse(db_url).context("invalid --db-url")?;
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let session_secret = config::generate_session_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            session_secret: session_secret.clone(),
        },
        generation: config::GenerationSection {
            api_key: ai_api_key.unwrap_or_default().to_string(),
            ..config::GenerationSection::default()
        },
        billing: config::BillingSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  auth.session_secret = {}...{}",
        &session_secret[..8],
        &session_secret[56..]
    );
    if cfg.generation.api_key.is_empty() {
        println!("  generation.api_key is empty; set JORNADA_AI_API_KEY before serving");
    }
    println!();
    println!("Next: run `jornada db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `jornada db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = AppConfig::resolve(cli_db_url)?;

    println!("Initializing jornada database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database {}.", resolved.db_config.database_name());
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("jornada db-init complete.");
    Ok(())
}

/// Execute the `jornada serve` command.
async fn cmd_serve(cli_db_url: Option<&str>, bind: &str, port: u16) -> anyhow::Result<()> {
    let resolved = AppConfig::resolve(cli_db_url)?;
    if resolved.gemini.api_key.is_empty() {
        tracing::warn!("no generation API key configured; plan generation will fail");
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let state = serve_cmd::AppState {
        store: Arc::new(PgStore::new(db_pool.clone())),
        provider: Arc::new(GeminiProvider::new(resolved.gemini)),
        payments: Arc::new(SimulatedGateway::approving()),
        tokens: Arc::new(resolved.token_config),
        signup_credits: resolved.signup_credits,
    };
    let result = serve_cmd::run_serve(state, bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            ai_api_key,
            force,
        } => {
            cmd_init(&db_url, ai_api_key.as_deref(), force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            cmd_serve(cli.database_url.as_deref(), &bind, port).await?;
        }
        Commands::Tenant { command } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgStore::new(db_pool.clone());
            let result = tenant_cmds::run_tenant_command(command, &store).await;
            db_pool.close().await;
            result?;
        }
        Commands::User { command } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgStore::new(db_pool.clone());
            let result = user_cmds::run_user_command(command, &store, &resolved).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgStore::new(db_pool.clone());
            let result = plan_cmds::run_plan_command(command, &store).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
