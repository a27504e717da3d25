//! Operator-mode CLI handlers for `jornada user` subcommands.
//!
//! - `jornada user create <name> <email> [--role] [--tenant]` -- create an account
//! - `jornada user list [--tenant]`                            -- list accounts
//! - `jornada user token <user-id>`                            -- issue a session token
//! - `jornada user grant <user-id> <amount>`                   -- add credits

use anyhow::{Context, Result, bail};
use uuid::Uuid;

use jornada_core::token::{self, TokenConfig};
use jornada_core::users::{self, NewAccount};
use jornada_db::models::{User, UserRole};
use jornada_db::store::RecordStore;

use crate::UserCommands;
use crate::config::AppConfig;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_user_command(
    command: UserCommands,
    store: &dyn RecordStore,
    config: &AppConfig,
) -> Result<()> {
    match command {
        UserCommands::Create {
            name,
            email,
            role,
            tenant,
            mentor_id,
            credits,
        } => {
            let role: UserRole = role.parse()?;
            let mentor_id = mentor_id.as_deref().map(parse_id).transpose()?;
            let account = NewAccount {
                display_name: name,
                email,
                phone: None,
                role,
                mentor_id,
            };
            let user = create_user(
                store,
                &tenant,
                &account,
                credits.unwrap_or(config.signup_credits),
            )
            .await?;
            let token = token::generate_token(&config.token_config, user.id)?;
            println!("User created.");
            println!();
            println!("  User ID: {}", user.id);
            println!("  Tenant:  {}", user.tenant_slug);
            println!("  Role:    {}", user.role);
            println!("  Credits: {}", user.credits);
            println!("  Token:   {token}");
            Ok(())
        }
        UserCommands::List { tenant } => {
            let users = store.list_users(&tenant).await?;
            if users.is_empty() {
                println!("No users in tenant {tenant}.");
                return Ok(());
            }
            println!(
                "{:<36}  {:<8} {:<24} {:>7}  FLAGS",
                "ID", "ROLE", "EMAIL", "CREDITS"
            );
            for u in &users {
                println!("{}", format_user_row(u));
            }
            Ok(())
        }
        UserCommands::Token { user_id } => {
            let id = parse_id(&user_id)?;
            let token = issue_token(store, &config.token_config, id).await?;
            println!("{token}");
            Ok(())
        }
        UserCommands::Grant { user_id, amount } => {
            let id = parse_id(&user_id)?;
            let user = grant_credits(store, id, amount).await?;
            println!("User {} now has {} credits.", user.id, user.credits);
            Ok(())
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("invalid user ID: {raw}"))
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

/// Create an account in an existing tenant. Admins go through
/// [`users::create_admin`]; everyone else through registration.
pub async fn create_user(
    store: &dyn RecordStore,
    tenant_slug: &str,
    account: &NewAccount,
    signup_credits: i32,
) -> Result<User> {
    let tenant = store
        .get_tenant(tenant_slug)
        .await?
        .with_context(|| format!("tenant {tenant_slug} does not exist"))?;
    let user = match account.role {
        UserRole::Admin => {
            users::create_admin(store, &tenant, &account.display_name, &account.email).await?
        }
        _ => users::register_user(store, &tenant, account, signup_credits).await?,
    };
    Ok(user)
}

pub async fn issue_token(store: &dyn RecordStore, config: &TokenConfig, id: Uuid) -> Result<String> {
    let user = store
        .get_user(id)
        .await?
        .with_context(|| format!("user {id} not found"))?;
    if user.blocked {
        bail!("user {id} is blocked");
    }
    Ok(token::generate_token(config, user.id)?)
}

pub async fn grant_credits(store: &dyn RecordStore, id: Uuid, amount: i32) -> Result<User> {
    if amount <= 0 {
        bail!("amount must be positive, got {amount}");
    }
    store
        .add_credits(id, amount)
        .await?
        .with_context(|| format!("user {id} not found"))
}

fn format_user_row(user: &User) -> String {
    let mut flags = Vec::new();
    if user.blocked {
        flags.push("blocked");
    }
    if !user.notifications_enabled {
        flags.push("muted");
    }
    format!(
        "{:<36}  {:<8} {:<24} {:>7}  {}",
        user.id,
        user.role.to_string(),
        user.email,
        user.credits,
        flags.join(",")
    )
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
