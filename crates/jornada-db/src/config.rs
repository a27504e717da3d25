//! Connection target for the journey database.
//!
//! Built from a single PostgreSQL URL. Where the URL comes from (flag,
//! env, config file) is decided by the binary, not here.

use anyhow::{Context, Result, bail};

/// A validated PostgreSQL URL split into server and database parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Full URL, as given.
    pub database_url: String,
    /// `scheme://[user[:pass]@]host[:port]`
    server: String,
    database: String,
    /// Query string without the `?`, e.g. `sslmode=require`.
    params: Option<String>,
}

impl DbConfig {
    /// Parse `url`. The database name must be a plain identifier
    /// (`[A-Za-z0-9_]+`) because `db-init` interpolates it into
    /// `CREATE DATABASE`.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let (base, params) = match url.split_once('?') {
            Some((base, params)) => (base, Some(params).filter(|p| !p.is_empty())),
            None => (url, None),
        };

        let authority_start = base
            .find("://")
            .map(|i| i + 3)
            .with_context(|| format!("database URL {url:?} has no scheme"))?;
        let path_start = base[authority_start..]
            .find('/')
            .map(|i| authority_start + i)
            .with_context(|| format!("database URL {url:?} names no database"))?;

        let database = &base[path_start + 1..];
        if database.is_empty() {
            bail!("database URL {url:?} names no database");
        }
        if !database.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("database name {database:?} must use only letters, digits and '_'");
        }

        Ok(Self {
            database_url: url.to_string(),
            server: base[..path_start].to_string(),
            database: database.to_string(),
            params: params.map(str::to_string),
        })
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Same server and parameters, `postgres` maintenance database.
    pub fn maintenance_url(&self) -> String {
        let mut url = format!("{}/postgres", self.server);
        if let Some(params) = &self.params {
            url.push('?');
            url.push_str(params);
        }
        url
    }
}
