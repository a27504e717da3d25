//! Configuration file management for jornada.
//!
//! A TOML file at `~/.config/jornada/config.toml` plus a resolution chain:
//! CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use jornada_core::generate::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiConfig};
use jornada_core::token::TokenConfig;
use jornada_db::config::DbConfig;

/// Credits granted to a newly registered mentor when nothing is configured.
pub const DEFAULT_SIGNUP_CREDITS: i32 = 1;

/// Database used when no flag, env var or config file names one.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost:5432/jornada";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub billing: BillingSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded session secret (64 hex chars = 32 bytes).
    pub session_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BillingSection {
    #[serde(default = "default_signup_credits")]
    pub signup_credits: i32,
}

impl Default for BillingSection {
    fn default() -> Self {
        Self {
            signup_credits: DEFAULT_SIGNUP_CREDITS,
        }
    }
}

fn default_signup_credits() -> i32 {
    DEFAULT_SIGNUP_CREDITS
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/jornada` or `~/.config/jornada`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("jornada");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("jornada")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

/// Write the config file with 0600 permissions on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// 32 random bytes, hex-encoded.
pub fn generate_session_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

#[derive(Debug)]
pub struct AppConfig {
    pub db_config: DbConfig,
    pub token_config: TokenConfig,
    pub gemini: GeminiConfig,
    pub signup_credits: i32,
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Resolve against the config file on disk, if any.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_db_url, load_config().ok())
    }

    /// - DB URL: `cli_db_url` > `JORNADA_DATABASE_URL` > file > [`DEFAULT_DATABASE_URL`]
    /// - Session secret: `JORNADA_SESSION_SECRET` > file > error
    /// - AI key and model: `JORNADA_AI_API_KEY` / `JORNADA_AI_MODEL` > file > default
    pub fn resolve_with(cli_db_url: Option<&str>, file: Option<ConfigFile>) -> Result<Self> {
        let db_url = match (cli_db_url, env_nonempty("JORNADA_DATABASE_URL"), &file) {
            (Some(url), _, _) => url.to_string(),
            (None, Some(url), _) => url,
            (None, None, Some(cfg)) => cfg.database.url.clone(),
            (None, None, None) => DEFAULT_DATABASE_URL.to_string(),
        };

        let secret_hex = match (env_nonempty("JORNADA_SESSION_SECRET"), &file) {
            (Some(hex), _) => hex,
            (None, Some(cfg)) => cfg.auth.session_secret.clone(),
            (None, None) => bail!(
                "session secret not found; set JORNADA_SESSION_SECRET or run `jornada init` to create a config file"
            ),
        };
        let token_config =
            TokenConfig::from_hex(&secret_hex).context("invalid session secret")?;

        let (generation, signup_credits) = match file {
            Some(cfg) => (cfg.generation, cfg.billing.signup_credits),
            None => (GenerationSection::default(), DEFAULT_SIGNUP_CREDITS),
        };
        let gemini = GeminiConfig {
            api_key: env_nonempty("JORNADA_AI_API_KEY").unwrap_or(generation.api_key),
            model: env_nonempty("JORNADA_AI_MODEL").unwrap_or(generation.model),
            endpoint: generation.endpoint,
        };

        let db_config = DbConfig::parse(&db_url).context("invalid database URL")?;

        Ok(Self {
            db_config,
            token_config,
            gemini,
            signup_credits,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55";

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn clear_env() {
        for var in [
            "JORNADA_DATABASE_URL",
            "JORNADA_SESSION_SECRET",
            "JORNADA_AI_API_KEY",
            "JORNADA_AI_MODEL",
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    fn file_config() -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
            auth: AuthSection {
                session_secret: "bb".repeat(32),
            },
            generation: GenerationSection {
                api_key: "file-key".to_string(),
                ..GenerationSection::default()
            },
            billing: BillingSection { signup_credits: 3 },
        }
    }

    #[test]
    fn session_secret_is_64_hex_chars_and_random() {
        let a = generate_session_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, generate_session_secret());
    }

    #[test]
    fn minimal_file_fills_section_defaults() {
        let cfg: ConfigFile = toml::from_str(
            "[database]\nurl = \"postgresql://h/db\"\n[auth]\nsession_secret = \"00\"\n",
        )
        .unwrap();
        assert_eq!(cfg.generation.model, DEFAULT_MODEL);
        assert_eq!(cfg.generation.endpoint, DEFAULT_ENDPOINT);
        assert!(cfg.generation.api_key.is_empty());
        assert_eq!(cfg.billing.signup_credits, DEFAULT_SIGNUP_CREDITS);
    }

    #[test]
    fn save_config_writes_private_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let result = save_config(&file_config()).and_then(|()| load_config());
        let path = config_path();

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        let loaded = result.unwrap();
        assert_eq!(loaded.database.url, "postgresql://file:5432/filedb");
        assert_eq!(loaded.billing.signup_credits, 3);
        assert!(path.starts_with(tmp.path()));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn cli_flag_beats_env_and_file() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("JORNADA_DATABASE_URL", "postgresql://env:5432/envdb") };

        let config =
            AppConfig::resolve_with(Some("postgresql://cli:5432/clidb"), Some(file_config()))
                .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        clear_env();
    }

    #[test]
    fn env_beats_file() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("JORNADA_DATABASE_URL", "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var("JORNADA_SESSION_SECRET", SECRET) };
        unsafe { std::env::set_var("JORNADA_AI_API_KEY", "env-key") };
        unsafe { std::env::set_var("JORNADA_AI_MODEL", "gemini-env") };

        let config = AppConfig::resolve_with(None, Some(file_config())).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.token_config.secret, hex::decode(SECRET).unwrap());
        assert_eq!(config.gemini.api_key, "env-key");
        assert_eq!(config.gemini.model, "gemini-env");
        assert_eq!(config.signup_credits, 3);

        clear_env();
    }

    #[test]
    fn file_values_apply_without_env() {
        let _lock = lock_env();
        clear_env();

        let config = AppConfig::resolve_with(None, Some(file_config())).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
        assert_eq!(config.token_config.secret, vec![0xbb; 32]);
        assert_eq!(config.gemini.api_key, "file-key");
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
    }

    #[test]
    fn defaults_when_only_secret_is_set() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("JORNADA_SESSION_SECRET", SECRET) };

        let config = AppConfig::resolve_with(None, None).unwrap();
        assert_eq!(config.db_config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.signup_credits, DEFAULT_SIGNUP_CREDITS);
        assert!(config.gemini.api_key.is_empty());

        clear_env();
    }

    #[test]
    fn unusable_database_url_is_an_error() {
        let _lock = lock_env();
        clear_env();
        unsafe { std::env::set_var("JORNADA_SESSION_SECRET", SECRET) };

        let err = AppConfig::resolve_with(Some("postgresql://cli:5432/my-db"), None).unwrap_err();
        assert!(format!("{err:#}").contains("invalid database URL"));

        clear_env();
    }

    #[test]
    fn missing_secret_is_an_error() {
        let _lock = lock_env();
        clear_env();

        let msg = AppConfig::resolve_with(None, None).unwrap_err().to_string();
        assert!(msg.contains("session secret not found"), "unexpected error: {msg}");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        assert!(config_path().ends_with("jornada/config.toml"));
    }
}
