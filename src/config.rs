//! Runtime configuration
//!
//! Every setting can come from a CLI flag or its environment variable; `.env`
//! files are loaded into the environment before parsing.

use anyhow::Result;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Database path that selects the in-memory store.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Parser, Debug, Clone)]
#[command(name = "folio")]
#[command(about = "Portfolio backend: users, blogs, projects and payments")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: String,

    /// SQLite database file (`:memory:` for a throwaway in-process store)
    #[arg(long, env = "DB_PATH", default_value = "folio.db")]
    pub db_path: String,

    /// Secret used to sign identity tokens
    #[arg(long, env = "USER_TOKEN", hide_env_values = true)]
    pub token_secret: String,

    /// Stripe secret key; payment intents are disabled without it
    #[arg(long, env = "PAYMENT_KEY", hide_env_values = true)]
    pub payment_key: Option<String>,

    /// Stripe API base URL
    #[arg(long, env = "STRIPE_API_BASE", default_value = "https://api.stripe.com")]
    pub stripe_api_base: String,

    /// Email granted the admin role at startup
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,
}

impl Config {
    /// Semantic checks clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.token_secret.trim().is_empty() {
            anyhow::bail!("USER_TOKEN is empty; refusing to start without a signing secret");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", self.bind, e))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn payment_key(&self) -> Option<&str> {
        self.payment_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Database location; relative paths are taken from the crate directory,
    /// not the caller's cwd.
    pub fn resolved_db_path(&self) -> String {
        if self.db_path == IN_MEMORY_DB {
            return self.db_path.clone();
        }
        let p = PathBuf::from(&self.db_path);
        if p.is_absolute() {
            return p.to_string_lossy().to_string();
        }
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join(p)
            .to_string_lossy()
            .to_string()
    }
}
