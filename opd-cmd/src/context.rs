//! Shared state of one CLI invocation.

use anyhow::bail;
use clap::Args;
use opd_core::client::{ApiClient, ApiConfig};
use opd_core::storage::ClientStorage;
use opd_data::navigation::guard_route;
use opd_data::permissions::{PermissionStore, RouteDecision};
use opd_db::Database;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// Connection and output settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Backend base URL, e.g. https://ops.example.com
    #[arg(long, env = "OPD_API_URL", global = true)]
    pub api_url: Option<String>,

    /// SQLite file holding the session and note cache
    #[arg(long, env = "OPD_STORE", default_value = "opsdesk.db", global = true)]
    pub store: PathBuf,

    /// Timeout of ordinary requests, in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Timeout of spreadsheet imports, in seconds
    #[arg(long, default_value_t = 300, global = true)]
    pub import_timeout_secs: u64,

    /// Print JSON instead of tab-separated tables
    #[arg(long, global = true)]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            store: PathBuf::from("opsdesk.db"),
            timeout_secs: 30,
            import_timeout_secs: 300,
            json: false,
        }
    }
}

pub struct Context {
    pub config: Config,
    pub storage: Rc<Database>,
    pub permissions: PermissionStore,
}

impl Context {
    pub fn open(config: Config) -> anyhow::Result<Self> {
        let storage = Database::open(&config.store)?;
        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: Config, storage: Database) -> Self {
        let permissions = PermissionStore::load(&storage);
        Self {
            config,
            storage: Rc::new(storage),
            permissions,
        }
    }

    pub fn api(&self) -> anyhow::Result<ApiClient> {
        let Some(base_url) = self.config.api_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            bail!("No backend configured. Pass --api-url or set OPD_API_URL.");
        };
        let config = ApiConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(self.config.timeout_secs),
            import_timeout: Duration::from_secs(self.config.import_timeout_secs),
        };
        let storage: Rc<dyn ClientStorage> = self.storage.clone();
        Ok(ApiClient::new(config, storage)?)
    }

    /// Refuse to run a command whose screen the session may not open.
    pub fn guard(&self, route: &str) -> anyhow::Result<()> {
        match guard_route(&self.permissions, route) {
            RouteDecision::Render => Ok(()),
            RouteDecision::Redirect(target) => {
                bail!("Not permitted to open {}. Your landing page is {}.", route, target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_core::storage::keys;

    fn context(permissions: &str) -> Context {
        let db = Database::open_in_memory().unwrap();
        db.set_item(keys::PERMISSIONS, permissions).unwrap();
        Context::with_storage(Config::default(), db)
    }

    #[test]
    fn guard_follows_cached_permissions() {
        let ctx = context(r#"["swr.view"]"#);
        assert!(ctx.guard("/swr/signal").is_ok());
        let err = ctx.guard("/companies").unwrap_err();
        assert!(err.to_string().contains("/profile"));
    }

    #[test]
    fn api_needs_a_base_url() {
        let ctx = context("[]");
        assert!(ctx.api().is_err());

        let mut config = Config::default();
        config.api_url = Some("http://ops.local".to_string());
        let ctx = Context::with_storage(config, Database::open_in_memory().unwrap());
        assert!(ctx.api().is_ok());
    }
}
