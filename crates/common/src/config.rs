//! apiprobe configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Prefix for environment overrides (`APIPROBE_STORES_URL`, ...)
pub const ENV_PREFIX: &str = "APIPROBE";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Base URLs of the services under test
    pub services: ServiceEndpoints,

    /// Identity provider settings
    pub identity: IdentityConfig,
}

/// The services the harness can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Health,
    Agents,
    Stores,
    Monitoring,
    Offers,
    Products,
    Search,
    Users,
}

impl Service {
    pub const ALL: [Service; 8] = [
        Service::Health,
        Service::Agents,
        Service::Stores,
        Service::Monitoring,
        Service::Offers,
        Service::Products,
        Service::Search,
        Service::Users,
    ];

    /// Key used in the `[services]` table and in env overrides
    pub fn key(&self) -> &'static str {
        match self {
            Service::Health => "health",
            Service::Agents => "agents",
            Service::Stores => "stores",
            Service::Monitoring => "monitoring",
            Service::Offers => "offers",
            Service::Products => "products",
            Service::Search => "search",
            Service::Users => "users",
        }
    }

    /// Human label used in "not configured" messages
    pub fn label(&self) -> &'static str {
        match self {
            Service::Health => "Health check",
            Service::Agents => "AI",
            Service::Stores => "Stores",
            Service::Monitoring => "Monitoring",
            Service::Offers => "Offers",
            Service::Products => "Products",
            Service::Search => "Search",
            Service::Users => "Users",
        }
    }

    pub fn env_var(&self) -> String {
        format!("{}_{}_URL", ENV_PREFIX, self.key().to_uppercase())
    }
}

/// Base URL per service. `None` means not configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoints {
    pub health: Option<String>,
    pub agents: Option<String>,
    pub stores: Option<String>,
    pub monitoring: Option<String>,
    pub offers: Option<String>,
    pub products: Option<String>,
    pub search: Option<String>,
    pub users: Option<String>,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            health: None,
            agents: None,
            stores: Some("https://servicolojas-8lycof1gv-jeanmnorhens-projects.vercel.app".to_string()),
            monitoring: None,
            offers: None,
            products: Some("https://servico-produtos-mjf9dfpf7-jeanmnorhens-projects.vercel.app".to_string()),
            search: None,
            users: Some("https://servico-usuarios-c5ifynq4r-jeanmnorhens-projects.vercel.app".to_string()),
        }
    }
}

impl ServiceEndpoints {
    fn slot(&mut self, service: Service) -> &mut Option<String> {
        match service {
            Service::Health => &mut self.health,
            Service::Agents => &mut self.agents,
            Service::Stores => &mut self.stores,
            Service::Monitoring => &mut self.monitoring,
            Service::Offers => &mut self.offers,
            Service::Products => &mut self.products,
            Service::Search => &mut self.search,
            Service::Users => &mut self.users,
        }
    }

    pub fn get(&self, service: Service) -> Option<&str> {
        let url = match service {
            Service::Health => &self.health,
            Service::Agents => &self.agents,
            Service::Stores => &self.stores,
            Service::Monitoring => &self.monitoring,
            Service::Offers => &self.offers,
            Service::Products => &self.products,
            Service::Search => &self.search,
            Service::Users => &self.users,
        };
        url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn set(&mut self, service: Service, url: impl Into<String>) {
        *self.slot(service) = Some(url.into());
    }

    /// Base URL for `service`, or an error naming the missing setting
    pub fn require(&self, service: Service) -> Result<&str> {
        self.get(service).ok_or_else(|| {
            Error::InvalidConfig(format!("{} API URL is not configured.", service.label()))
        })
    }
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Web API key of the identity project
    pub api_key: Option<String>,

    /// Base URL of the account endpoints (sign in, sign up)
    pub identity_toolkit_url: String,

    /// Base URL of the token refresh endpoint
    pub secure_token_url: String,

    /// Where the signed-in user is persisted between runs
    pub session_file: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            identity_toolkit_url: "https://identitytoolkit.googleapis.com".to_string(),
            secure_token_url: "https://securetoken.googleapis.com".to_string(),
            session_file: crate::default_session_path(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `APIPROBE_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for service in Service::ALL {
            if let Some(url) = lookup(&service.env_var()) {
                debug!(service = service.key(), "URL overridden from environment");
                self.services.set(service, url);
            }
        }
        if let Some(key) = lookup(&format!("{}_API_KEY", ENV_PREFIX)) {
            self.identity.api_key = Some(key);
        }
        if let Some(file) = lookup(&format!("{}_SESSION_FILE", ENV_PREFIX)) {
            self.identity.session_file = PathBuf::from(file);
        }
        self
    }
}
