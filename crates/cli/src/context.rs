//! Shared state for one CLI invocation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use apiprobe_common::{
    IdentityToolkit, ProbeConfig, Service, ServiceClient, SessionProvider, Snapshot, Subscription,
};
use tracing::debug;

use crate::output::OutputFormat;

/// Configuration, identity backend and session provider wired together.
///
/// The session provider follows the identity backend's change stream for as
/// long as the context lives.
pub struct Context {
    pub config: ProbeConfig,
    pub identity: Arc<IdentityToolkit>,
    pub session: SessionProvider,
    pub format: OutputFormat,
    _subscription: Subscription,
}

impl Context {
    /// Load configuration, restore the persisted sign-in and wait until the
    /// first identity event has been processed.
    pub async fn init(config_path: Option<&Path>, format: OutputFormat) -> Result<Self> {
        let path: PathBuf = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(apiprobe_common::default_config_path);
        let config = ProbeConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .with_env_overrides();
        debug!(path = %path.display(), "Configuration loaded");

        let identity = Arc::new(IdentityToolkit::new(config.identity.clone())?);
        let session = SessionProvider::new();
        let subscription = session.subscribe(identity.auth_state_changes(), identity.clone());
        session.ready().await;

        Ok(Self {
            config,
            identity,
            session,
            format,
            _subscription: subscription,
        })
    }

    /// Client for `service`; fails when its base URL is not configured
    pub fn client(&self, service: Service) -> Result<ServiceClient> {
        let base_url = self.config.services.require(service)?;
        Ok(ServiceClient::new(base_url))
    }

    /// Current session, refusing when nobody is signed in
    pub fn signed_in(&self) -> Result<Snapshot> {
        let snapshot = self.session.snapshot();
        snapshot.require_identity()?;
        Ok(snapshot)
    }
}
