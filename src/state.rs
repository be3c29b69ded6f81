use std::sync::Arc;

use crate::config::AppConfig;
use crate::users::{password::CredentialHasher, UserDirectory, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let hasher = CredentialHasher::new(config.hashing.params()?);

        // No database backend is wired in; users live in process memory.
        let users = Arc::new(UserDirectory::new(hasher)) as Arc<dyn UserStore>;
        tracing::warn!("using in-memory user directory; accounts are lost on restart");

        Ok(Self::from_parts(config, users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>) -> Self {
        Self { config, users }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::HashingConfig;
        use crate::users::password::cheap_hasher;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            hashing: HashingConfig::default(),
        });
        let users = Arc::new(UserDirectory::new(cheap_hasher())) as Arc<dyn UserStore>;
        Self::from_parts(config, users)
    }
}
