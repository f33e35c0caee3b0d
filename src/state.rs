use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, InMemoryTokenService, PrivacyService, SeaOrmAuthService, SeaOrmPrivacyService,
    TokenService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub privacy_service: Arc<dyn PrivacyService>,

    pub tokens: Arc<dyn TokenService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens: Arc<dyn TokenService> = Arc::new(InMemoryTokenService::new(
            Duration::from_secs(config.security.csrf_token_ttl_seconds),
        ));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let privacy_service = Arc::new(SeaOrmPrivacyService::new(store.clone(), tokens.clone()))
            as Arc<dyn PrivacyService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth_service,
            privacy_service,
            tokens,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
