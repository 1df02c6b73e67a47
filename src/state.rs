use std::sync::Arc;
use std::time::Instant;

use crate::accounts::repo::AccountStore;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AccountStore>,
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub async fn init() -> Self {
        let config = Arc::new(AppConfig::from_env());
        let store = Arc::new(AccountStore::load(&config.accounts_file).await);
        Self::from_parts(store, config)
    }

    pub fn from_parts(store: Arc<AccountStore>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            config,
            started_at: Instant::now(),
        }
    }
}
