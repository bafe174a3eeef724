use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Store;
use crate::media::MediaHost;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub media: Arc<dyn MediaHost>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        media: Arc<dyn MediaHost>,
        tokens: TokenService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            media,
            tokens: Arc::new(tokens),
        }
    }
}
