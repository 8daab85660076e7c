use std::sync::Arc;

use crate::config::Config;
use crate::data::DataHandle;
use crate::runner::SessionRegistry;
use crate::store::KeyValueStore;
use axum::extract::FromRef;

pub type SharedStore = Arc<dyn KeyValueStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub data: Arc<DataHandle>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: SharedStore, data: DataHandle, config: Config) -> Self {
        Self {
            store,
            data: Arc::new(data),
            sessions: Arc::new(SessionRegistry::new(config.session_ttl_secs)),
            config,
        }
    }
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<DataHandle> {
    fn from_ref(state: &AppState) -> Self {
        state.data.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
