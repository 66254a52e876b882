use super::store::KvStore;
use crate::backend::{ApiKeys, ApiService, AvailableFeatures};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Stored keys shorter than this are treated as unset
const MIN_KEY_LEN: usize = 11;

/// Locally remembered API keys, one store entry per service (`api_key_{service}`)
pub struct ApiKeyStore {
    store: Arc<dyn KvStore>,
}

impl ApiKeyStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn key(service: ApiService) -> String {
        format!("api_key_{}", service)
    }

    pub fn save(&self, keys: &ApiKeys) -> Result<()> {
        for (service, value) in keys.iter() {
            self.store.set(&Self::key(service), value)?;
        }
        Ok(())
    }

    pub fn load(&self) -> ApiKeys {
        let mut keys = ApiKeys::new();
        for service in ApiService::ALL {
            match self.store.get(&Self::key(service)) {
                Ok(Some(value)) => keys.insert(service, &value),
                Ok(None) => {}
                Err(e) => warn!("Could not read {} key: {:#}", service, e),
            }
        }
        keys
    }

    pub fn has_key(&self, service: ApiService) -> bool {
        self.load()
            .get(service)
            .is_some_and(|value| value.len() >= MIN_KEY_LEN)
    }

    /// Feature availability implied by the locally stored keys
    pub fn local_features(&self) -> AvailableFeatures {
        AvailableFeatures {
            ai_chat: self.has_key(ApiService::Gemini),
            weather: self.has_key(ApiService::Openweather),
            web_search: self.has_key(ApiService::Tavily),
        }
    }
}
