use std::sync::Arc;

use tracing::warn;

use crate::{
    common::error::ServerError,
    custom_questions::store::{MemoryTopicStore, PgTopicStore, TopicStore},
};

pub struct AppState {
    store: Arc<dyn TopicStore>,
}

impl AppState {
    pub async fn from_connection_string(connection_string: &str) -> Result<Arc<Self>, ServerError> {
        let store = PgTopicStore::connect(connection_string).await?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Falls back to the in-memory store when no database is configured.
    pub async fn from_optional_connection_string(
        connection_string: Option<&str>,
    ) -> Result<Arc<Self>, ServerError> {
        match connection_string {
            Some(url) => Self::from_connection_string(url).await,
            None => {
                warn!("DATABASE_URL is not set, topics will only live in memory");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn in_memory() -> Arc<Self> {
        Self::with_store(Arc::new(MemoryTopicStore::new()))
    }

    pub fn with_store(store: Arc<dyn TopicStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    pub fn get_store(&self) -> &dyn TopicStore {
        self.store.as_ref()
    }
}
