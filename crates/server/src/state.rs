use std::sync::Arc;

use service::storage::SharedUserStore;
use service::users::UserRepository;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        let store: Arc<dyn UserRepository> = SharedUserStore::new();
        Self::new(store)
    }
}
