//! Shared application state for all routes. The store handle is injected, never global.

use crate::store::{DeletePolicy, SharedStore};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub delete_policy: DeletePolicy,
}

impl AppState {
    pub fn new(store: SharedStore, delete_policy: DeletePolicy) -> Self {
        AppState { store, delete_policy }
    }
}
