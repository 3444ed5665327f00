use std::sync::Arc;

use relay::Relay;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) relay: Arc<Relay>,
}

impl AppState {
    pub(crate) fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}
