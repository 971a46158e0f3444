use crate::application::relay::ChatRelay;

/// Shared server state. `relay` is absent when no upstream credential was
/// available at startup; chat routes then answer with a configuration
/// error instead of attempting upstream calls.
pub struct AppState {
    relay: Option<ChatRelay>,
}

impl AppState {
    pub fn new(relay: Option<ChatRelay>) -> Self {
        Self { relay }
    }

    pub fn relay(&self) -> Option<&ChatRelay> {
        self.relay.as_ref()
    }
}
