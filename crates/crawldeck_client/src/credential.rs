use std::sync::{Arc, RwLock};

use deck_logging::deck_warn;

/// Bearer credential shared by every request.
///
/// Set on login, cleared on logout or on the first 401 from the service.
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    token: Arc<RwLock<Option<String>>>,
}

impl Credential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let credential = Self::new();
        credential.set(token);
        credential
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }

    pub fn clear(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// The session predicate: is a credential present.
    pub fn is_present(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn bearer(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn invalidate(&self) {
        if self.is_present() {
            deck_warn!("Service answered 401; clearing credential");
        }
        self.clear();
    }
}
