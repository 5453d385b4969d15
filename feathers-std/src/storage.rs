//! In-memory token storage.

use feathers_core::AuthenticationStorage;
use parking_lot::RwLock;

/// Keeps the access token in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    token: RwLock<Option<String>>,
}

impl MemoryStorage {
    /// An empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// A storage seeded with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl AuthenticationStorage for MemoryStorage {
    fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let storage = MemoryStorage::with_token("a");
        assert_eq!(storage.access_token().as_deref(), Some("a"));
        storage.set_access_token(Some("b".into()));
        assert_eq!(storage.access_token().as_deref(), Some("b"));
        storage.set_access_token(None);
        assert_eq!(storage.access_token(), None);
    }
}
