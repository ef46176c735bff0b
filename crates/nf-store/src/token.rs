use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::KeyValue;

/// Fixed slot holding the bearer token.
pub const TOKEN_KEY: &str = "nf_token";

/// Wraps the persisted bearer-token slot.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValue>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValue>) -> Self {
        Self { backend }
    }

    /// Read the persisted token. A read failure is treated as "no token".
    pub fn get(&self) -> Option<String> {
        match self.backend.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read persisted token: {:#}", e);
                None
            }
        }
    }

    pub fn set(&self, token: &str) -> Result<()> {
        self.backend.set(TOKEN_KEY, token)
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn test_token_slot() {
        let backend = Arc::new(MemoryStore::new());
        let tokens = TokenStore::new(backend.clone());
        assert_eq!(tokens.get(), None);

        tokens.set("T1").unwrap();
        assert_eq!(tokens.get().as_deref(), Some("T1"));
        assert_eq!(backend.get(TOKEN_KEY).unwrap().as_deref(), Some("T1"));

        tokens.clear().unwrap();
        assert_eq!(backend.get(TOKEN_KEY).unwrap(), None);
    }
}
