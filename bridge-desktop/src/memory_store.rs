//! Process-local secret storage
//!
//! Used where no OS keychain is reachable (headless hosts, tests). Secrets
//! live only as long as the process.

use async_trait::async_trait;
use bridge_traits::{error::Result, storage::SecureStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemorySecureStore {
    secrets: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        self.secrets
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.secrets.read().await.get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.secrets.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let store = MemorySecureStore::new();
        store.set_secret("googleDriveAccessToken", b"abc").await.unwrap();

        assert_eq!(
            store.get_secret("googleDriveAccessToken").await.unwrap(),
            Some(b"abc".to_vec())
        );

        store.delete_secret("googleDriveAccessToken").await.unwrap();
        assert!(!store.has_secret("googleDriveAccessToken").await.unwrap());
        store.delete_secret("googleDriveAccessToken").await.unwrap();
    }
}
