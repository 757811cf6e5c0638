use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Small JSON key/value blobs kept next to the marker graph.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn put(&self, key: &str, value: &Value) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Value>>;
}
