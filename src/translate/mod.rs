pub mod batch;
pub mod claude;
pub mod client;
pub mod orchestrator;

use crate::error::Result;
use async_trait::async_trait;

/// Narrow seam to the translation provider: a batch of source strings in, an
/// equally long batch of translated strings out, in the same order.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_batch(&self, texts: &[&str], target_language: &str) -> Result<Vec<String>>;
    fn name(&self) -> &'static str;
}
