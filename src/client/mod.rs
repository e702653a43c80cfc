// Chain data access
pub mod rpc_client;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use rpc_client::RpcClient;
pub use types::{Block, ConsumerValidator, ProviderValidator};

/// Source of roster and block data for the monitor.
///
/// Every call either returns typed data or a `MonitorError`; retries are the
/// caller's business.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn chain_id(&self) -> Result<String>;

    /// Bonded validators of the provider chain. Empty when no provider
    /// endpoint is configured.
    async fn provider_validators(&self) -> Result<Vec<ProviderValidator>>;

    async fn consumer_validators(&self) -> Result<Vec<ConsumerValidator>>;

    async fn latest_block(&self) -> Result<Block>;

    async fn block_at_height(&self, height: u64) -> Result<Block>;
}
