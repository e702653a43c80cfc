// HTTP client for the consumer chain RPC and the provider chain REST API
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    Block, BlockResult, ConsumerValidator, ProviderValidator, RpcEnvelope, StakingValidatorsPage,
    StatusResult, ValidatorsResult,
};
use super::ChainSource;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};

const STAKING_VALIDATORS_PATH: &str = "/cosmos/staking/v1beta1/validators";

pub struct RpcClient {
    consumer_url: String,
    provider_url: Option<String>,
    page_size: u32,
    client: Client,
}

impl RpcClient {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            consumer_url: config.consumer_rpc_url.trim_end_matches('/').to_string(),
            provider_url: config
                .provider_rest_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            page_size: config.consumer_page_size,
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| MonitorError::Decode {
            endpoint: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_block(&self, height: Option<u64>) -> Result<Block> {
        let url = format!("{}/block", self.consumer_url);
        let query: Vec<(&str, String)> = height
            .map(|h| vec![("height", h.to_string())])
            .unwrap_or_default();

        let envelope: RpcEnvelope<BlockResult> = self.get_json(&url, &query).await?;
        Ok(Block::from(envelope.result))
    }
}

#[async_trait]
impl ChainSource for RpcClient {
    async fn chain_id(&self) -> Result<String> {
        let url = format!("{}/status", self.consumer_url);
        let envelope: RpcEnvelope<StatusResult> = self.get_json(&url, &[]).await?;
        Ok(envelope.result.node_info.network)
    }

    async fn provider_validators(&self) -> Result<Vec<ProviderValidator>> {
        let Some(provider_url) = &self.provider_url else {
            return Ok(Vec::new());
        };
        let url = format!("{}{}", provider_url, STAKING_VALIDATORS_PATH);

        let mut validators = Vec::new();
        let mut page_key: Option<String> = None;
        loop {
            let query: Vec<(&str, String)> = page_key
                .take()
                .map(|key| vec![("pagination.key", key)])
                .unwrap_or_default();

            let page: StakingValidatorsPage = self.get_json(&url, &query).await?;
            validators.extend(page.validators.into_iter().map(ProviderValidator::from));

            match page.pagination.next_key {
                Some(key) if !key.is_empty() => page_key = Some(key),
                _ => break,
            }
        }

        debug!("Fetched {} provider validators", validators.len());
        Ok(validators.into_iter().filter(|v| v.is_bonded()).collect())
    }

    async fn consumer_validators(&self) -> Result<Vec<ConsumerValidator>> {
        let url = format!("{}/validators", self.consumer_url);

        let mut validators = Vec::new();
        let mut fetched = 0u64;
        let mut page = 1u32;
        loop {
            let query = [
                ("per_page", self.page_size.to_string()),
                ("page", page.to_string()),
            ];
            let envelope: RpcEnvelope<ValidatorsResult> = self.get_json(&url, &query).await?;
            let result = envelope.result;

            fetched += result.count;
            validators.extend(result.validators.into_iter().map(ConsumerValidator::from));

            // An empty page means the node and its reported total disagree
            if fetched >= result.total || result.count == 0 {
                break;
            }
            page += 1;
        }

        Ok(validators)
    }

    async fn latest_block(&self) -> Result<Block> {
        self.get_block(None).await
    }

    async fn block_at_height(&self, height: u64) -> Result<Block> {
        self.get_block(Some(height)).await
    }
}
