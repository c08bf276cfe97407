//! Shared node connection

use psp34_primitives::{AccountId, Nonce};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::rpc::{
    method, CallRequest, ChainInfo, DryRunResult, InstantiateResult, SignedCall,
    SignedInstantiate, SubmitResult,
};
use crate::transport::{deserialize_response, Transport};
use crate::HarnessResult;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Connection to a node gateway
///
/// Cloning is cheap; clones share the transport and request counter.
#[derive(Clone)]
pub struct Connection {
    transport: Arc<dyn Transport>,
    endpoint: Arc<str>,
    chain: Option<ChainInfo>,
    requests: Arc<AtomicU64>,
}

impl Connection {
    /// Connect over HTTP and fetch chain info
    #[cfg(feature = "http")]
    pub async fn connect(url: &str) -> HarnessResult<Self> {
        let mut connection = Self::from_parts(Arc::new(HttpTransport::new(url)), url);
        let chain = connection.fetch_chain_info().await?;
        tracing::info!(endpoint = url, chain = %chain.chain, best_block = chain.best_block, "connected");
        connection.chain = Some(chain);
        Ok(connection)
    }

    /// Create a connection over a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self::from_parts(Arc::new(transport), "in-process")
    }

    /// Create a connection over a shared transport
    pub fn from_shared(transport: Arc<dyn Transport>, endpoint: &str) -> Self {
        Self::from_parts(transport, endpoint)
    }

    fn from_parts(transport: Arc<dyn Transport>, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: Arc::from(endpoint),
            chain: None,
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Endpoint label
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Requests issued through this connection and its clones
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> HarnessResult<T> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, endpoint = %self.endpoint, "rpc");
        let value = self.transport.request_json(method, params).await?;
        deserialize_response(value)
    }

    // ==================== Chain Info ====================

    /// Chain metadata, cached after `connect`
    pub async fn chain_info(&self) -> HarnessResult<ChainInfo> {
        if let Some(chain) = &self.chain {
            return Ok(chain.clone());
        }
        self.fetch_chain_info().await
    }

    async fn fetch_chain_info(&self) -> HarnessResult<ChainInfo> {
        self.request(method::CHAIN_INFO, vec![]).await
    }

    /// Next nonce for `account`
    pub async fn next_nonce(&self, account: &AccountId) -> HarnessResult<Nonce> {
        self.request(method::ACCOUNT_NEXT_INDEX, vec![Value::String(account.to_hex())])
            .await
    }

    // ==================== Contracts ====================

    /// Dry-run a message
    pub async fn dry_run(&self, call: &CallRequest) -> HarnessResult<DryRunResult> {
        self.request(method::CALL, vec![serde_json::to_value(call)?])
            .await
    }

    /// Submit a signed message and wait for finalization
    pub async fn submit_and_watch(&self, call: &SignedCall) -> HarnessResult<SubmitResult> {
        self.request(method::SUBMIT_AND_WATCH, vec![serde_json::to_value(call)?])
            .await
    }

    /// Instantiate a contract
    pub async fn instantiate(&self, request: &SignedInstantiate) -> HarnessResult<InstantiateResult> {
        self.request(method::INSTANTIATE, vec![serde_json::to_value(request)?])
            .await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use crate::HarnessError;

    #[tokio::test]
    async fn test_chain_info_and_nonce() {
        let mock = MockTransport::new();
        mock.push_response(method::ACCOUNT_NEXT_INDEX, Value::from(4u64));
        let connection = Connection::with_transport(mock.clone());

        let info = connection.chain_info().await.unwrap();
        assert_eq!(info.token_decimals, 18);

        let nonce = connection.next_nonce(&AccountId::ZERO).await.unwrap();
        assert_eq!(nonce, 4);
        assert_eq!(connection.request_count(), 2);
        assert_eq!(mock.requests()[1].params, vec![Value::String(AccountId::ZERO.to_hex())]);
    }

    #[tokio::test]
    async fn test_clones_share_counter() {
        let connection = Connection::with_transport(MockTransport::new());
        let clone = connection.clone();
        clone.chain_info().await.unwrap();
        assert_eq!(connection.request_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock = MockTransport::new();
        mock.push_response(method::ACCOUNT_NEXT_INDEX, Value::from("seven"));
        let connection = Connection::with_transport(mock);

        assert!(matches!(
            connection.next_nonce(&AccountId::ZERO).await,
            Err(HarnessError::MalformedResponse(_))
        ));
    }
}
