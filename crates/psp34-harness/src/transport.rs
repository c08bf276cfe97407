//! Transport layer for RPC communication

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::rpc::code;
use crate::HarnessError;

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get JSON response
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, HarnessError>;
}

/// Helper to deserialize response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, HarnessError> {
    serde_json::from_value(value).map_err(|e| HarnessError::MalformedResponse(e.to_string()))
}

/// One scripted reply
type Scripted = Result<Value, (i64, String, Option<Value>)>;

/// Recorded request
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    /// RPC method
    pub method: String,
    /// Parameters as sent
    pub params: Vec<Value>,
}

/// Scripted transport for unit tests
///
/// Replies queued with [`MockTransport::push_response`] are consumed in
/// order per method; afterwards the method's default reply is used.
/// Every request is recorded.
#[derive(Clone)]
pub struct MockTransport {
    queued: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    defaults: Arc<Mutex<HashMap<String, Value>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert(
            crate::rpc::method::CHAIN_INFO.to_string(),
            serde_json::json!({ "chain": "mock", "tokenDecimals": 18, "bestBlock": 0 }),
        );
        defaults.insert(
            crate::rpc::method::ACCOUNT_NEXT_INDEX.to_string(),
            Value::from(0u64),
        );

        Self {
            queued: Arc::new(Mutex::new(HashMap::new())),
            defaults: Arc::new(Mutex::new(defaults)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful reply for `method`
    pub fn push_response(&self, method: &str, response: Value) {
        self.queued
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queue an RPC error reply for `method`
    pub fn push_error(&self, method: &str, code: i64, message: &str, data: Option<Value>) {
        self.queued
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(Err((code, message.to_string(), data)));
    }

    /// Set the reply used once the queue for `method` is empty
    pub fn set_default(&self, method: &str, response: Value) {
        self.defaults.lock().insert(method.to_string(), response);
    }

    /// All requests seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen for `method`
    pub fn count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, HarnessError> {
        self.requests.lock().push(RecordedRequest {
            method: method.to_string(),
            params,
        });

        let scripted = self
            .queued
            .lock()
            .get_mut(method)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(Ok(value)) => return Ok(value),
            Some(Err((code, message, data))) => {
                return Err(HarnessError::Rpc {
                    code,
                    message,
                    data,
                })
            }
            None => {}
        }

        if let Some(value) = self.defaults.lock().get(method).cloned() {
            return Ok(value);
        }

        Err(HarnessError::Rpc {
            code: code::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
            data: None,
        })
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, HarnessError> {
        let id = self.next_id();
        tracing::debug!(id, method, url = %self.url, "rpc request");

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HarnessError::Transport(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| HarnessError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(HarnessError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        response.result.ok_or_else(|| HarnessError::Rpc {
            code: code::INTERNAL,
            message: "No result in response".to_string(),
            data: None,
        })
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::method;

    #[tokio::test]
    async fn test_mock_transport_default_responses() {
        let transport = MockTransport::new();

        let info = transport
            .request_json(method::CHAIN_INFO, vec![])
            .await
            .unwrap();
        assert_eq!(info["chain"], "mock");

        let nonce = transport
            .request_json(method::ACCOUNT_NEXT_INDEX, vec![Value::from("0x00")])
            .await
            .unwrap();
        assert_eq!(nonce, Value::from(0u64));
    }

    #[tokio::test]
    async fn test_mock_transport_queue_then_default() {
        let transport = MockTransport::new();
        transport.push_response(method::ACCOUNT_NEXT_INDEX, Value::from(7u64));

        let first = transport
            .request_json(method::ACCOUNT_NEXT_INDEX, vec![])
            .await
            .unwrap();
        let second = transport
            .request_json(method::ACCOUNT_NEXT_INDEX, vec![])
            .await
            .unwrap();
        assert_eq!(first, Value::from(7u64));
        assert_eq!(second, Value::from(0u64));
        assert_eq!(transport.count(method::ACCOUNT_NEXT_INDEX), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_scripted_error() {
        let transport = MockTransport::new();
        transport.push_error(method::CALL, code::CONTRACT_NOT_FOUND, "no contract", None);

        match transport.request_json(method::CALL, vec![]).await {
            Err(HarnessError::Rpc { code: c, .. }) => assert_eq!(c, code::CONTRACT_NOT_FOUND),
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_method() {
        let transport = MockTransport::new();
        let result = transport.request_json("unknown_method", vec![]).await;
        assert!(matches!(
            result,
            Err(HarnessError::Rpc { code: code::METHOD_NOT_FOUND, .. })
        ));
    }
}
