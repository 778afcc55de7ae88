//! JSON-RPC client with ordered endpoint failover.
//!
//! [`RpcFailoverClient::call`] walks the configured endpoint list from the top
//! on every call. Each endpoint gets exactly one attempt, bounded by the
//! per-endpoint timeout; the first error-free `result` wins. There is no health
//! memory between calls and no retry on the same endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    AllEndpointsFailed, CallRequest, Endpoint, EndpointFailure, EndpointFailureCause, Transport,
    TransportRequest,
};

const JSONRPC_VERSION: &str = "2.0";

/// Request id sent with every call; responses are matched by connection.
const REQUEST_ID: u64 = 1;

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// Sends JSON-RPC calls to the first endpoint that answers cleanly.
#[derive(Clone)]
pub struct RpcFailoverClient {
    transport: Arc<dyn Transport>,
    endpoints: Arc<[Endpoint]>,
    endpoint_timeout: Duration,
}

impl RpcFailoverClient {
    /// Creates a client over `endpoints`, tried in the given order.
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoints: Vec<Endpoint>,
        endpoint_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            endpoints: endpoints.into(),
            endpoint_timeout,
        }
    }

    /// The endpoints in priority order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Calls `method` with `params`, failing over across endpoints.
    ///
    /// Returns the first endpoint's `result` that arrives without an `error`
    /// object. Fails with [`AllEndpointsFailed`], carrying every per-endpoint
    /// failure in order, only once the whole list has been exhausted.
    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, AllEndpointsFailed> {
        let body = json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": method,
            "params": params,
            "id": REQUEST_ID,
        });

        let mut failures = Vec::new();
        for endpoint in self.endpoints.iter() {
            match self.attempt(endpoint, &body).await {
                Ok(result) => {
                    debug!(
                        endpoint = %endpoint,
                        method,
                        failed_before = failures.len(),
                        "RPC call succeeded"
                    );
                    return Ok(result);
                }
                Err(cause) => {
                    warn!(endpoint = %endpoint, method, error = %cause, "RPC endpoint failed; trying next");
                    failures.push(EndpointFailure {
                        endpoint: endpoint.clone(),
                        cause,
                    });
                }
            }
        }

        Err(AllEndpointsFailed::new(failures))
    }

    /// Runs `eth_call` for `request`.
    pub async fn eth_call(&self, request: &CallRequest) -> Result<Value, AllEndpointsFailed> {
        self.call("eth_call", &request.to_params()).await
    }

    async fn attempt(&self, endpoint: &Endpoint, body: &Value) -> Result<Value, EndpointFailureCause> {
        let request = TransportRequest::post_json(endpoint.as_str(), body.clone());

        let response = tokio::time::timeout(self.endpoint_timeout, self.transport.send(request))
            .await
            .map_err(|_| EndpointFailureCause::Timeout {
                after: self.endpoint_timeout,
            })?
            .map_err(EndpointFailureCause::Transport)?;

        if !response.is_success() {
            return Err(EndpointFailureCause::HttpStatus {
                status: response.status,
            });
        }

        let parsed: JsonRpcResponse = serde_json::from_slice(&response.body).map_err(|e| {
            EndpointFailureCause::MalformedResponse {
                detail: e.to_string(),
            }
        })?;

        if let Some(error) = parsed.error {
            return Err(EndpointFailureCause::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        parsed
            .result
            .ok_or_else(|| EndpointFailureCause::MalformedResponse {
                detail: "response has neither result nor error".to_string(),
            })
    }
}

impl std::fmt::Debug for RpcFailoverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcFailoverClient")
            .field("endpoints", &self.endpoints)
            .field("endpoint_timeout", &self.endpoint_timeout)
            .finish_non_exhaustive()
    }
}
