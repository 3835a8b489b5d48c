//! Fixtures shared by the unit tests of this crate.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use alloy_primitives::{b256, Address, Bytes, FixedBytes, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use rrp_core::{derive_request_id, Config, Request, RequestKind, RequestMetadata, RequestStatus};
use serde_json::Value;

use crate::adapter::{ApiCallRequest, ApiCaller, ApiCredential};

pub(crate) const ENDPOINT_ID: B256 =
    b256!("f466b8feec41e9e50815e0c9dca4db1ff959637e564bb13fefa99e9f9f90453c");

pub(crate) const CONFIG_JSON: &str = r#"{
    "nodeSettings": { "airnodeAddress": "0xA30CA71Ba54E83127214D3271aEA8F5D6bD4Dace" },
    "chains": [{
        "id": "31337",
        "type": "evm",
        "contracts": { "AirnodeRrp": "0x5FbDB2315678afecb367f032d93F642f64180aa3" },
        "authorizers": []
    }],
    "ois": [{
        "title": "Currency Converter API",
        "apiSpecifications": {
            "servers": [{ "url": "http://localhost:5000" }],
            "components": {
                "securitySchemes": {
                    "My Security Scheme": { "type": "apiKey", "name": "access_key", "in": "query" }
                }
            }
        },
        "endpoints": [{
            "name": "convertToUSD",
            "operation": { "path": "/convert", "method": "get" },
            "parameters": [
                { "name": "from", "operationParameter": { "name": "from", "in": "query" } }
            ]
        }]
    }],
    "apiCredentials": [{
        "oisTitle": "Currency Converter API",
        "securitySchemeName": "My Security Scheme",
        "securitySchemeValue": "supersecret"
    }],
    "triggers": {
        "rrp": [{
            "endpointId": "0xf466b8feec41e9e50815e0c9dca4db1ff959637e564bb13fefa99e9f9f90453c",
            "oisTitle": "Currency Converter API",
            "endpointName": "convertToUSD"
        }]
    }
}"#;

pub(crate) fn config() -> Config {
    Config::from_json_str(CONFIG_JSON, &HashMap::new()).unwrap()
}

/// Pending full request against [`ENDPOINT_ID`] with an honestly derived id.
pub(crate) fn request(count: u64, parameters: &[(&str, &str)]) -> Request {
    let mut request = Request {
        id: B256::ZERO,
        status: RequestStatus::Pending,
        kind: RequestKind::Full {
            airnode_address: config().node_settings.airnode_address,
            endpoint_id: ENDPOINT_ID,
        },
        chain_id: U256::from(31_337),
        request_count: U256::from(count),
        requester_address: Address::repeat_byte(0x01),
        sponsor_address: Address::repeat_byte(0x02),
        sponsor_wallet_address: Address::repeat_byte(0x03),
        fulfill_address: Address::repeat_byte(0x04),
        fulfill_function_id: FixedBytes::new([0x48, 0xa4, 0x15, 0x7c]),
        encoded_parameters: Bytes::from(count.to_be_bytes().to_vec()),
        parameters: parameters
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        metadata: RequestMetadata {
            address: config().chains[0].contracts.airnode_rrp,
            block_number: 10,
            transaction_hash: B256::repeat_byte(0x0f),
        },
        error_message: None,
    };
    request.id = derive_request_id(&request);
    request
}

/// Owned copy of what an [`ApiCaller`] received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub endpoint_name: String,
    pub parameters: BTreeMap<String, String>,
    pub metadata_parameters: BTreeMap<String, String>,
    pub api_credentials: Vec<ApiCredential>,
    pub timeout: Duration,
}

type Responder = Box<dyn Fn(&ApiCallRequest<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// Scripted API that records every call.
pub(crate) struct MockApiCaller {
    responder: Responder,
    delay: Option<Duration>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl MockApiCaller {
    pub(crate) fn new(
        responder: impl Fn(&ApiCallRequest<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn returning(payload: Value) -> Self {
        Self::new(move |_| Ok(payload.clone()))
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ApiCaller for MockApiCaller {
    async fn execute(
        &self,
        request: &ApiCallRequest<'_>,
        timeout: Duration,
    ) -> anyhow::Result<Value> {
        self.calls.lock().push(RecordedCall {
            endpoint_name: request.endpoint_name.to_string(),
            parameters: request.parameters.clone(),
            metadata_parameters: request.metadata_parameters.clone(),
            api_credentials: request.api_credentials.clone(),
            timeout,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(request)
    }
}
