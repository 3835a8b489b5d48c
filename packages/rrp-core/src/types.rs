use std::collections::BTreeMap;
use std::fmt;

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};

/// 32-byte request identifier as emitted by the RRP contract.
pub type RequestId = B256;

/// Authorization status per request id.
///
/// Keys are a subset of the pending request ids handed to the resolver. A
/// missing key means the status is unknown, not that the request is denied.
pub type AuthorizationByRequestId = BTreeMap<RequestId, bool>;

/// Processing status of a request within one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Awaiting verification, authorization and the API call.
    Pending,
    /// Already fulfilled on chain.
    Fulfilled,
    /// Dropped by this node (invalid id, unauthorized, ...).
    Ignored,
    /// Cannot be processed yet (e.g. its template failed to load).
    Blocked,
    /// Processing failed; the chain should receive a failure.
    Errored,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Fulfilled => "Fulfilled",
            Self::Ignored => "Ignored",
            Self::Blocked => "Blocked",
            Self::Errored => "Errored",
        };
        f.write_str(s)
    }
}

/// Endpoint and airnode resolved from a template by the upstream collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEndpoint {
    pub airnode_address: Address,
    pub endpoint_id: B256,
}

/// Request variant. The variant decides which fields take part in request id
/// derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestKind {
    /// Request made through an on-chain template.
    Template {
        template_id: B256,
        /// `None` while the template has not been fetched.
        template: Option<TemplateEndpoint>,
    },
    /// Request that names the airnode and endpoint explicitly.
    Full {
        airnode_address: Address,
        endpoint_id: B256,
    },
}

/// Where the request event was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Address of the RRP contract that emitted the request event.
    pub address: Address,
    pub block_number: u64,
    pub transaction_hash: B256,
}

/// One on-chain call for off-chain data.
///
/// Requests are immutable within the core: each stage returns a new
/// `Request` when the status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub status: RequestStatus,
    pub kind: RequestKind,
    pub chain_id: U256,
    /// Requester's request counter at the time of the request.
    pub request_count: U256,
    pub requester_address: Address,
    pub sponsor_address: Address,
    pub sponsor_wallet_address: Address,
    pub fulfill_address: Address,
    pub fulfill_function_id: FixedBytes<4>,
    pub encoded_parameters: Bytes,
    /// Decoded form of `encoded_parameters`, merged with template parameters.
    pub parameters: BTreeMap<String, String>,
    pub metadata: RequestMetadata,
    pub error_message: Option<String>,
}

impl Request {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Endpoint id the request targets, if it is known.
    #[must_use]
    pub fn endpoint_id(&self) -> Option<B256> {
        match &self.kind {
            RequestKind::Template { template, .. } => template.as_ref().map(|t| t.endpoint_id),
            RequestKind::Full { endpoint_id, .. } => Some(*endpoint_id),
        }
    }

    /// Airnode address the request targets, if it is known.
    #[must_use]
    pub fn airnode_address(&self) -> Option<Address> {
        match &self.kind {
            RequestKind::Template { template, .. } => {
                template.as_ref().map(|t| t.airnode_address)
            }
            RequestKind::Full {
                airnode_address, ..
            } => Some(*airnode_address),
        }
    }

    /// Returns a copy of this request moved to `status` with the given error.
    #[must_use]
    pub fn with_status(&self, status: RequestStatus, error_message: Option<String>) -> Self {
        Self {
            status,
            error_message,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Error kinds and API call results
// ---------------------------------------------------------------------------

/// Classification of per-request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    RequestIdInvalid,
    ReservedParametersInvalid,
    ApiCallFailed,
    ResponseValueNotFound,
    ResponseValueEncodingFailed,
    UnknownEndpointId,
    AuthorizationFetchFailed,
    ChainIdMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RequestIdInvalid => "RequestIdInvalid",
            Self::ReservedParametersInvalid => "ReservedParametersInvalid",
            Self::ApiCallFailed => "ApiCallFailed",
            Self::ResponseValueNotFound => "ResponseValueNotFound",
            Self::ResponseValueEncodingFailed => "ResponseValueEncodingFailed",
            Self::UnknownEndpointId => "UnknownEndpointId",
            Self::AuthorizationFetchFailed => "AuthorizationFetchFailed",
            Self::ChainIdMismatch => "ChainIdMismatch",
        };
        f.write_str(s)
    }
}

/// Outcome of dispatching one request to its external API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiCallResult {
    /// ABI-encoded response value, ready for the fulfillment transaction.
    Success { value: Bytes },
    Failure {
        kind: ErrorKind,
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

impl ApiCallResult {
    /// Builds a failure whose message is `"<kind>: <detail>"`.
    #[must_use]
    pub fn failure(kind: ErrorKind, detail: impl fmt::Display) -> Self {
        Self::Failure {
            kind,
            error_message: format!("{kind}: {detail}"),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> Request {
        Request {
            id: B256::repeat_byte(0x11),
            status: RequestStatus::Pending,
            kind: RequestKind::Full {
                airnode_address: Address::repeat_byte(0xaa),
                endpoint_id: B256::repeat_byte(0xee),
            },
            chain_id: U256::from(31_337),
            request_count: U256::from(1),
            requester_address: Address::repeat_byte(0x01),
            sponsor_address: Address::repeat_byte(0x02),
            sponsor_wallet_address: Address::repeat_byte(0x03),
            fulfill_address: Address::repeat_byte(0x04),
            fulfill_function_id: FixedBytes::repeat_byte(0x05),
            encoded_parameters: Bytes::new(),
            parameters: BTreeMap::new(),
            metadata: RequestMetadata {
                address: Address::repeat_byte(0x06),
                block_number: 10,
                transaction_hash: B256::repeat_byte(0x07),
            },
            error_message: None,
        }
    }

    #[test]
    fn full_request_exposes_endpoint_and_airnode() {
        let request = full_request();
        assert_eq!(request.endpoint_id(), Some(B256::repeat_byte(0xee)));
        assert_eq!(request.airnode_address(), Some(Address::repeat_byte(0xaa)));
    }

    #[test]
    fn unresolved_template_has_no_endpoint() {
        let request = Request {
            kind: RequestKind::Template {
                template_id: B256::repeat_byte(0x99),
                template: None,
            },
            ..full_request()
        };
        assert_eq!(request.endpoint_id(), None);
        assert_eq!(request.airnode_address(), None);
    }

    #[test]
    fn with_status_leaves_original_untouched() {
        let request = full_request();
        let ignored = request.with_status(RequestStatus::Ignored, Some("nope".to_string()));
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.error_message.is_none());
        assert_eq!(ignored.status, RequestStatus::Ignored);
        assert_eq!(ignored.error_message.as_deref(), Some("nope"));
        assert_eq!(ignored.id, request.id);
    }

    #[test]
    fn failure_message_is_prefixed_with_kind() {
        let result = ApiCallResult::failure(ErrorKind::UnknownEndpointId, "0x01");
        assert_eq!(
            result,
            ApiCallResult::Failure {
                kind: ErrorKind::UnknownEndpointId,
                error_message: "UnknownEndpointId: 0x01".to_string(),
            }
        );
        assert!(!result.is_success());
    }
}
