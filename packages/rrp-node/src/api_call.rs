//! API call dispatch.
//!
//! Turns one verified, authorized request into an external API call and
//! encodes the selected response value for the fulfillment transaction.
//! Every failure is reported as one ERROR log plus a failed
//! [`ApiCallResult`]; success carries no logs.

use std::collections::BTreeMap;
use std::time::Duration;

use alloy_primitives::{Bytes, B256};
use rrp_core::config::{ChainConfig, Endpoint, Ois};
use rrp_core::reserved::{self, ReservedParameterError};
use rrp_core::response::{encode_value, extract_value};
use rrp_core::{ApiCallResult, Config, ErrorKind, LogEntry, LogsAndValue, Request};

use crate::adapter::{ApiCallRequest, ApiCaller, ApiCredential};

/// Relay metadata field names, in injection order.
pub const METADATA_AIRNODE_ADDRESS: &str = "_airnode_airnode_address";
pub const METADATA_REQUESTER_ADDRESS: &str = "_airnode_requester_address";
pub const METADATA_SPONSOR_WALLET_ADDRESS: &str = "_airnode_sponsor_wallet_address";
pub const METADATA_ENDPOINT_ID: &str = "_airnode_endpoint_id";
pub const METADATA_SPONSOR_ADDRESS: &str = "_airnode_sponsor_address";
pub const METADATA_REQUEST_ID: &str = "_airnode_request_id";
pub const METADATA_CHAIN_ID: &str = "_airnode_chain_id";
pub const METADATA_CHAIN_TYPE: &str = "_airnode_chain_type";
pub const METADATA_AIRNODE_RRP: &str = "_airnode_airnode_rrp";

/// Per-run inputs of the dispatcher.
#[derive(Clone, Copy)]
pub struct ApiCallOptions<'a> {
    /// Chain the request was made on.
    pub chain: &'a ChainConfig,
    pub caller: &'a dyn ApiCaller,
    /// Bound on the external call. Calls are never retried.
    pub timeout: Duration,
}

/// Calls the API behind `request`'s endpoint and encodes the response.
pub async fn call_api(
    config: &Config,
    request: &Request,
    options: &ApiCallOptions<'_>,
) -> LogsAndValue<ApiCallResult> {
    match dispatch(config, request, options).await {
        Ok(value) => LogsAndValue::silent(ApiCallResult::Success { value }),
        Err((log, result)) => LogsAndValue::new(vec![log], result),
    }
}

type Failure = (LogEntry, ApiCallResult);

async fn dispatch(
    config: &Config,
    request: &Request,
    options: &ApiCallOptions<'_>,
) -> Result<Bytes, Failure> {
    let (endpoint_id, ois, endpoint) = resolve_endpoint(config, request)?;

    let reserved = reserved::extract(endpoint, &request.parameters).map_err(|err| {
        let log = match &err {
            ReservedParameterError::MissingType { .. } => LogEntry::error(format!(
                "No '_type' parameter was found for Endpoint:{}, OIS:{}",
                endpoint.name, ois.title
            )),
            ReservedParameterError::UnsupportedType { .. } => LogEntry::error(format!(
                "Invalid '_type' parameter for Endpoint:{}, OIS:{}",
                endpoint.name, ois.title
            ))
            .with_error(&err),
        };
        (log, ApiCallResult::failure(ErrorKind::ReservedParametersInvalid, err))
    })?;

    let metadata_parameters = if reserved.relay_metadata {
        relay_metadata(config, request, options.chain, endpoint_id)
    } else {
        BTreeMap::new()
    };

    let call = ApiCallRequest {
        ois,
        endpoint_name: &endpoint.name,
        parameters: reserved::strip_reserved(&request.parameters),
        metadata_parameters,
        api_credentials: config
            .credentials_for(&ois.title)
            .map(|c| ApiCredential {
                security_scheme_name: c.security_scheme_name.clone(),
                security_scheme_value: c.security_scheme_value.clone(),
            })
            .collect(),
    };

    let execution = options.caller.execute(&call, options.timeout);
    let outcome = tokio::time::timeout(options.timeout, execution)
        .await
        .map_err(|_elapsed| {
            anyhow::anyhow!("timed out after {}ms", options.timeout.as_millis())
        })
        .and_then(|result| result);
    let payload = outcome.map_err(|err| {
        let log = LogEntry::error(format!("Failed to call Endpoint:{}", endpoint.name))
            .with_error(&err);
        let result = ApiCallResult::Failure {
            kind: ErrorKind::ApiCallFailed,
            error_message: format!("{} with error: {err}", ErrorKind::ApiCallFailed),
        };
        (log, result)
    })?;

    let path = reserved.path.as_deref();
    let Some(value) = extract_value(&payload, path) else {
        let log = LogEntry::error(format!(
            "Unable to find response value from {payload}. Path: {}",
            path.unwrap_or_default()
        ));
        let result = ApiCallResult::Failure {
            kind: ErrorKind::ResponseValueNotFound,
            error_message: ErrorKind::ResponseValueNotFound.to_string(),
        };
        return Err((log, result));
    };

    encode_value(value, reserved.response_type, reserved.times.as_deref()).map_err(|err| {
        let log = LogEntry::error(format!(
            "Unable to encode response value {value} as {}",
            reserved.response_type
        ))
        .with_error(&err);
        (log, ApiCallResult::failure(ErrorKind::ResponseValueEncodingFailed, err))
    })
}

/// Follows endpoint id → trigger → OIS → endpoint.
fn resolve_endpoint<'c>(
    config: &'c Config,
    request: &Request,
) -> Result<(B256, &'c Ois, &'c Endpoint), Failure> {
    let unknown = |log: LogEntry, detail: String| {
        (log, ApiCallResult::failure(ErrorKind::UnknownEndpointId, detail))
    };

    let endpoint_id = request.endpoint_id().ok_or_else(|| {
        unknown(
            LogEntry::error(format!(
                "Unable to determine endpoint ID for Request:{}",
                request.id
            )),
            format!("no endpoint ID for request {}", request.id),
        )
    })?;
    let trigger = config.trigger(&endpoint_id).ok_or_else(|| {
        unknown(
            LogEntry::error(format!("No trigger found for Endpoint ID:{endpoint_id}")),
            endpoint_id.to_string(),
        )
    })?;
    let ois = config.ois(&trigger.ois_title).ok_or_else(|| {
        unknown(
            LogEntry::error(format!(
                "OIS:{} referenced by Endpoint ID:{endpoint_id} was not found",
                trigger.ois_title
            )),
            endpoint_id.to_string(),
        )
    })?;
    let endpoint = ois.endpoint(&trigger.endpoint_name).ok_or_else(|| {
        unknown(
            LogEntry::error(format!(
                "Endpoint:{} was not found in OIS:{}",
                trigger.endpoint_name, ois.title
            )),
            endpoint_id.to_string(),
        )
    })?;
    Ok((endpoint_id, ois, endpoint))
}

/// Oracle identity fields sent alongside the call when relay metadata is on.
#[must_use]
pub fn relay_metadata(
    config: &Config,
    request: &Request,
    chain: &ChainConfig,
    endpoint_id: B256,
) -> BTreeMap<String, String> {
    let airnode_address = request
        .airnode_address()
        .unwrap_or(config.node_settings.airnode_address);
    [
        (METADATA_AIRNODE_ADDRESS, airnode_address.to_string()),
        (METADATA_REQUESTER_ADDRESS, request.requester_address.to_string()),
        (
            METADATA_SPONSOR_WALLET_ADDRESS,
            request.sponsor_wallet_address.to_string(),
        ),
        (METADATA_ENDPOINT_ID, endpoint_id.to_string()),
        (METADATA_SPONSOR_ADDRESS, request.sponsor_address.to_string()),
        (METADATA_REQUEST_ID, request.id.to_string()),
        (METADATA_CHAIN_ID, chain.id.clone()),
        (METADATA_CHAIN_TYPE, chain.chain_type.clone()),
        (METADATA_AIRNODE_RRP, chain.contracts.airnode_rrp.to_string()),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}
