//! Reserved parameters.
//!
//! Parameters whose names start with an underscore shape the API call
//! instead of being forwarded to the API. An endpoint may declare a `fixed`
//! value (always wins) or a `default` (used when the request omits it).

use std::collections::BTreeMap;

use crate::config::Endpoint;
use crate::response::ResponseType;

pub const TYPE: &str = "_type";
pub const PATH: &str = "_path";
pub const TIMES: &str = "_times";
pub const RELAY_METADATA: &str = "_relay_metadata";

/// Names never forwarded to the external API.
pub const RESERVED_PARAMETER_NAMES: [&str; 4] = [TYPE, PATH, TIMES, RELAY_METADATA];

/// Only relay-metadata version understood by this node.
pub const RELAY_METADATA_V1: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservedParameterError {
    #[error("_type is missing for endpoint {endpoint}")]
    MissingType { endpoint: String },
    #[error("_type {value} is not supported for endpoint {endpoint}")]
    UnsupportedType { endpoint: String, value: String },
}

/// Reserved parameter values resolved for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedParameters {
    pub response_type: ResponseType,
    pub path: Option<String>,
    pub times: Option<String>,
    pub relay_metadata: bool,
}

/// Value of reserved parameter `name`: the endpoint's `fixed` value, else the
/// request's value, else the endpoint's `default`.
#[must_use]
pub fn resolve(
    endpoint: &Endpoint,
    parameters: &BTreeMap<String, String>,
    name: &str,
) -> Option<String> {
    let declared = endpoint.reserved_parameter(name);
    if let Some(fixed) = declared.and_then(|p| p.fixed.clone()) {
        return Some(fixed);
    }
    parameters
        .get(name)
        .cloned()
        .or_else(|| declared.and_then(|p| p.default.clone()))
}

/// `true` when the relay-metadata toggle names version `v1` (any case).
#[must_use]
pub fn relay_metadata_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(RELAY_METADATA_V1))
}

/// Resolves every reserved parameter for a request against its endpoint.
///
/// # Errors
///
/// Fails when `_type` resolves to nothing or to an unsupported type.
pub fn extract(
    endpoint: &Endpoint,
    parameters: &BTreeMap<String, String>,
) -> Result<ReservedParameters, ReservedParameterError> {
    let raw_type = resolve(endpoint, parameters, TYPE)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ReservedParameterError::MissingType {
            endpoint: endpoint.name.clone(),
        })?;
    let response_type =
        raw_type
            .parse()
            .map_err(|_| ReservedParameterError::UnsupportedType {
                endpoint: endpoint.name.clone(),
                value: raw_type.clone(),
            })?;
    let relay_metadata = relay_metadata_enabled(
        resolve(endpoint, parameters, RELAY_METADATA).as_deref(),
    );

    Ok(ReservedParameters {
        response_type,
        path: resolve(endpoint, parameters, PATH),
        times: resolve(endpoint, parameters, TIMES),
        relay_metadata,
    })
}

/// Request parameters with all reserved names removed.
#[must_use]
pub fn strip_reserved(parameters: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    parameters
        .iter()
        .filter(|(name, _)| !RESERVED_PARAMETER_NAMES.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
