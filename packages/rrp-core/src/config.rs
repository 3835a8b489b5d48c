//! Read-only node configuration.
//!
//! Mirrors the node's JSON config file: per-chain contract addresses and
//! authorizers, OIS descriptors for the external APIs, credentials for their
//! security schemes, and the RRP triggers that map an on-chain endpoint id to
//! an OIS endpoint. Secrets are referenced as `${NAME}` and interpolated at
//! load time, so no process-wide state is consulted afterwards.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use alloy_primitives::{Address, B256};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Errors raised while loading a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("secret {name} is referenced by the config but was not provided")]
    MissingSecret { name: String },
    #[error("invalid secret pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub node_settings: NodeSettings,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    #[serde(default)]
    pub ois: Vec<Ois>,
    #[serde(default)]
    pub api_credentials: Vec<ApiCredentials>,
    #[serde(default)]
    pub triggers: Triggers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSettings {
    /// Address this node fulfills requests as.
    pub airnode_address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Chain id as a decimal string.
    pub id: String,
    /// Chain family, e.g. `"evm"`.
    #[serde(rename = "type")]
    pub chain_type: String,
    pub contracts: ChainContracts,
    /// Authorizer contracts. Empty means every endpoint on this chain is public.
    #[serde(default)]
    pub authorizers: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainContracts {
    #[serde(rename = "AirnodeRrp")]
    pub airnode_rrp: Address,
}

// ---------------------------------------------------------------------------
// OIS descriptors
// ---------------------------------------------------------------------------

/// Oracle Integration Specification: how on-chain endpoints map to an API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ois {
    pub title: String,
    pub api_specifications: ApiSpecifications,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl Ois {
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpecifications {
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecuritySchemeType {
    ApiKey,
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: SecuritySchemeType,
    /// Header, query or cookie name for `apiKey` schemes.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "in", default)]
    pub location: Option<ParameterLocation>,
    /// `bearer` or `basic` for `http` schemes.
    #[serde(default)]
    pub scheme: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub path: String,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,
    pub operation: Operation,
    #[serde(default)]
    pub fixed_operation_parameters: Vec<FixedOperationParameter>,
    #[serde(default)]
    pub parameters: Vec<EndpointParameter>,
    #[serde(default)]
    pub reserved_parameters: Vec<ReservedParameter>,
}

impl Endpoint {
    #[must_use]
    pub fn reserved_parameter(&self, name: &str) -> Option<&ReservedParameter> {
        self.reserved_parameters.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedOperationParameter {
    pub operation_parameter: OperationParameter,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointParameter {
    /// Name used by requesters on chain.
    pub name: String,
    pub operation_parameter: OperationParameter,
    #[serde(default)]
    pub default: Option<String>,
}

/// Declaration of a reserved parameter on an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedParameter {
    pub name: String,
    /// Used when the request does not supply the parameter.
    #[serde(default)]
    pub default: Option<String>,
    /// Overrides whatever the request supplies.
    #[serde(default)]
    pub fixed: Option<String>,
}

// ---------------------------------------------------------------------------
// Credentials and triggers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredentials {
    pub ois_title: String,
    pub security_scheme_name: String,
    pub security_scheme_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default)]
    pub rrp: Vec<RrpTrigger>,
}

/// Maps an on-chain endpoint id to an OIS endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RrpTrigger {
    pub endpoint_id: B256,
    pub ois_title: String,
    pub endpoint_name: String,
}

// ---------------------------------------------------------------------------
// Loading and lookups
// ---------------------------------------------------------------------------

impl Config {
    /// Parses a JSON config after replacing `${NAME}` placeholders from `secrets`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSecret` for an unknown placeholder and
    /// `ConfigError::Parse` if the interpolated document is not a valid config.
    pub fn from_json_str(
        raw: &str,
        secrets: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let interpolated = interpolate_secrets(raw, secrets)?;
        Ok(serde_json::from_str(&interpolated)?)
    }

    /// Reads and parses a config file. See [`Config::from_json_str`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`Config::from_json_str`].
    pub fn from_path(
        path: impl AsRef<Path>,
        secrets: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw, secrets)
    }

    #[must_use]
    pub fn chain(&self, id: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn trigger(&self, endpoint_id: &B256) -> Option<&RrpTrigger> {
        self.triggers.rrp.iter().find(|t| t.endpoint_id == *endpoint_id)
    }

    #[must_use]
    pub fn ois(&self, title: &str) -> Option<&Ois> {
        self.ois.iter().find(|o| o.title == title)
    }

    /// All credentials declared for the OIS with the given title.
    pub fn credentials_for<'a>(
        &'a self,
        ois_title: &'a str,
    ) -> impl Iterator<Item = &'a ApiCredentials> + 'a {
        self.api_credentials
            .iter()
            .filter(move |c| c.ois_title == ois_title)
    }
}

/// Replaces every `${NAME}` in `raw` with `secrets[NAME]`.
///
/// Placeholders sit inside JSON string literals, so each value is inserted
/// JSON-escaped and always stays within its literal.
///
/// # Errors
///
/// Returns `ConfigError::MissingSecret` naming the first unknown placeholder.
pub fn interpolate_secrets(
    raw: &str,
    secrets: &HashMap<String, String>,
) -> Result<String, ConfigError> {
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")?;
    if let Some(missing) = pattern
        .captures_iter(raw)
        .map(|caps| caps[1].to_string())
        .find(|name| !secrets.contains_key(name))
    {
        return Err(ConfigError::MissingSecret { name: missing });
    }
    let replaced = pattern.replace_all(raw, |caps: &Captures<'_>| {
        secrets
            .get(&caps[1])
            .map(|value| escape_json(value))
            .unwrap_or_default()
    });
    Ok(replaced.into_owned())
}

/// `value` as it appears between the quotes of a JSON string literal.
fn escape_json(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
