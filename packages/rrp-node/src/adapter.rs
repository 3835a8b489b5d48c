//! External API collaborator.
//!
//! [`ApiCaller`] turns an OIS endpoint plus concrete parameters into a JSON
//! response. [`HttpApiCaller`] is the `reqwest`-backed implementation used
//! in production: it places each parameter where the OIS says (path, query,
//! header, cookie or JSON body) and applies the configured security schemes.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::Method;
use rrp_core::config::{
    Endpoint, HttpMethod, Ois, OperationParameter, ParameterLocation, SecuritySchemeType,
};
use serde_json::Value;

/// Credential for one security scheme of an OIS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredential {
    pub security_scheme_name: String,
    pub security_scheme_value: String,
}

/// Everything needed to call one OIS endpoint.
#[derive(Debug, Clone)]
pub struct ApiCallRequest<'a> {
    pub ois: &'a Ois,
    pub endpoint_name: &'a str,
    /// Request parameters with reserved parameters removed.
    pub parameters: BTreeMap<String, String>,
    /// `_airnode_*` fields, empty unless relay metadata is enabled.
    pub metadata_parameters: BTreeMap<String, String>,
    pub api_credentials: Vec<ApiCredential>,
}

/// Executes external API calls.
#[async_trait]
pub trait ApiCaller: Send + Sync {
    /// Performs the call and returns the decoded JSON payload. `timeout`
    /// bounds the whole call.
    async fn execute(
        &self,
        request: &ApiCallRequest<'_>,
        timeout: Duration,
    ) -> anyhow::Result<Value>;
}

// ---------------------------------------------------------------------------
// HttpApiCaller
// ---------------------------------------------------------------------------

/// HTTP implementation of [`ApiCaller`].
#[derive(Debug, Clone, Default)]
pub struct HttpApiCaller {
    client: reqwest::Client,
}

impl HttpApiCaller {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Parameter placement collected before the request is built.
#[derive(Debug, Default)]
struct HttpParts {
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
    body: serde_json::Map<String, Value>,
}

impl HttpParts {
    fn place(
        &mut self,
        method: HttpMethod,
        parameter: &OperationParameter,
        value: &str,
    ) -> anyhow::Result<()> {
        match parameter.location {
            ParameterLocation::Path => {
                // Empty and dot segments would collapse the path, even when encoded.
                anyhow::ensure!(
                    !matches!(value, "" | "." | ".."),
                    "path parameter {} has invalid value {value:?}",
                    parameter.name
                );
                self.path = self.path.replace(
                    &format!("{{{}}}", parameter.name),
                    &urlencoding::encode(value),
                );
            }
            ParameterLocation::Query => self.place_data(method, &parameter.name, value),
            ParameterLocation::Header => {
                self.headers.push((parameter.name.clone(), value.to_string()));
            }
            ParameterLocation::Cookie => {
                self.cookies.push(format!("{}={}", parameter.name, value));
            }
        }
        Ok(())
    }

    /// Query string for GET, JSON body for POST.
    fn place_data(&mut self, method: HttpMethod, name: &str, value: &str) {
        match method {
            HttpMethod::Get => self.query.push((name.to_string(), value.to_string())),
            HttpMethod::Post => {
                self.body
                    .insert(name.to_string(), Value::String(value.to_string()));
            }
        }
    }
}

fn build_parts(
    request: &ApiCallRequest<'_>,
    endpoint: &Endpoint,
) -> anyhow::Result<HttpParts> {
    let method = endpoint.operation.method;
    let mut parts = HttpParts {
        path: endpoint.operation.path.clone(),
        ..HttpParts::default()
    };

    for fixed in &endpoint.fixed_operation_parameters {
        parts.place(method, &fixed.operation_parameter, &fixed.value)?;
    }
    for parameter in &endpoint.parameters {
        let value = request
            .parameters
            .get(&parameter.name)
            .or(parameter.default.as_ref());
        if let Some(value) = value {
            parts.place(method, &parameter.operation_parameter, value)?;
        }
    }
    for (name, value) in &request.metadata_parameters {
        parts.place_data(method, name, value);
    }

    let schemes = &request.ois.api_specifications.components.security_schemes;
    for credential in &request.api_credentials {
        let scheme = schemes
            .get(&credential.security_scheme_name)
            .with_context(|| {
                format!(
                    "security scheme {} is not declared by OIS {}",
                    credential.security_scheme_name, request.ois.title
                )
            })?;
        let value = &credential.security_scheme_value;
        match scheme.scheme_type {
            SecuritySchemeType::ApiKey => {
                let name = scheme.name.clone().with_context(|| {
                    format!("apiKey scheme {} has no name", credential.security_scheme_name)
                })?;
                let location = scheme.location.unwrap_or(ParameterLocation::Header);
                parts.place(method, &OperationParameter { name, location }, value)?;
            }
            SecuritySchemeType::Http => {
                let header = match scheme.scheme.as_deref() {
                    Some(s) if s.eq_ignore_ascii_case("basic") => format!(
                        "Basic {}",
                        base64::engine::general_purpose::STANDARD.encode(value)
                    ),
                    _ => format!("Bearer {value}"),
                };
                parts.headers.push((AUTHORIZATION.as_str().to_string(), header));
            }
        }
    }
    Ok(parts)
}

#[async_trait]
impl ApiCaller for HttpApiCaller {
    async fn execute(
        &self,
        request: &ApiCallRequest<'_>,
        timeout: Duration,
    ) -> anyhow::Result<Value> {
        let ois = request.ois;
        let endpoint = ois.endpoint(request.endpoint_name).with_context(|| {
            format!(
                "endpoint {} is not declared by OIS {}",
                request.endpoint_name, ois.title
            )
        })?;
        let server = ois
            .api_specifications
            .servers
            .first()
            .with_context(|| format!("OIS {} declares no server", ois.title))?;

        let parts = build_parts(request, endpoint)?;
        let url = format!("{}{}", server.url.trim_end_matches('/'), parts.path);
        let method = match endpoint.operation.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        tracing::debug!(
            ois = %ois.title,
            endpoint = request.endpoint_name,
            method = %method,
            "calling external API"
        );

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .timeout(timeout)
            .query(&parts.query);
        for (name, value) in &parts.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !parts.cookies.is_empty() {
            builder = builder.header(COOKIE, parts.cookies.join("; "));
        }
        if method == Method::POST {
            builder = builder.json(&parts.body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}
