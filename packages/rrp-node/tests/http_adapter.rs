//! `HttpApiCaller` against a local API.

mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use rrp_core::Config;
use rrp_node::{ApiCallRequest, ApiCaller, ApiCredential, HttpApiCaller};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(5);

fn credentials(config: &Config) -> Vec<ApiCredential> {
    config
        .credentials_for("Price API")
        .map(|c| ApiCredential {
            security_scheme_name: c.security_scheme_name.clone(),
            security_scheme_value: c.security_scheme_value.clone(),
        })
        .collect()
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn call<'a>(
    config: &'a Config,
    endpoint_name: &'a str,
    parameters: &[(&str, &str)],
) -> ApiCallRequest<'a> {
    ApiCallRequest {
        ois: &config.ois[0],
        endpoint_name,
        parameters: params(parameters),
        metadata_parameters: BTreeMap::new(),
        api_credentials: credentials(config),
    }
}

#[tokio::test]
async fn get_places_parameters_and_credentials() {
    let config = common::config(&common::spawn_api().await);
    let request = call(&config, "echo", &[("from", "ETH"), ("trace", "abc"), ("session", "s1")]);

    let payload = HttpApiCaller::default().execute(&request, TIMEOUT).await.unwrap();

    assert_eq!(
        payload,
        json!({
            "query": { "from": "ETH", "access_key": common::API_KEY },
            "headers": {
                "x-trace": "abc",
                "cookie": "session=s1",
                "authorization": format!("Bearer {}", common::BEARER_TOKEN),
            },
        })
    );
}

#[tokio::test]
async fn fixed_parameters_and_credentials_reach_the_api() {
    let config = common::config(&common::spawn_api().await);
    let request = call(&config, "price", &[("from", "ETH")]);

    let payload = HttpApiCaller::default().execute(&request, TIMEOUT).await.unwrap();

    assert_eq!(payload, json!({ "price": 1000 }));
}

#[tokio::test]
async fn post_sends_path_and_json_body() {
    let config = common::config(&common::spawn_api().await);
    let mut request = call(&config, "quote", &[("symbol", "BTC")]);
    request.api_credentials.clear();
    request.metadata_parameters = params(&[("_airnode_chain_id", "31337")]);

    let payload = HttpApiCaller::default().execute(&request, TIMEOUT).await.unwrap();

    assert_eq!(
        payload,
        json!({
            "symbol": "BTC",
            "query": {},
            "body": { "amount": "1", "_airnode_chain_id": "31337" },
        })
    );
}

#[tokio::test]
async fn path_parameters_stay_inside_their_segment() {
    let config = common::config(&common::spawn_api().await);
    for symbol in ["../fail", "a?b", "x/y#z"] {
        let mut request = call(&config, "quote", &[("symbol", symbol)]);
        request.api_credentials.clear();

        let payload = HttpApiCaller::default().execute(&request, TIMEOUT).await.unwrap();

        assert_eq!(payload["symbol"], json!(symbol));
        assert_eq!(payload["body"], json!({ "amount": "1" }));
    }
}

#[tokio::test]
async fn missing_credentials_are_rejected_by_the_api() {
    let config = common::config(&common::spawn_api().await);
    let mut request = call(&config, "price", &[("from", "ETH")]);
    request.api_credentials.clear();

    let err = HttpApiCaller::default().execute(&request, TIMEOUT).await.unwrap_err();

    assert!(err.to_string().contains("401"), "{err}");
}

#[tokio::test]
async fn server_error_status_fails() {
    let config = common::config(&common::spawn_api().await);
    let request = call(&config, "broken", &[]);

    let err = HttpApiCaller::default().execute(&request, TIMEOUT).await.unwrap_err();

    assert!(err.to_string().contains("500"), "{err}");
}

#[tokio::test]
async fn unreachable_server_fails() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = common::config(&format!("http://{addr}"));
    let request = call(&config, "price", &[("from", "ETH")]);

    let err = HttpApiCaller::default().execute(&request, TIMEOUT).await.unwrap_err();

    assert!(err.to_string().starts_with("request to http://"), "{err}");
}
