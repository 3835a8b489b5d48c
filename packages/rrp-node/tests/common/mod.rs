//! Local HTTP API and config fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rrp_core::Config;
use serde_json::{json, Value};

pub const API_KEY: &str = "supersecret";
pub const BEARER_TOKEN: &str = "token-123";

pub const CONFIG_JSON: &str = r#"{
    "nodeSettings": { "airnodeAddress": "0xA30CA71Ba54E83127214D3271aEA8F5D6bD4Dace" },
    "chains": [{
        "id": "31337",
        "type": "evm",
        "contracts": { "AirnodeRrp": "0x5FbDB2315678afecb367f032d93F642f64180aa3" },
        "authorizers": ["0x0000000000000000000000000000000000000a11"]
    }],
    "ois": [{
        "title": "Price API",
        "apiSpecifications": {
            "servers": [{ "url": "${API_URL}" }],
            "components": {
                "securitySchemes": {
                    "apiKey": { "type": "apiKey", "name": "access_key", "in": "query" },
                    "bearer": { "type": "http", "scheme": "bearer" }
                }
            }
        },
        "endpoints": [
            {
                "name": "price",
                "operation": { "path": "/prices", "method": "get" },
                "fixedOperationParameters": [
                    { "operationParameter": { "name": "to", "in": "query" }, "value": "USD" }
                ],
                "parameters": [
                    { "name": "from", "operationParameter": { "name": "from", "in": "query" } }
                ],
                "reservedParameters": [
                    { "name": "_type", "default": "int256" },
                    { "name": "_path", "default": "price" }
                ]
            },
            {
                "name": "echo",
                "operation": { "path": "/echo", "method": "get" },
                "parameters": [
                    { "name": "from", "operationParameter": { "name": "from", "in": "query" } },
                    { "name": "trace", "operationParameter": { "name": "X-Trace", "in": "header" } },
                    { "name": "session", "operationParameter": { "name": "session", "in": "cookie" } }
                ]
            },
            {
                "name": "quote",
                "operation": { "path": "/quotes/{symbol}", "method": "post" },
                "parameters": [
                    { "name": "symbol", "operationParameter": { "name": "symbol", "in": "path" } },
                    { "name": "amount", "operationParameter": { "name": "amount", "in": "query" }, "default": "1" }
                ]
            },
            {
                "name": "broken",
                "operation": { "path": "/fail", "method": "get" }
            }
        ]
    }],
    "apiCredentials": [
        { "oisTitle": "Price API", "securitySchemeName": "apiKey", "securitySchemeValue": "${API_KEY}" },
        { "oisTitle": "Price API", "securitySchemeName": "bearer", "securitySchemeValue": "${BEARER_TOKEN}" }
    ],
    "triggers": {
        "rrp": [
            {
                "endpointId": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "oisTitle": "Price API",
                "endpointName": "price"
            },
            {
                "endpointId": "0x2222222222222222222222222222222222222222222222222222222222222222",
                "oisTitle": "Price API",
                "endpointName": "broken"
            }
        ]
    }
}"#;

/// Config pointing at the API served from `base_url`.
pub fn config(base_url: &str) -> Config {
    let secrets = HashMap::from([
        ("API_URL".to_string(), base_url.to_string()),
        ("API_KEY".to_string(), API_KEY.to_string()),
        ("BEARER_TOKEN".to_string(), BEARER_TOKEN.to_string()),
    ]);
    Config::from_json_str(CONFIG_JSON, &secrets).unwrap()
}

/// Starts the test API on an ephemeral port and returns its base URL.
pub async fn spawn_api() -> String {
    let app = Router::new()
        .route("/prices", get(prices))
        .route("/echo", get(echo))
        .route("/quotes/{symbol}", post(quote))
        .route("/fail", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn authorized(query: &BTreeMap<String, String>, headers: &HeaderMap) -> bool {
    let bearer = format!("Bearer {BEARER_TOKEN}");
    query.get("access_key").map(String::as_str) == Some(API_KEY)
        && headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some(bearer.as_str())
}

async fn prices(
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&query, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if query.get("to").map(String::as_str) != Some("USD") {
        return Err(StatusCode::BAD_REQUEST);
    }
    let price = match query.get("from").map(String::as_str) {
        Some("ETH") => json!(1000),
        Some("BTC") => json!(30000.5),
        Some("DOGE") => json!("0.07"),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    let mut body = json!({ "price": price });
    if let Some(rrp) = query.get("_airnode_airnode_rrp") {
        body["relayedRrp"] = json!(rrp);
    }
    Ok(Json(body))
}

fn header_value(headers: &HeaderMap, name: &str) -> Value {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map_or(Value::Null, |v| json!(v))
}

async fn echo(Query(query): Query<BTreeMap<String, String>>, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "query": query,
        "headers": {
            "x-trace": header_value(&headers, "x-trace"),
            "cookie": header_value(&headers, "cookie"),
            "authorization": header_value(&headers, "authorization"),
        },
    }))
}

async fn quote(
    Path(symbol): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    Json(json!({ "symbol": symbol, "query": query, "body": body }))
}
