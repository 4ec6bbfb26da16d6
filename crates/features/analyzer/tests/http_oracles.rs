//! Oracle clients against a local mock of the remote APIs.

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use ksafe_analyzer::{BreachOracle, OracleError, PwnedPasswords, SafeBrowsing, UrlSafetyOracle};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

// SHA-1("password") = 5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8
const PASSWORD_SUFFIX: &str = "1E4C9B93F3F0682250B6CF8331B7EE68FD8";
const API_KEY: &str = "test-key";

async fn range(Path(prefix): Path<String>, headers: HeaderMap) -> Result<String, StatusCode> {
    if headers.get("add-padding").is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }
    match prefix.as_str() {
        "5BAA6" => Ok(format!("0018A45C4D1DEF81644B54AB7F969B88D65:4\r\n{PASSWORD_SUFFIX}:3730471\r\n")),
        // Every other bucket only holds padding rows.
        _ => Ok("00000000000000000000000000000000000:0\r\n".to_owned()),
    }
}

async fn find(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if query.get("key").map(String::as_str) != Some(API_KEY) {
        return Err(StatusCode::FORBIDDEN);
    }
    let url = body["threatInfo"]["threatEntries"][0]["url"].as_str().unwrap_or_default();
    if url.contains("malware") {
        Ok(Json(json!({ "matches": [{ "threatType": "MALWARE", "threat": { "url": url } }] })))
    } else {
        Ok(Json(json!({})))
    }
}

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route("/range/{prefix}", get(range))
        .route("/threatMatches/find", post(find))
        .route("/broken/range/{prefix}", get(|| async { "not-a-range-line" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn timeout() -> Duration {
    Duration::from_secs(5)
}

#[tokio::test]
async fn pwned_range_lookup() {
    let addr = serve().await;
    let oracle = PwnedPasswords::new(format!("http://{addr}/"), timeout()).unwrap();

    assert!(oracle.is_known_breached("password").await.unwrap());
    assert!(!oracle.is_known_breached("Zk7#mQ2!vR9@").await.unwrap());
}

#[tokio::test]
async fn pwned_malformed_body_is_a_protocol_error() {
    let addr = serve().await;
    let oracle = PwnedPasswords::new(format!("http://{addr}/broken"), timeout()).unwrap();

    let result = oracle.is_known_breached("password").await;
    assert!(matches!(result, Err(OracleError::Protocol { .. })));
}

#[tokio::test]
async fn pwned_unreachable_service_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let oracle = PwnedPasswords::new(format!("http://{addr}"), timeout()).unwrap();
    let result = oracle.is_known_breached("password").await;
    assert!(matches!(result, Err(OracleError::Network { .. })));
}

#[tokio::test]
async fn safe_browsing_lookup() {
    let addr = serve().await;
    let endpoint = format!("http://{addr}/threatMatches/find");
    let oracle = SafeBrowsing::new(endpoint.as_str(), API_KEY, "keepsafe-tests", timeout()).unwrap();

    assert!(oracle.is_unsafe("http://malware.testing.example/").await.unwrap());
    assert!(!oracle.is_unsafe("https://bank.example").await.unwrap());

    let wrong_key = SafeBrowsing::new(endpoint, "nope", "keepsafe-tests", timeout()).unwrap();
    assert!(matches!(wrong_key.is_unsafe("https://bank.example").await, Err(OracleError::Network { .. })));
    assert!(!format!("{wrong_key:?}").contains("nope"));
}
