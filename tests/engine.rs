//! Revenue engine cycle against local `wiremock` networks.

mod common;

use affiliate_engine::config::AppConfig;
use affiliate_engine::engine::RevenueEngine;
use affiliate_engine::types::FailureReason;
use serde_json::json;
use wiremock::MockServer;

use common::{mount_json, mount_untouched};

fn config(toml: &str) -> AppConfig {
    AppConfig::parse(toml).unwrap()
}

#[tokio::test]
async fn collects_then_optimises_successful_networks() {
    let server = MockServer::start().await;
    mount_json(&server, "/a/stats", 200, json!({"clicks": 10})).await;
    mount_json(&server, "/b/stats", 404, json!({})).await;

    let engine = RevenueEngine::from_config(&config("[cashflow]\nenabled = false")).unwrap();
    let a = format!("{}/a/stats", server.uri());
    let b = format!("{}/b/stats", server.uri());

    let collection = engine.collect_affiliate_data(&[a.clone(), b.clone()]).await.unwrap();
    assert_eq!(collection.data.len(), 1);
    assert_eq!(collection.data.get(&a), Some(&json!({"clicks": 10})));
    assert_eq!(collection.failures[0].reason, FailureReason::HttpStatus(404));

    let plan = engine.optimize_strategy(&collection.data).unwrap();
    assert_eq!(plan.campaigns.len(), 1);
    assert_eq!(plan.campaigns[0].campaign_id, a);
    assert_eq!(plan.campaigns[0].metrics.clicks, 10);
}

#[tokio::test]
async fn network_paths_come_from_config() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/stats",
        200,
        json!({"clicks": 120, "conversions": 6, "revenue": 90.0, "cost": 45.0}),
    )
    .await;

    let engine = RevenueEngine::from_config(&config(
        r#"
        [collector]
        endpoint_path = "/api/stats"

        [cashflow]
        enabled = false
        "#,
    ))
    .unwrap();

    let report = engine.run_cycle(&[server.uri()]).await.unwrap();
    assert_eq!(report.networks_responded, 1);
    assert_eq!(report.profitable_campaigns, 1);
    assert_eq!(report.gateways_reported, None);
}

#[tokio::test]
async fn gateway_transport_failure_fails_the_cycle() {
    let server = MockServer::start().await;
    mount_json(&server, "/network", 200, json!({"clicks": 1})).await;
    mount_untouched(&server, "/cashflow").await;

    // First gateway points at a closed port, so the second is never polled.
    let dead_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let engine = RevenueEngine::from_config(&config(&format!(
        r#"
        [cashflow]
        gateways = ["http://127.0.0.1:{dead_port}", "{uri}"]
        "#,
        uri = server.uri(),
    )))
    .unwrap();

    let err = engine
        .run_cycle(&[format!("{}/network", server.uri())])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Cashflow tracking aborted"));
}
