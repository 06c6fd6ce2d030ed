//! End-to-end payment flow tests against the real router.
//!
//! Covers the full lifecycle: hosted-checkout redirect, provider
//! callbacks (signed event body and pull reconciliation), idempotent
//! retries, and the conflict/diagnostic paths.

use axum_test::TestServer;
use payflow_api::{create_router, AppConfig, AppState};
use payflow_core::{
    Amount, Currency, GatewayRegistry, MemoryTransactionStore, Transaction, TransactionId,
    TransactionStatus, TransactionStore,
};
use payflow_wompi::{compute_checksum, WompiConfig, WompiGateway};
use serde_json::json;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTS_SECRET: &str = "events_secret_test";
const BASE_URL: &str = "http://localhost:8080";

fn test_config(api_base_url: Option<String>) -> WompiConfig {
    let config = WompiConfig::new(
        "pub_test_abc123",
        "prv_test_xyz789",
        "integrity_secret_test",
        EVENTS_SECRET,
    );
    match api_base_url {
        Some(url) => config.with_api_base_url(url),
        None => config,
    }
}

async fn seeded_app(
    api_base_url: Option<String>,
) -> (TestServer, Arc<MemoryTransactionStore>, TransactionId) {
    let store = Arc::new(MemoryTransactionStore::new());
    let tx = Transaction::new(Amount::from_minor(50000, Currency::COP).unwrap());
    let id = tx.id;
    store.insert(tx).await;

    let registry = GatewayRegistry::new()
        .with_gateway(Arc::new(WompiGateway::new(test_config(api_base_url))));
    let state = AppState::with_parts(
        registry,
        store.clone(),
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: BASE_URL.to_string(),
            environment: "test".to_string(),
            seed_demo: false,
        },
    );

    let server = TestServer::new(create_router(state)).unwrap();
    (server, store, id)
}

/// Signed server-to-server event body, checksummed the way Wompi does.
/// The signature covers the reference and status, so the event is
/// consumable without an API round-trip.
fn signed_callback_body(reference: &str, status: &str) -> serde_json::Value {
    let data = json!({
        "transaction": {
            "id": "1234-1610641025-49201",
            "reference": reference,
            "status": status,
            "amount_in_cents": 50000,
            "currency": "COP"
        }
    });
    let properties = [
        "transaction.id",
        "transaction.reference",
        "transaction.status",
        "transaction.amount_in_cents",
    ];
    let checksum = compute_checksum(EVENTS_SECRET, &data, &properties, 1610641025).unwrap();
    json!({
        "event": "transaction.updated",
        "data": data,
        "signature": { "checksum": checksum, "properties": properties },
        "timestamp": 1610641025
    })
}

#[tokio::test]
async fn pay_redirects_to_signed_checkout_and_marks_pending() {
    let (server, store, id) = seeded_app(None).await;
    let before = chrono::Utc::now();

    let response = server
        .get(&format!("/transactions/payment/pay/wompi/{}", id))
        .await;
    assert_eq!(response.status_code(), 302);

    let location = response.header("location");
    let url = Url::parse(location.to_str().unwrap()).unwrap();
    let reference = query_param(&url, "reference");
    let signature = query_param(&url, "signature:integrity");
    assert_eq!(reference, id.to_string());
    assert!(!signature.is_empty());

    let row = store.find(id).await.unwrap().unwrap();
    assert_eq!(row.status, TransactionStatus::Pending);
    assert!(row.ordered_at.unwrap() >= before);
}

#[tokio::test]
async fn pay_with_unregistered_provider_is_400_and_mutates_nothing() {
    let (server, store, id) = seeded_app(None).await;

    let response = server
        .get(&format!("/transactions/payment/pay/stripe/{}", id))
        .await;
    assert_eq!(response.status_code(), 400);

    let row = store.find(id).await.unwrap().unwrap();
    assert_eq!(row.status, TransactionStatus::Created);
    assert!(row.ordered_at.is_none());
}

#[tokio::test]
async fn pay_with_malformed_id_is_400() {
    let (server, _store, _id) = seeded_app(None).await;
    let response = server
        .get("/transactions/payment/pay/wompi/not-a-uuid")
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn pay_with_unknown_transaction_is_404() {
    let (server, _store, _id) = seeded_app(None).await;
    let response = server
        .get(&format!(
            "/transactions/payment/pay/wompi/{}",
            TransactionId::new()
        ))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn approved_event_callback_settles_the_transaction() {
    let (server, store, id) = seeded_app(None).await;
    server
        .get(&format!("/transactions/payment/pay/wompi/{}", id))
        .await;

    let response = server
        .post("/transactions/payment/callback/wompi")
        .json(&signed_callback_body(&id.to_string(), "APPROVED"))
        .await;
    assert_eq!(response.status_code(), 200);

    let row = store.find(id).await.unwrap().unwrap();
    assert_eq!(row.status, TransactionStatus::Paid);
}

#[tokio::test]
async fn repeated_approved_callback_is_idempotent() {
    let (server, store, id) = seeded_app(None).await;
    server
        .get(&format!("/transactions/payment/pay/wompi/{}", id))
        .await;

    let body = signed_callback_body(&id.to_string(), "APPROVED");
    let first = server
        .post("/transactions/payment/callback/wompi")
        .json(&body)
        .await;
    let second = server
        .post("/transactions/payment/callback/wompi")
        .json(&body)
        .await;

    assert_eq!(first.status_code(), 200);
    assert_eq!(second.status_code(), 200);
    assert_eq!(
        store.find(id).await.unwrap().unwrap().status,
        TransactionStatus::Paid
    );
}

#[tokio::test]
async fn declined_after_paid_is_conflict_not_overwrite() {
    let (server, store, id) = seeded_app(None).await;
    server
        .get(&format!("/transactions/payment/pay/wompi/{}", id))
        .await;
    server
        .post("/transactions/payment/callback/wompi")
        .json(&signed_callback_body(&id.to_string(), "APPROVED"))
        .await;

    let response = server
        .post("/transactions/payment/callback/wompi")
        .json(&signed_callback_body(&id.to_string(), "DECLINED"))
        .await;
    assert_eq!(response.status_code(), 409);

    // Settled status survives
    assert_eq!(
        store.find(id).await.unwrap().unwrap().status,
        TransactionStatus::Paid
    );
}

#[tokio::test]
async fn declined_event_callback_declines_the_transaction() {
    let (server, store, id) = seeded_app(None).await;
    server
        .get(&format!("/transactions/payment/pay/wompi/{}", id))
        .await;

    let response = server
        .post("/transactions/payment/callback/wompi")
        .json(&signed_callback_body(&id.to_string(), "DECLINED"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        store.find(id).await.unwrap().unwrap().status,
        TransactionStatus::Declined
    );
}

#[tokio::test]
async fn unparseable_reference_is_400_and_store_untouched() {
    let (server, store, id) = seeded_app(None).await;

    let response = server
        .post("/transactions/payment/callback/wompi")
        .json(&signed_callback_body("not-a-uuid", "APPROVED"))
        .await;
    assert_eq!(response.status_code(), 400);

    let row = store.find(id).await.unwrap().unwrap();
    assert_eq!(row.status, TransactionStatus::Created);
}

#[tokio::test]
async fn tampered_event_body_is_400() {
    let (server, _store, id) = seeded_app(None).await;

    let mut body = signed_callback_body(&id.to_string(), "APPROVED");
    body["data"]["transaction"]["amount_in_cents"] = json!(1);

    let response = server
        .post("/transactions/payment/callback/wompi")
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn replayed_event_with_rewritten_reference_cannot_settle_another_transaction() {
    // A signed event whose signature does not cover the reference, with
    // the reference rewritten to point at a different transaction. The
    // outcome must be resolved through the provider API by the signed id,
    // so the victim row is never touched.
    let provider_api = MockServer::start().await;
    let (server, store, victim_id) = seeded_app(Some(provider_api.uri())).await;

    let attacker_tx = Transaction::new(Amount::from_minor(50000, Currency::COP).unwrap());
    let attacker_id = attacker_tx.id;
    store.insert(attacker_tx).await;

    Mock::given(method("GET"))
        .and(path("/v1/transactions/1234-1610641025-49201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "1234-1610641025-49201",
                "reference": attacker_id.to_string(),
                "status": "APPROVED",
                "amount_in_cents": 50000,
                "currency": "COP"
            }
        })))
        .mount(&provider_api)
        .await;

    let data = json!({
        "transaction": {
            "id": "1234-1610641025-49201",
            "reference": victim_id.to_string(),
            "status": "APPROVED",
            "amount_in_cents": 50000,
            "currency": "COP"
        }
    });
    let properties = [
        "transaction.id",
        "transaction.status",
        "transaction.amount_in_cents",
    ];
    let checksum = compute_checksum(EVENTS_SECRET, &data, &properties, 1610641025).unwrap();
    let body = json!({
        "event": "transaction.updated",
        "data": data,
        "signature": { "checksum": checksum, "properties": properties },
        "timestamp": 1610641025
    });

    let response = server
        .post("/transactions/payment/callback/wompi")
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 200);

    // The event settles the transaction the provider actually holds
    assert_eq!(
        store.find(attacker_id).await.unwrap().unwrap().status,
        TransactionStatus::Paid
    );
    // The rewritten reference never reaches the victim row
    assert_eq!(
        store.find(victim_id).await.unwrap().unwrap().status,
        TransactionStatus::Created
    );
}

#[tokio::test]
async fn callback_for_unknown_transaction_is_404() {
    let (server, _store, _id) = seeded_app(None).await;
    let response = server
        .post("/transactions/payment/callback/wompi")
        .json(&signed_callback_body(&TransactionId::new().to_string(), "APPROVED"))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn browser_redirect_back_reconciles_via_pull() {
    let provider_api = MockServer::start().await;
    let (server, store, id) = seeded_app(Some(provider_api.uri())).await;

    Mock::given(method("GET"))
        .and(path("/v1/transactions/1234-1610641025-49201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "1234-1610641025-49201",
                "reference": id.to_string(),
                "status": "APPROVED",
                "amount_in_cents": 50000,
                "currency": "COP"
            }
        })))
        .mount(&provider_api)
        .await;

    server
        .get(&format!("/transactions/payment/pay/wompi/{}", id))
        .await;

    let response = server
        .get("/transactions/payment/callback/wompi")
        .add_query_param("id", "1234-1610641025-49201")
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        store.find(id).await.unwrap().unwrap().status,
        TransactionStatus::Paid
    );
}

#[tokio::test]
async fn health_endpoint_reports_service() {
    let (server, _store, _id) = seeded_app(None).await;
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("payflow"));
}

fn query_param(url: &Url, name: &str) -> String {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}
