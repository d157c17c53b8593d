//! Table-API adapter wire behavior, exercised against a stub HTTP server.

#![allow(clippy::unwrap_used)]

mod support;

use std::path::PathBuf;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use waman_cart::{
    BackendConfig, BackendError, CartBackend, LineDraft, RestBackend, WishlistBackend,
};
use waman_core::{LineId, ProductId, UserId, Variant};

fn backend_for(server: &MockServer) -> RestBackend {
    RestBackend::new(&BackendConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        api_key: SecretString::from("test-api-key"),
        data_dir: PathBuf::from("unused"),
    })
}

#[tokio::test]
async fn test_fetch_lines_decodes_rows_with_product_join() {
    support::init_tracing();
    let server = MockServer::start().await;
    let owner = UserId::new(Uuid::new_v4());
    let line_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_items"))
        .and(query_param("user_id", format!("eq.{owner}")))
        .and(query_param("select", "*,products(name,price,images)"))
        .and(header("apikey", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": line_id,
                "product_id": product_id,
                "quantity": 2,
                "size": "M",
                "color": "indigo",
                "created_at": "2025-11-03T09:15:00Z",
                "products": {
                    "name": "Chikankari kurta",
                    "price": "1899.00",
                    "images": ["kurta-front.webp", "kurta-back.webp"]
                }
            }
        ])))
        .mount(&server)
        .await;

    let lines = backend_for(&server).fetch_lines(owner).await.unwrap();

    assert_eq!(lines.len(), 1);
    let line = lines.first().unwrap();
    assert_eq!(line.id, LineId::new(line_id));
    assert_eq!(line.product, ProductId::new(product_id));
    assert_eq!(line.quantity, 2);
    assert_eq!(line.name, "Chikankari kurta");
    assert_eq!(line.image.as_deref(), Some("kurta-front.webp"));
    assert_eq!(line.variant.size.as_deref(), Some("M"));
    assert!(line.added_at.is_some());
}

#[tokio::test]
async fn test_insert_line_requests_representation_and_returns_row() {
    let server = MockServer::start().await;
    let owner = UserId::new(Uuid::new_v4());
    let product = ProductId::new(Uuid::new_v4());
    let assigned = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/cart_items"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {
                "id": assigned,
                "product_id": product,
                "quantity": 3,
                "size": null,
                "color": null,
                "products": { "name": "Handloom stole", "price": "899.00", "images": [] }
            }
        ])))
        .mount(&server)
        .await;

    let draft = LineDraft {
        product,
        quantity: 3,
        variant: Variant::none(),
    };
    let row = backend_for(&server).insert_line(owner, &draft).await.unwrap();

    assert_eq!(row.id, LineId::new(assigned));
    assert_eq!(row.quantity, 3);
    assert_eq!(row.name, "Handloom stole");
}

#[tokio::test]
async fn test_insert_line_with_empty_representation_is_missing_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/cart_items"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let draft = LineDraft {
        product: ProductId::new(Uuid::new_v4()),
        quantity: 1,
        variant: Variant::none(),
    };
    let result = backend_for(&server)
        .insert_line(UserId::new(Uuid::new_v4()), &draft)
        .await;

    assert!(matches!(result, Err(BackendError::MissingRow)));
}

#[tokio::test]
async fn test_non_success_status_is_a_typed_error() {
    support::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cart_items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .fetch_lines(UserId::new(Uuid::new_v4()))
        .await;

    match result {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("database unavailable"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_quantity_patches_by_id() {
    let server = MockServer::start().await;
    let id = LineId::new(Uuid::new_v4());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/cart_items"))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    backend_for(&server).update_quantity(id, 4).await.unwrap();
}

#[tokio::test]
async fn test_clear_lines_deletes_by_owner() {
    let server = MockServer::start().await;
    let owner = UserId::new(Uuid::new_v4());

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/cart_items"))
        .and(query_param("user_id", format!("eq.{owner}")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    backend_for(&server).clear_lines(owner).await.unwrap();
}

#[tokio::test]
async fn test_missing_profile_row_yields_empty_wishlist() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let ids = backend_for(&server)
        .fetch_wishlist(UserId::new(Uuid::new_v4()))
        .await
        .unwrap();

    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_fetch_products_filters_to_requested_active_ids() {
    let server = MockServer::start().await;
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", format!("in.({first},{second})")))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": first,
                "name": "Mul cotton saree",
                "price": "2499.00",
                "images": ["saree.webp"],
                "stock_quantity": 7
            }
        ])))
        .mount(&server)
        .await;

    let snapshots = backend_for(&server)
        .fetch_products(&[ProductId::new(first), ProductId::new(second)])
        .await
        .unwrap();

    assert_eq!(snapshots.len(), 1);
    let snapshot = snapshots.first().unwrap();
    assert_eq!(snapshot.id, ProductId::new(first));
    assert!(snapshot.in_stock);
    assert_eq!(snapshot.image.as_deref(), Some("saree.webp"));
}

#[tokio::test]
async fn test_fetch_products_with_no_ids_makes_no_request() {
    // No mock mounted: a request would 404 and surface as an error.
    let server = MockServer::start().await;

    let snapshots = backend_for(&server).fetch_products(&[]).await.unwrap();
    assert!(snapshots.is_empty());
}
