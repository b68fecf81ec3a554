//! Tests against a running storefront.
//!
//! Start the server with a migrated database and `AUTH_HOOK_SECRET` set,
//! then run with `--ignored`. `STOREFRONT_URL` defaults to
//! `http://localhost:3000`.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use cartsync_integration_tests::{owner, view_lines};

fn base_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> Client {
    Client::builder().cookie_store(true).build().unwrap()
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_server_readiness() {
    let response = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_server_cart_survives_sign_in() {
    let base = base_url();
    let client = client();
    let secret = std::env::var("AUTH_HOOK_SECRET").unwrap();

    let view: Value = client
        .post(format!("{base}/api/cart/add"))
        .json(&json!({ "item_id": 1, "quantity": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view_lines(&view), [(1, 2)]);

    let response = client
        .post(format!("{base}/api/session/sign-in"))
        .header("x-auth-hook-token", secret)
        .json(&json!({ "owner_id": owner() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session: Value = response.json().await.unwrap();
    assert_eq!(view_lines(&session["cart"]), [(1, 2)]);

    let view: Value = client
        .post(format!("{base}/api/cart/clear"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(view_lines(&view).is_empty());
}
