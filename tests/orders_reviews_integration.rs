mod common;

use common::{spawn_app, Session, TestApp};
use reqwest::Response;
use serde_json::{json, Value};

async fn post_order(app: &TestApp, session: &Session, body: Value) -> Response {
    app.client
        .post(app.url("/orders"))
        .bearer_auth(&session.access_token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.")
}

async fn post_review(app: &TestApp, session: &Session, product_id: i64, body: Value) -> Response {
    app.client
        .post(app.url(&format!("/products/{}/reviews", product_id)))
        .bearer_auth(&session.access_token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.")
}

fn mug_order() -> Value {
    json!({
        "items": [
            { "productId": 1, "title": "Mug", "price": 12.5, "quantity": 2 },
            { "productId": 2, "title": "Tea", "price": 5.0, "quantity": 1 }
        ]
    })
}

// --- Orders ---

#[tokio::test]
async fn orders_require_authentication() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/orders")).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());

    let response = app
        .client
        .post(app.url("/orders"))
        .json(&mug_order())
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn create_order_computes_total_and_snapshots_items() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;

    let response = post_order(&app, &ann, mug_order()).await;

    assert_eq!(201, response.status().as_u16());
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["total"].as_f64(), Some(30.0));
    assert_eq!(order["userId"], ann.user["id"]);
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["productId"], 1);
    assert_eq!(items[0]["titleSnapshot"], "Mug");
    assert_eq!(items[0]["priceSnapshot"].as_f64(), Some(12.5));
    assert_eq!(items[0]["quantity"], 2);
}

#[tokio::test]
async fn empty_cart_is_forbidden() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;

    let response = post_order(&app, &ann, json!({ "items": [] })).await;

    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cart is empty");
}

#[tokio::test]
async fn invalid_quantity_is_rejected() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;

    let response = post_order(
        &app,
        &ann,
        json!({ "items": [{ "productId": 1, "title": "Mug", "price": 1.0, "quantity": 0 }] }),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
    assert_eq!(app.store.order_count(), 0);
}

#[tokio::test]
async fn order_is_readable_only_by_its_buyer() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;
    let bob = app.signed_up("bob@example.com").await;
    let admin = app.admin("admin@example.com").await;

    let order: Value = post_order(&app, &ann, mug_order()).await.json().await.unwrap();
    let path = format!("/orders/{}", order["id"].as_str().unwrap());

    let own = app.get_authed(&path, &ann.access_token).await;
    assert_eq!(200, own.status().as_u16());

    let other = app.get_authed(&path, &bob.access_token).await;
    assert_eq!(403, other.status().as_u16());

    let by_admin = app.get_authed(&path, &admin.access_token).await;
    assert_eq!(403, by_admin.status().as_u16());

    let missing = app
        .get_authed(&format!("/orders/{}", uuid::Uuid::new_v4()), &ann.access_token)
        .await;
    assert_eq!(404, missing.status().as_u16());
}

#[tokio::test]
async fn order_history_lists_own_orders() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;
    let bob = app.signed_up("bob@example.com").await;

    post_order(&app, &ann, mug_order()).await;
    post_order(&app, &ann, mug_order()).await;
    post_order(&app, &bob, mug_order()).await;

    let listed: Value = app.get_authed("/orders", &ann.access_token).await.json().await.unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|o| o["userId"] == ann.user["id"]));
}

// --- Reviews ---

#[tokio::test]
async fn reviews_are_public_to_read_but_not_to_write() {
    let app = spawn_app().await;

    let listed = app.client.get(app.url("/products/7/reviews")).send().await.unwrap();
    assert_eq!(200, listed.status().as_u16());
    let body: Value = listed.json().await.unwrap();
    assert_eq!(body, json!([]));

    let anonymous = app
        .client
        .post(app.url("/products/7/reviews"))
        .json(&json!({ "rating": 5, "message": "Great" }))
        .send()
        .await
        .unwrap();
    assert_eq!(401, anonymous.status().as_u16());
}

#[tokio::test]
async fn review_lifecycle_with_author_listing() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;

    let created = post_review(&app, &ann, 7, json!({ "rating": 5, "message": "  Great mug  " })).await;
    assert_eq!(201, created.status().as_u16());
    let review: Value = created.json().await.unwrap();
    assert_eq!(review["message"], "Great mug");
    assert_eq!(review["email"], "ann@example.com");
    assert_eq!(review["productId"], 7);

    let listed: Value = app
        .client
        .get(app.url("/products/7/reviews"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed[0]["id"], review["id"]);
    assert_eq!(listed[0]["user"], ann.user);

    let second = post_review(&app, &ann, 7, json!({ "rating": 1, "message": "Again" })).await;
    assert_eq!(403, second.status().as_u16());
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["message"], "You already reviewed this product");
    assert_eq!(app.store.review_count(), 1);
}

#[tokio::test]
async fn review_input_is_validated() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;

    let bad_rating = post_review(&app, &ann, 7, json!({ "rating": 6, "message": "Great" })).await;
    assert_eq!(400, bad_rating.status().as_u16());

    let short = post_review(&app, &ann, 7, json!({ "rating": 4, "message": "ok" })).await;
    assert_eq!(400, short.status().as_u16());

    assert_eq!(app.store.review_count(), 0);
}

#[tokio::test]
async fn review_edits_follow_owner_or_admin_policy() {
    let app = spawn_app().await;
    let ann = app.signed_up("ann@example.com").await;
    let bob = app.signed_up("bob@example.com").await;
    let admin = app.admin("admin@example.com").await;

    let review: Value = post_review(&app, &ann, 7, json!({ "rating": 5, "message": "Great" }))
        .await
        .json()
        .await
        .unwrap();
    let path = app.url(&format!("/reviews/{}", review["id"].as_str().unwrap()));
    let update = json!({ "rating": 2, "message": "Changed my mind" });

    let by_stranger = app
        .client
        .put(&path)
        .bearer_auth(&bob.access_token)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(403, by_stranger.status().as_u16());

    let by_owner = app
        .client
        .put(&path)
        .bearer_auth(&ann.access_token)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(200, by_owner.status().as_u16());
    let updated: Value = by_owner.json().await.unwrap();
    assert_eq!(updated["rating"], 2);

    let delete_by_stranger = app
        .client
        .delete(&path)
        .bearer_auth(&bob.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(403, delete_by_stranger.status().as_u16());

    let delete_by_admin = app
        .client
        .delete(&path)
        .bearer_auth(&admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(200, delete_by_admin.status().as_u16());
    let body: Value = delete_by_admin.json().await.unwrap();
    assert_eq!(body["ok"], true);

    let gone = app
        .client
        .delete(&path)
        .bearer_auth(&ann.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(404, gone.status().as_u16());
}
