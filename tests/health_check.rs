mod common;

use common::spawn_app;

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/health_check"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/does-not-exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = spawn_app().await;

    let first = app.client.get(app.url("/health_check")).send().await.unwrap();
    let second = app.client.get(app.url("/health_check")).send().await.unwrap();

    let id_of = |r: &reqwest::Response| {
        r.headers()
            .get(storefront::logger::REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| uuid::Uuid::parse_str(v).ok())
    };
    let first_id = id_of(&first).expect("request id header");
    let second_id = id_of(&second).expect("request id header");
    assert_ne!(first_id, second_id);
}
