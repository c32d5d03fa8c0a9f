use crate::helpers::{spawn_app, StubCatalog};

#[tokio::test]
async fn health_check_works() {
    // arrange
    let app = spawn_app(StubCatalog::with_features(vec![])).await;

    // act
    let (status, body) = app.get_page("/health_check").await;

    // assert
    assert_eq!(200, status);
    assert!(body.is_empty());
}

#[tokio::test]
async fn the_root_redirects_to_the_search_page() {
    let app = spawn_app(StubCatalog::with_features(vec![])).await;

    let response = app.client.get("/").dispatch().await;

    assert_eq!(303, response.status().code);
    assert_eq!(response.headers().get_one("Location"), Some("/earthquakes"));
}
