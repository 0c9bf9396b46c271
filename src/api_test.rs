use super::*;

#[tokio::test]
async fn base_url_is_trimmed() {
    let client = ApiClient::new("http://localhost:3001/", None);
    assert_eq!(client.base_url, "http://localhost:3001");
}

#[tokio::test]
async fn token_is_stored_and_cleared() {
    let client = ApiClient::new("http://localhost:3001", Some("tok-1".to_owned()));
    assert_eq!(client.token().await.as_deref(), Some("tok-1"));

    client.logout().await;
    assert!(client.token().await.is_none());
}

#[tokio::test]
async fn authenticated_calls_without_token_fail_before_the_network() {
    // Port 9 is the discard service; nothing is listening in tests. The
    // token check must fire before any connection is attempted.
    let client = ApiClient::new("http://localhost:9", None);
    let err = client.school_with_classes().await.unwrap_err();
    assert!(matches!(err, ApiError::MissingToken));
}

#[tokio::test]
async fn login_response_shape_decodes() {
    let response: LoginResponse = serde_json::from_value(serde_json::json!({
        "token": "tok-2",
        "user": {
            "id": "d96d5d38-6c73-4420-ba86-c994eac336fb",
            "name": "Profa. Ana",
            "email": "ana@escola.example"
        }
    }))
    .unwrap();

    assert_eq!(response.token, "tok-2");
    assert_eq!(response.user.name, "Profa. Ana");
}
