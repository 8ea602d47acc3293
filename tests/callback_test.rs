use std::time::Duration;

use sporlsync::{error::AuthError, server::CallbackReceiver, types::CallbackResult};

async fn get(url: &str) -> u16 {
    reqwest::get(url).await.unwrap().status().as_u16()
}

#[tokio::test]
async fn receiver_captures_code_with_matching_state() {
    let handle = CallbackReceiver::start("127.0.0.1:38101", "/callback", "nonce-1")
        .await
        .unwrap();

    let status = get("http://127.0.0.1:38101/callback?code=CODE1&state=nonce-1").await;
    assert_eq!(status, 200);

    let result = handle.await_result(Duration::from_secs(2)).await.unwrap();
    assert_eq!(result, CallbackResult::Code("CODE1".to_string()));
}

#[tokio::test]
async fn receiver_ignores_callback_with_foreign_state() {
    let handle = CallbackReceiver::start("127.0.0.1:38102", "/callback", "nonce-2")
        .await
        .unwrap();

    assert_eq!(
        get("http://127.0.0.1:38102/callback?code=EVIL&state=forged").await,
        400
    );
    assert_eq!(get("http://127.0.0.1:38102/callback?code=EVIL").await, 400);
    assert_eq!(
        get("http://127.0.0.1:38102/callback?code=GOOD&state=nonce-2").await,
        200
    );

    let result = handle.await_result(Duration::from_secs(2)).await.unwrap();
    assert_eq!(result, CallbackResult::Code("GOOD".to_string()));
}

#[tokio::test]
async fn receiver_reports_provider_error() {
    let handle = CallbackReceiver::start("127.0.0.1:38103", "/callback", "nonce-3")
        .await
        .unwrap();

    assert_eq!(
        get("http://127.0.0.1:38103/callback?error=access_denied&state=nonce-3").await,
        200
    );

    let result = handle.await_result(Duration::from_secs(2)).await.unwrap();
    assert_eq!(result, CallbackResult::Error("access_denied".to_string()));
}

#[tokio::test]
async fn receiver_accepts_only_the_first_callback() {
    let handle = CallbackReceiver::start("127.0.0.1:38104", "/callback", "nonce-4")
        .await
        .unwrap();

    assert_eq!(
        get("http://127.0.0.1:38104/callback?code=FIRST&state=nonce-4").await,
        200
    );
    assert_eq!(
        get("http://127.0.0.1:38104/callback?code=SECOND&state=nonce-4").await,
        410
    );

    let result = handle.await_result(Duration::from_secs(2)).await.unwrap();
    assert_eq!(result, CallbackResult::Code("FIRST".to_string()));
}

#[tokio::test]
async fn receiver_times_out_and_releases_port() {
    let handle = CallbackReceiver::start("127.0.0.1:38105", "/callback", "nonce-5")
        .await
        .unwrap();

    let err = handle
        .await_result(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CallbackTimeout(_)));

    let rebound = tokio::net::TcpListener::bind("127.0.0.1:38105").await;
    assert!(rebound.is_ok());
}

#[tokio::test]
async fn port_is_released_after_successful_callback() {
    let handle = CallbackReceiver::start("127.0.0.1:38106", "/callback", "nonce-6")
        .await
        .unwrap();
    get("http://127.0.0.1:38106/callback?code=CODE&state=nonce-6").await;
    handle.await_result(Duration::from_secs(2)).await.unwrap();

    let again = CallbackReceiver::start("127.0.0.1:38106", "/callback", "nonce-7").await;
    assert!(again.is_ok());
}

#[tokio::test]
async fn second_receiver_on_same_port_is_refused() {
    let _first = CallbackReceiver::start("127.0.0.1:38107", "/callback", "a")
        .await
        .unwrap();

    let second = CallbackReceiver::start("127.0.0.1:38107", "/callback", "b").await;
    assert!(matches!(second, Err(AuthError::Configuration(_))));
}

#[tokio::test]
async fn receiver_on_ephemeral_port_serves_self_closing_page() {
    let handle = CallbackReceiver::start("127.0.0.1:0", "/callback", "nonce-8")
        .await
        .unwrap();
    let addr = handle.local_addr();
    assert_ne!(addr.port(), 0);

    let response = reqwest::get(format!("http://{}/callback?code=CODE8&state=nonce-8", addr))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("window.close"));

    let result = handle.await_result(Duration::from_secs(2)).await.unwrap();
    assert_eq!(result, CallbackResult::Code("CODE8".to_string()));
}
