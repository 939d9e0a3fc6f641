use crate::utils::*;
use axum::http::{StatusCode, header};
use wallet_sync::SyncConfig;

fn wallet_cookie(address: &str, chain_id: &str) -> String {
    let value = format!(r#"{{"address":"{address}","chainId":{chain_id}}}"#);
    format!("user-wallet={}", urlencoding::encode(&value))
}

#[tokio::test]
async fn wallet_api_reads_cookie() {
    let (app, _) = app(SyncConfig::default());

    let response = send(&app, get("/api/wallet", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"wallet":null}"#);

    let cookie = wallet_cookie(CHECKSUMMED, "10");
    let response = send(&app, get("/api/wallet", Some(&cookie))).await;
    assert_eq!(
        body_string(response).await,
        format!(r#"{{"wallet":{{"address":"{CHECKSUMMED}","chainId":10}}}}"#)
    );
}

#[tokio::test]
async fn wallet_api_ignores_corrupt_cookies() {
    let (app, _) = app(SyncConfig::default());

    let corrupt = [
        wallet_cookie("0xAB5801A7D398351B8BE11C439E05C5B3259AEC9B", "1"),
        // a persisted chain id must be numeric
        wallet_cookie(CHECKSUMMED, "\"1\""),
        wallet_cookie(CHECKSUMMED, "-1"),
        "user-wallet=%7Bnot-json".to_string(),
        "user-wallet=".to_string(),
    ];
    for cookie in &corrupt {
        let response = send(&app, get("/api/wallet", Some(cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(response).await, r#"{"wallet":null}"#, "{cookie}");
    }
}

#[tokio::test]
async fn home_renders_connection() {
    let (app, _) = app(SyncConfig::default());

    let body = body_string(send(&app, get("/", None)).await).await;
    assert!(body.contains("You are not connected."));

    let cookie = wallet_cookie(LOWER, "1");
    let body = body_string(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("You are connected."));
    assert!(body.contains("Wallet address is 0xAb58...eC9B, network is #1."));
}

#[tokio::test]
async fn home_is_recomputed_after_sync() {
    let (app, state) = app(SyncConfig::default());
    let cookie = wallet_cookie(CHECKSUMMED, "1");

    send(&app, get("/", Some(&cookie))).await;
    send(&app, get("/", Some(&cookie))).await;
    assert_eq!(state.views().renders(), 1);

    // another session is rendered on its own
    send(&app, get("/", None)).await;
    assert_eq!(state.views().renders(), 2);

    send(&app, post_wallet("null", Some(&cookie))).await;
    send(&app, get("/", Some(&cookie))).await;
    assert_eq!(state.views().renders(), 3);
    send(&app, get("/", Some(&cookie))).await;
    assert_eq!(state.views().renders(), 3);
}

#[tokio::test]
async fn home_views_are_shared_by_equal_wallets() {
    let (app, state) = app(SyncConfig::default());

    // Cookies that fail validation all render the disconnected view.
    for i in 0..500 {
        let cookie = format!("user-wallet=garbage-{i}");
        send(&app, get("/", Some(&cookie))).await;
    }
    send(&app, get("/", None)).await;
    assert_eq!(state.views().renders(), 1);
    assert_eq!(state.views().len(), 1);

    // Different spellings of the same wallet share a view.
    send(&app, get("/", Some(&wallet_cookie(CHECKSUMMED, "1")))).await;
    send(&app, get("/", Some(&wallet_cookie(LOWER, "1")))).await;
    assert_eq!(state.views().renders(), 2);
    assert_eq!(state.views().len(), 2);
}

#[tokio::test]
async fn account_redirects_without_wallet() {
    let (app, _) = app(SyncConfig::default());

    let response = send(&app, get("/account", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn account_redirects_on_unknown_chain() {
    let config = SyncConfig { home_path: "/welcome".to_string(), ..Default::default() };
    let (app, _) = app(config);

    let cookie = wallet_cookie(CHECKSUMMED, "9876543210123");
    let response = send(&app, get("/account", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/welcome");
}

#[tokio::test]
async fn account_renders_known_chain() {
    let (app, _) = app(SyncConfig::default());

    let cookie = wallet_cookie(CHECKSUMMED, "1");
    let response = send(&app, get("/account", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Account on chain mainnet"), "{body}");
    assert!(body.contains("0xAb58...eC9B"));
}
