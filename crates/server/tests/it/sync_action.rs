use crate::utils::*;
use axum::http::StatusCode;
use wallet_sync::SyncConfig;

#[tokio::test]
async fn stores_normalized_wallet() {
    let (app, state) = app(SyncConfig::default());

    let body = format!(r#"{{"address":"{LOWER}","chainId":"1"}}"#);
    let response = send(&app, post_wallet(&body, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(response.headers());
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.starts_with("user-wallet=%7B%22address%22%3A%220xAb5801a7"), "{cookie}");
    assert!(cookie.ends_with("; Path=/; HttpOnly; SameSite=Lax"), "{cookie}");

    let body = body_string(response).await;
    assert_eq!(body, format!(r#"{{"wallet":{{"address":"{CHECKSUMMED}","chainId":1}}}}"#));
    assert_eq!(state.registry().generation_for("/"), 1);
}

#[tokio::test]
async fn accepts_numeric_and_hex_chain_ids() {
    let (app, _) = app(SyncConfig::default());

    for chain_id in ["137", "\"137\"", "\"0x89\""] {
        let body = format!(r#"{{"address":"{CHECKSUMMED}","chainId":{chain_id}}}"#);
        let response = send(&app, post_wallet(&body, None)).await;
        let body = body_string(response).await;
        assert!(body.ends_with(r#""chainId":137}}"#), "{chain_id}: {body}");
    }
}

#[tokio::test]
async fn null_clears_cookie() {
    let (app, state) = app(SyncConfig::default());

    let response = send(&app, post_wallet("null", Some("user-wallet=stale"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        set_cookies(response.headers()),
        vec!["user-wallet=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0".to_string()]
    );
    assert_eq!(body_string(response).await, r#"{"wallet":null}"#);
    assert_eq!(state.registry().generation_for("/"), 1);
}

#[tokio::test]
async fn invalid_reports_clear_cookie() {
    let (app, state) = app(SyncConfig::default());

    let bodies = [
        // miscased checksum
        r#"{"address":"0xAB5801A7D398351B8BE11C439E05C5B3259AEC9B","chainId":"1"}"#.to_string(),
        format!(r#"{{"address":"{LOWER}","chainId":"0"}}"#),
        format!(r#"{{"address":"{LOWER}","chainId":""}}"#),
        format!(r#"{{"address":"{LOWER}","chainId":1.5}}"#),
        format!(r#"{{"address":"{LOWER}"}}"#),
        "not json".to_string(),
        String::new(),
    ];
    for body in &bodies {
        let response = send(&app, post_wallet(body, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        let cookies = set_cookies(response.headers());
        assert_eq!(cookies.len(), 1, "{body}");
        assert!(cookies[0].starts_with("user-wallet=;"), "{body}");
        assert!(cookies[0].contains("Max-Age=0"), "{body}");
        assert_eq!(body_string(response).await, r#"{"wallet":null}"#, "{body}");
    }
    assert_eq!(state.registry().generation_for("/"), bodies.len() as u64);
}

#[tokio::test]
async fn configured_cookie_attributes() {
    let config = SyncConfig {
        cookie_name: "wallet".to_string(),
        cookie_secure: true,
        cookie_max_age_secs: Some(86400),
        ..Default::default()
    };
    let (app, _) = app(config);

    let body = format!(r#"{{"address":"{CHECKSUMMED}","chainId":1}}"#);
    let response = send(&app, post_wallet(&body, None)).await;
    let cookies = set_cookies(response.headers());
    assert!(cookies[0].starts_with("wallet=%7B"));
    assert!(cookies[0].ends_with("; Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age=86400"));

    let response = send(&app, post_wallet("null", None)).await;
    assert_eq!(
        set_cookies(response.headers()),
        vec!["wallet=; Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age=0".to_string()]
    );
}
