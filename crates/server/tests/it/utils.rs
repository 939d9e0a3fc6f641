use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, Response, header},
};
use std::sync::Arc;
use tower::ServiceExt;
use wallet_sync::SyncConfig;
use wallet_sync_server::{ServerState, build_router};

pub const CHECKSUMMED: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";
pub const LOWER: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";

/// A router over fresh state, plus the state for inspection.
pub fn app(config: SyncConfig) -> (Router, Arc<ServerState>) {
    wallet_sync::test_utils::init_tracing();
    let state = Arc::new(ServerState::new(config));
    (build_router(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_wallet(body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/user-wallet")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Turns a `Set-Cookie` value into the `Cookie` header a browser would send back.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}
