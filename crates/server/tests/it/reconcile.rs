use crate::utils::*;
use wallet_sync::{
    ReconciliationController, SyncConfig, WalletStatus,
    test_utils::{FakeProbe, FakeProvider},
};
use wallet_sync_server::CookieSession;

#[tokio::test]
async fn controller_writes_cookies_the_server_reads() {
    let (app, state) = app(SyncConfig::default());

    let provider = FakeProvider::new();
    provider.set_wallet(LOWER, "0x1");

    let session = CookieSession::new(state.cookie_attributes());
    let mut controller = ReconciliationController::new(session, state.registry().clone())
        .with_store(state.store().clone());
    controller.observe(&FakeProbe::single(provider.clone()));

    let status = controller.check().await;
    assert!(matches!(status, Some(WalletStatus::Connected(_))));
    assert_eq!(state.registry().generation_for("/account"), 1);

    let set_cookie = controller.session().set_cookie_headers();
    assert_eq!(set_cookie.len(), 1);
    let cookie = cookie_pair(&set_cookie[0]);

    let body = body_string(send(&app, get("/api/wallet", Some(&cookie))).await).await;
    assert_eq!(body, format!(r#"{{"wallet":{{"address":"{CHECKSUMMED}","chainId":1}}}}"#));

    // the wallet disconnects; the same session now carries a deletion
    provider.set_accounts(Vec::new());
    assert_eq!(controller.check().await, Some(WalletStatus::Disconnected));
    assert_eq!(state.registry().generation_for("/"), 2);
    assert_eq!(
        controller.session().set_cookie_headers(),
        vec!["user-wallet=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0".to_string()]
    );
}
