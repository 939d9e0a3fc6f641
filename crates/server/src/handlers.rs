use crate::{
    cookie::CookieSession,
    state::ServerState,
    views::{render_account, render_home},
};
use alloy_chains::Chain;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use std::sync::Arc;
use wallet_sync::{InvalidationScope, Invalidator, RawWalletReport, WalletSnapshot};

/// Body of every wallet response.
#[derive(Debug, Serialize)]
pub(crate) struct WalletResponse {
    pub wallet: Option<WalletSnapshot>,
}

/// `POST /user-wallet`: the sync action.
///
/// Stores the normalized wallet, or deletes the cookie when the body is `null` or does not
/// validate, then invalidates the whole application. Never fails.
pub(crate) async fn post_user_wallet(
    State(state): State<Arc<ServerState>>,
    mut session: CookieSession,
    body: Bytes,
) -> impl IntoResponse {
    let report = serde_json::from_slice::<Option<RawWalletReport>>(&body).unwrap_or_else(|err| {
        debug!(%err, "unreadable wallet report, clearing");
        None
    });
    let wallet = state.store().sync(&mut session, report.as_ref());
    state.registry().invalidate(&InvalidationScope::app());
    debug!(?wallet, "synced wallet cookie");
    (session, Json(WalletResponse { wallet }))
}

/// `GET /api/wallet`: the wallet of the requesting session.
pub(crate) async fn get_wallet(
    State(state): State<Arc<ServerState>>,
    session: CookieSession,
) -> Json<WalletResponse> {
    Json(WalletResponse { wallet: state.retrieve_connected_wallet(&session) })
}

/// `GET /`: public home page.
pub(crate) async fn get_home(
    State(state): State<Arc<ServerState>>,
    session: CookieSession,
) -> Html<String> {
    const ROUTE: &str = "/";
    let wallet = state.retrieve_connected_wallet(&session);
    let generation = state.registry().generation_for(ROUTE);
    Html(state.views().get_or_render(ROUTE, wallet.as_ref(), generation, || {
        render_home(wallet.as_ref())
    }))
}

/// `GET /account`: requires a wallet on a chain we know, otherwise redirects home.
pub(crate) async fn get_account(
    State(state): State<Arc<ServerState>>,
    session: CookieSession,
) -> Response {
    const ROUTE: &str = "/account";
    let Some(wallet) = state.retrieve_connected_wallet(&session) else {
        trace!("no wallet, redirecting");
        return Redirect::to(&state.config().home_path).into_response();
    };
    let Some(chain) = Chain::from_id(wallet.chain_id()).named() else {
        trace!(chain_id = wallet.chain_id(), "unknown chain, redirecting");
        return Redirect::to(&state.config().home_path).into_response();
    };

    let generation = state.registry().generation_for(ROUTE);
    let body = state
        .views()
        .get_or_render(ROUTE, Some(&wallet), generation, || render_account(&wallet, chain));
    Html(body).into_response()
}
