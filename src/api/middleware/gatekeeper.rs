//! Gatekeeper middleware: gateway key, bearer token, rate limit, then
//! metrics and access logging for everything that is not excluded.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::tracing::CLIENT_FIELD;
use crate::gateway::client_ip;
use crate::state::AppState;

/// Runs the gatekeeper pipeline around every request.
///
/// # Flow
///
/// 1. Excluded paths go straight to the handler, unmetered and unlogged
/// 2. Otherwise a report guard starts timing the request
/// 3. Gateway key, bearer token and rate limit are checked in order;
///    the first failure becomes the response
/// 4. On success the validated [`Claims`](crate::domain::entities::Claims)
///    are inserted as a request extension and the handler runs
/// 5. The final status is recorded in the metrics sink and access log
///
/// If the request future is dropped before a response exists, the guard
/// records it with status 499.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api", api_routes())
///     .layer(middleware::from_fn_with_state(state.clone(), gatekeeper::layer))
///     .with_state(state);
/// ```
pub async fn layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    if st.gateway.is_excluded(&path) {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(req.headers(), peer, st.gateway.behind_proxy());
    tracing::Span::current().record(CLIENT_FIELD, tracing::field::display(&client));

    let report = st
        .gateway
        .begin_report(req.method().as_str(), &path, &client);

    let response = match st.gateway.check_guarded(req.headers(), &client) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(rejection) => rejection.into_response(),
    };

    report.complete(response.status());
    response
}
