//! Converts handler panics into a JSON 500 response.

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::ErrorBody;

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Creates the panic-catching layer.
///
/// It must sit inside the gatekeeper so a panicking handler still
/// produces a response that is metered and logged as a 500.
pub fn layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal Server Error")),
    )
        .into_response()
}
