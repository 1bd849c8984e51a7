//! HTTP request/response tracing middleware.

use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

/// Name of the span field the gatekeeper fills with the resolved client.
pub const CLIENT_FIELD: &str = "client";

/// Builds the per-request span with an initially empty `client` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewaySpan;

impl<B> MakeSpan<B> for GatewaySpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
            client = tracing::field::Empty,
        )
    }
}

/// Creates the outermost tracing layer for HTTP requests.
///
/// # Logging Behavior
///
/// **On Request:**
/// - Creates a span at `INFO` level with:
///   - HTTP method
///   - URI path
///   - HTTP version
///   - client identity, recorded by the gatekeeper for gated paths
///
/// **On Response:**
/// - Logs at `INFO` level with:
///   - Status code
///   - Latency in milliseconds
///
/// # Example Logs
///
/// ```text
/// INFO request{method=GET uri=/api/v1/protected version=HTTP/1.1 client=10.0.0.7}: finished processing request latency=2 ms status=200
/// INFO request{method=GET uri=/health version=HTTP/1.1}: finished processing request latency=0 ms status=200
/// ```
///
/// # Integration
///
/// ```rust,ignore
/// let app = gateway_router(state)
///     .layer(tracing::layer());
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, GatewaySpan> {
    TraceLayer::new_for_http()
        .make_span_with(GatewaySpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_span_reports_recorded_client() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let request = Request::get("/api/v1/protected").body(()).unwrap();
            let span = GatewaySpan.make_span(&request);
            span.record(CLIENT_FIELD, tracing::field::display("10.0.0.7"));
            span.in_scope(|| tracing::info!("handled"));
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("method=GET"), "{output}");
        assert!(output.contains("uri=/api/v1/protected"), "{output}");
        assert!(output.contains("client=10.0.0.7"), "{output}");
    }

    #[test]
    fn test_span_without_client_omits_field() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let request = Request::get("/health").body(()).unwrap();
            GatewaySpan
                .make_span(&request)
                .in_scope(|| tracing::info!("handled"));
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("uri=/health"), "{output}");
        assert!(!output.contains("client="), "{output}");
    }
}
