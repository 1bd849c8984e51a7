//! Post-response reporting to the metrics sink and request logger.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;

use crate::gateway::metrics::MetricsSink;
use crate::gateway::pipeline::Gateway;
use crate::gateway::request_log::{RequestLogger, RequestRecord};

/// Status recorded when the request future is dropped before a response
/// exists, e.g. because the client disconnected.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Receives one record per reported request.
///
/// The metrics sink and the access logger are always installed; hosts may
/// add their own through [`Gateway::with_sink`].
pub trait ReportSink: Send + Sync {
    fn report(&self, record: &RequestRecord<'_>);
}

impl ReportSink for MetricsSink {
    fn report(&self, record: &RequestRecord<'_>) {
        self.record(record.status, record.latency);
    }
}

impl ReportSink for RequestLogger {
    fn report(&self, record: &RequestRecord<'_>) {
        self.log(record);
    }
}

/// Reports one request exactly once.
///
/// Call [`Self::complete`] with the final status. If the guard is dropped
/// without completing, the request is reported as
/// [`CLIENT_CLOSED_REQUEST`]. Each sink runs in isolation: a panic in one
/// is caught and logged, the remaining sinks still run, and nothing reaches
/// the response path.
pub struct ReportGuard {
    gateway: Arc<Gateway>,
    method: String,
    path: String,
    client: String,
    started: Instant,
    reported: bool,
}

impl ReportGuard {
    pub(crate) fn new(gateway: Arc<Gateway>, method: &str, path: &str, client: &str) -> Self {
        Self {
            gateway,
            method: method.to_owned(),
            path: path.to_owned(),
            client: client.to_owned(),
            started: Instant::now(),
            reported: false,
        }
    }

    pub fn complete(mut self, status: StatusCode) {
        self.report(status.as_u16());
    }

    fn report(&mut self, status: u16) {
        if self.reported {
            return;
        }
        self.reported = true;

        let record = RequestRecord {
            method: &self.method,
            path: &self.path,
            client: &self.client,
            status,
            latency: self.started.elapsed(),
        };

        for sink in self.gateway.sinks() {
            if !report_isolated(sink, &record) {
                tracing::error!(
                    method = %self.method,
                    path = %self.path,
                    status,
                    "request reporting failed; response unaffected"
                );
            }
        }
    }
}

/// Runs one sink, containing any panic. Returns false if it panicked.
fn report_isolated(sink: &dyn ReportSink, record: &RequestRecord<'_>) -> bool {
    panic::catch_unwind(AssertUnwindSafe(|| sink.report(record))).is_ok()
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        if !self.reported {
            self.report(CLIENT_CLOSED_REQUEST);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::TokenService;
    use crate::config::Config;
    use chrono::Duration;
    use jsonwebtoken::Algorithm;

    use std::sync::Mutex;

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            "secret",
            Algorithm::HS256,
            Duration::minutes(1),
            Duration::days(1),
        ))
    }

    fn gateway() -> Arc<Gateway> {
        Arc::new(Gateway::new(&Config::default(), tokens()))
    }

    struct PanickingSink;

    impl ReportSink for PanickingSink {
        fn report(&self, _record: &RequestRecord<'_>) {
            panic!("sink failure");
        }
    }

    #[derive(Default)]
    struct StatusCollector(Mutex<Vec<u16>>);

    impl ReportSink for StatusCollector {
        fn report(&self, record: &RequestRecord<'_>) {
            self.0.lock().unwrap().push(record.status);
        }
    }

    #[test]
    fn test_complete_reports_once() {
        let gw = gateway();
        let guard = gw.begin_report("GET", "/api/v1/protected", "1.1.1.1");
        guard.complete(StatusCode::OK);

        let snapshot = gw.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.status_counts.get(&200), Some(&1));
    }

    #[test]
    fn test_drop_without_complete_still_reports() {
        let gw = gateway();
        {
            let _guard = gw.begin_report("GET", "/slow", "1.1.1.1");
        }

        let snapshot = gw.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(
            snapshot.status_counts.get(&CLIENT_CLOSED_REQUEST),
            Some(&1)
        );
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let collector = Arc::new(StatusCollector::default());
        let gw = Arc::new(
            Gateway::new(&Config::default(), tokens())
                .with_sink(Arc::new(PanickingSink))
                .with_sink(collector.clone()),
        );

        let guard = gw.begin_report("GET", "/api/v1/protected", "1.1.1.1");
        guard.complete(StatusCode::OK);

        // Built-in sinks ran before the failing one, the later one after it.
        assert_eq!(gw.metrics().snapshot().status_counts.get(&200), Some(&1));
        assert_eq!(*collector.0.lock().unwrap(), vec![200]);
    }

    #[test]
    fn test_report_isolated_reports_failure() {
        let record = RequestRecord {
            method: "GET",
            path: "/",
            client: "1.1.1.1",
            status: 200,
            latency: std::time::Duration::from_millis(1),
        };

        assert!(!report_isolated(&PanickingSink, &record));
        assert!(report_isolated(&MetricsSink::new(), &record));
    }
}
