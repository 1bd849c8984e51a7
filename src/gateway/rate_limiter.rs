//! Fixed-window rate limiting keyed by client identity.
//!
//! Each client gets a counter and the instant its current window opened.
//! The window is a hard cliff: once `window` has elapsed since it opened,
//! the next request starts a fresh window with a count of 1.
//!
//! All read-modify-write of the table happens under one mutex. The critical
//! section is a hash lookup and an increment, so a coarse lock is cheap and
//! guarantees two concurrent admits for the same client can never both
//! slip under the limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Decision returned by [`RateLimiter::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    window_start: Instant,
    count: u32,
}

/// Per-client fixed-window counter table.
#[derive(Debug)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Creates a limiter admitting `limit` requests per `window` per client.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decides whether `client` may make another request now.
    pub fn admit(&self, client: &str) -> Admission {
        self.admit_at(client, Instant::now())
    }

    /// Same as [`Self::admit`] with an explicit clock reading.
    ///
    /// A denied request does not touch the entry, so it is not carried
    /// over into the next window.
    pub fn admit_at(&self, client: &str, now: Instant) -> Admission {
        let mut entries = self.lock();

        match entries.get_mut(client) {
            None => {
                entries.insert(
                    client.to_owned(),
                    WindowEntry {
                        window_start: now,
                        count: 1,
                    },
                );
                Admission::Allow
            }
            Some(entry) if now.saturating_duration_since(entry.window_start) >= self.window => {
                entry.window_start = now;
                entry.count = 1;
                Admission::Allow
            }
            Some(entry) if entry.count < self.limit => {
                entry.count += 1;
                Admission::Allow
            }
            Some(_) => Admission::Deny,
        }
    }

    /// Requests counted for `client` in its current window, if tracked.
    pub fn current_count(&self, client: &str) -> Option<u32> {
        self.lock().get(client).map(|entry| entry.count)
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Evicts entries whose window has closed. Returns how many were removed.
    ///
    /// An evicted client is indistinguishable from one whose window has
    /// expired: its next request opens a fresh window either way.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.window_start) < self.window);
        before - entries.len()
    }

    /// Spawns a background task that calls [`Self::purge_expired`] every
    /// `period`.
    ///
    /// The task holds only a weak reference and exits once the limiter is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let limiter: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    tracing::debug!("rate limiter dropped, stopping sweeper");
                    break;
                };

                let removed = limiter.purge_expired();
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        remaining = limiter.tracked_clients(),
                        "evicted stale rate limit entries"
                    );
                }
            }
        })
    }

    // A panic while holding the lock cannot leave an entry half-updated,
    // so a poisoned table is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, WindowEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_first_request_is_allowed() {
        let limiter = RateLimiter::new(3, WINDOW);
        assert_eq!(limiter.admit("10.0.0.1"), Admission::Allow);
        assert_eq!(limiter.current_count("10.0.0.1"), Some(1));
    }

    #[test]
    fn test_limit_plus_one_is_denied() {
        let limiter = RateLimiter::new(3, WINDOW);
        let t0 = Instant::now();

        for i in 0..3 {
            let now = t0 + Duration::from_secs(i);
            assert_eq!(limiter.admit_at("client", now), Admission::Allow);
        }
        assert_eq!(
            limiter.admit_at("client", t0 + Duration::from_secs(10)),
            Admission::Deny
        );
        // Denials do not push the count past the limit.
        assert_eq!(limiter.current_count("client"), Some(3));
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = RateLimiter::new(2, WINDOW);
        let t0 = Instant::now();

        assert!(limiter.admit_at("client", t0).is_allowed());
        assert!(limiter.admit_at("client", t0).is_allowed());
        assert!(!limiter.admit_at("client", t0 + Duration::from_secs(59)).is_allowed());

        // Exactly one window after the start is already a new window.
        assert!(limiter.admit_at("client", t0 + WINDOW).is_allowed());
        assert_eq!(limiter.current_count("client"), Some(1));
    }

    #[test]
    fn test_fixed_window_allows_burst_at_boundary() {
        let limiter = RateLimiter::new(2, WINDOW);
        let t0 = Instant::now();
        let late = t0 + Duration::from_secs(59);

        assert!(limiter.admit_at("client", t0).is_allowed());
        assert!(limiter.admit_at("client", late).is_allowed());
        assert!(!limiter.admit_at("client", late).is_allowed());

        let next = t0 + WINDOW;
        assert!(limiter.admit_at("client", next).is_allowed());
        assert!(limiter.admit_at("client", next).is_allowed());
        assert!(!limiter.admit_at("client", next).is_allowed());
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, WINDOW);

        assert!(limiter.admit("a").is_allowed());
        assert!(!limiter.admit("a").is_allowed());
        assert!(limiter.admit("b").is_allowed());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_purge_removes_only_closed_windows() {
        let limiter = RateLimiter::new(5, WINDOW);
        let t0 = Instant::now();

        limiter.admit_at("old", t0);
        limiter.admit_at("fresh", t0 + Duration::from_secs(30));

        let removed = limiter.purge_expired_at(t0 + WINDOW);
        assert_eq!(removed, 1);
        assert_eq!(limiter.current_count("old"), None);
        assert_eq!(limiter.current_count("fresh"), Some(1));
    }

    #[test]
    fn test_concurrent_admits_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new(50, WINDOW));
        let allowed = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let allowed = Arc::clone(&allowed);
                thread::spawn(move || {
                    for _ in 0..25 {
                        if limiter.admit("shared").is_allowed() {
                            allowed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(allowed.load(Ordering::Relaxed), 50);
        assert_eq!(limiter.current_count("shared"), Some(50));
    }

    #[tokio::test]
    async fn test_sweeper_evicts_in_background() {
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_millis(10)));
        limiter.admit("client");

        let handle = limiter.spawn_sweeper(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(limiter.tracked_clients(), 0);

        drop(limiter);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }
}
