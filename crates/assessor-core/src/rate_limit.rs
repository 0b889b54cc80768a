//! Per-actor sliding-window admission control.
//!
//! State lives for the process only. The limiter is constructed explicitly and
//! shared through an `Arc`; tests build isolated instances with a
//! [`ManualClock`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::errors::AssessError;

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + *offset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}

/// Tracked actors above which `try_acquire` sweeps idle entries.
const SWEEP_THRESHOLD: usize = 1024;

/// Sliding-window limiter keyed by actor id.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            clock,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `actor` may start another request now.
    pub fn can_admit(&self, actor: &str) -> bool {
        let now = self.clock.now();
        let mut map = self.lock();
        self.prune(&mut map, actor, now) < self.max_requests
    }

    /// Record an admitted request. Call only after [`Self::can_admit`]
    /// returned true for the same actor.
    pub fn record_request(&self, actor: &str) {
        let now = self.clock.now();
        let mut map = self.lock();
        map.entry(actor.to_string()).or_default().push_back(now);
    }

    /// Requests `actor` may still make in the current window.
    pub fn remaining(&self, actor: &str) -> usize {
        let now = self.clock.now();
        let mut map = self.lock();
        let used = self.prune(&mut map, actor, now);
        self.max_requests.saturating_sub(used)
    }

    /// Check and record in one critical section.
    pub fn try_acquire(&self, actor: &str) -> Result<(), AssessError> {
        let now = self.clock.now();
        let mut map = self.lock();
        if map.len() >= SWEEP_THRESHOLD {
            self.sweep(&mut map, now);
        }
        let used = self.prune(&mut map, actor, now);
        if used >= self.max_requests {
            let retry_after = map
                .get(actor)
                .and_then(|q| q.front())
                .map(|oldest| (*oldest + self.window).saturating_duration_since(now));
            return Err(AssessError::AdmissionDenied {
                actor: actor.to_string(),
                limit: self.max_requests,
                window_secs: self.window.as_secs(),
                retry_after,
            });
        }
        map.entry(actor.to_string()).or_default().push_back(now);
        Ok(())
    }

    /// Actors with at least one request still in the window, or not yet swept.
    pub fn tracked_actors(&self) -> usize {
        self.lock().len()
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drop every actor whose newest request has left the window.
    fn sweep(&self, map: &mut HashMap<String, VecDeque<Instant>>, now: Instant) {
        let before = map.len();
        map.retain(|_, queue| {
            queue
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < self.window)
        });
        tracing::debug!(before, after = map.len(), "swept idle rate-limit entries");
    }

    /// Drop timestamps outside the window; returns how many remain.
    fn prune(
        &self,
        map: &mut HashMap<String, VecDeque<Instant>>,
        actor: &str,
        now: Instant,
    ) -> usize {
        let Some(queue) = map.get_mut(actor) else {
            return 0;
        };
        while let Some(front) = queue.front() {
            if now.saturating_duration_since(*front) >= self.window {
                queue.pop_front();
            } else {
                break;
            }
        }
        let len = queue.len();
        if len == 0 {
            map.remove(actor);
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(&RateLimitConfig::default(), clock.clone());
        (limiter, clock)
    }

    #[test]
    fn eleventh_request_in_window_is_rejected() {
        let (limiter, clock) = limiter();
        for _ in 0..10 {
            assert!(limiter.can_admit("alice"));
            limiter.record_request("alice");
            clock.advance(Duration::from_secs(1));
        }
        assert!(!limiter.can_admit("alice"));
        assert_eq!(limiter.remaining("alice"), 0);
    }

    #[test]
    fn window_slides_past_first_request() {
        let (limiter, clock) = limiter();
        for _ in 0..10 {
            limiter.record_request("alice");
        }
        assert!(!limiter.can_admit("alice"));
        clock.advance(Duration::from_secs(61));
        assert!(limiter.can_admit("alice"));
        assert_eq!(limiter.remaining("alice"), 10);
    }

    #[test]
    fn actors_are_independent() {
        let (limiter, _clock) = limiter();
        for _ in 0..10 {
            limiter.record_request("alice");
        }
        assert!(!limiter.can_admit("alice"));
        assert!(limiter.can_admit("bob"));
        assert_eq!(limiter.remaining("bob"), 10);
    }

    #[test]
    fn try_acquire_reports_retry_after() {
        let (limiter, clock) = limiter();
        for _ in 0..10 {
            limiter.try_acquire("anon:1.2.3.4").unwrap();
        }
        clock.advance(Duration::from_secs(20));
        match limiter.try_acquire("anon:1.2.3.4") {
            Err(AssessError::AdmissionDenied {
                retry_after, limit, ..
            }) => {
                assert_eq!(limit, 10);
                assert_eq!(retry_after, Some(Duration::from_secs(40)));
            }
            other => panic!("expected AdmissionDenied, got {:?}", other),
        }
        // Rejected attempts are not recorded.
        clock.advance(Duration::from_secs(40));
        assert_eq!(limiter.remaining("anon:1.2.3.4"), 10);
    }

    #[test]
    fn pruning_forgets_idle_actors() {
        let (limiter, clock) = limiter();
        limiter.record_request("carol");
        clock.advance(Duration::from_secs(60));
        assert_eq!(limiter.remaining("carol"), 10);
        assert!(limiter.lock().get("carol").is_none());
    }

    #[test]
    fn concurrent_acquire_never_exceeds_limit() {
        let limiter = Arc::new(RateLimiter::new(&RateLimitConfig::default()));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.try_acquire("shared").is_ok())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 10);
    }

    #[test]
    fn idle_actors_are_swept_once_the_map_grows() {
        let (limiter, clock) = limiter();
        for i in 0..SWEEP_THRESHOLD {
            limiter.try_acquire(&format!("anon:{}", i)).unwrap();
        }
        assert_eq!(limiter.tracked_actors(), SWEEP_THRESHOLD);

        clock.advance(Duration::from_secs(30));
        limiter.try_acquire("anon:0").unwrap();
        assert_eq!(limiter.tracked_actors(), SWEEP_THRESHOLD);

        clock.advance(Duration::from_secs(45));
        limiter.try_acquire("late").unwrap();
        // Only anon:0 (renewed at 30s) and the new actor are left.
        assert_eq!(limiter.tracked_actors(), 2);
        assert_eq!(limiter.remaining("anon:0"), 9);
    }
}
