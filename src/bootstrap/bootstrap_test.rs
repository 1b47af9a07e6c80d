#![allow(clippy::unwrap_used)] // Tests can use unwrap for brevity
#![allow(clippy::expect_used)] // Tests can use expect for better error messages

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

/// Connector that fails a scripted number of attempts before succeeding
struct MockConnector {
    /// Attempts (1-indexed) at or below this number fail
    fail_until: u32,
    /// Fail in `open` instead of `ping`
    fail_on_open: bool,
    opens: AtomicU32,
    pings: AtomicU32,
    attempt_times: Mutex<Vec<Instant>>,
}

impl MockConnector {
    fn failing(fail_until: u32) -> Self {
        Self {
            fail_until,
            fail_on_open: false,
            opens: AtomicU32::new(0),
            pings: AtomicU32::new(0),
            attempt_times: Mutex::new(Vec::new()),
        }
    }

    fn never_reachable() -> Self {
        Self::failing(u32::MAX)
    }

    fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    fn pings(&self) -> u32 {
        self.pings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Handle = u32;

    async fn open(&self) -> Result<u32, ConnectError> {
        let attempt = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        self.attempt_times.lock().unwrap().push(Instant::now());
        if self.fail_on_open && attempt <= self.fail_until {
            return Err(ConnectError::open(format!("open failed on attempt {}", attempt)));
        }
        Ok(attempt)
    }

    async fn ping(&self, handle: &u32) -> Result<(), ConnectError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if *handle <= self.fail_until {
            return Err(ConnectError::ping("connection refused"));
        }
        Ok(())
    }
}

#[test]
fn test_default_policy() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.max_attempts, 10);
    assert_eq!(policy.delay, Duration::from_secs(2));
}

#[test]
fn test_policy_clamps_zero_attempts() {
    let policy = RetryPolicy::new(0, Duration::ZERO);
    assert_eq!(policy.max_attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_attempt_success_does_not_sleep() {
    let connector = MockConnector::failing(0);
    let start = Instant::now();

    let handle = bootstrap(&connector, &RetryPolicy::default())
        .await
        .expect("should connect");

    assert_eq!(handle, 1);
    assert_eq!(connector.opens(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_stops_at_first_success() {
    let connector = MockConnector::failing(3);

    let handle = bootstrap(&connector, &RetryPolicy::default())
        .await
        .expect("should connect on fourth attempt");

    // The returned handle is the one from the succeeding attempt
    assert_eq!(handle, 4);
    assert_eq!(connector.opens(), 4, "no attempts after success");
    assert_eq!(connector.pings(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_on_last_attempt() {
    let connector = MockConnector::failing(9);

    let handle = bootstrap(&connector, &RetryPolicy::default())
        .await
        .expect("tenth attempt should succeed");

    assert_eq!(handle, 10);
    assert_eq!(connector.opens(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_exhausts_after_max_attempts() {
    let connector = MockConnector::never_reachable();
    let start = Instant::now();

    let err = bootstrap(&connector, &RetryPolicy::default())
        .await
        .unwrap_err();

    let BootstrapError::Exhausted { attempts, source } = err;
    assert_eq!(attempts, 10);
    assert!(matches!(source, ConnectError::Ping(_)));
    assert_eq!(connector.opens(), 10, "exactly max attempts");

    // Nine delays between ten attempts, none after the last
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(18), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(20), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_attempts_are_separated_by_delay() {
    let connector = MockConnector::never_reachable();
    let policy = RetryPolicy::new(5, Duration::from_secs(2));

    let _ = bootstrap(&connector, &policy).await;

    let times = connector.attempt_times.lock().unwrap().clone();
    assert_eq!(times.len(), 5);
    for pair in times.windows(2) {
        assert!(
            pair[1] - pair[0] >= Duration::from_secs(2),
            "attempts must be at least the configured delay apart"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_is_retried() {
    let connector = MockConnector {
        fail_on_open: true,
        ..MockConnector::failing(2)
    };

    let handle = bootstrap(&connector, &RetryPolicy::new(5, Duration::from_millis(10)))
        .await
        .expect("should connect on third attempt");

    assert_eq!(handle, 3);
    assert_eq!(connector.opens(), 3);
    // Pings only happen after a successful open
    assert_eq!(connector.pings(), 1);
}

#[tokio::test]
async fn test_exhausted_error_reports_last_cause() {
    let connector = MockConnector {
        fail_on_open: true,
        ..MockConnector::never_reachable()
    };

    let err = bootstrap(&connector, &RetryPolicy::new(3, Duration::ZERO))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("after 3 attempts"), "got: {}", message);
    assert!(message.contains("open failed on attempt 3"), "got: {}", message);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_error_keeps_underlying_cause() {
    let connector = MockConnector::never_reachable();

    let err = bootstrap(&connector, &RetryPolicy::new(2, Duration::from_secs(1)))
        .await
        .unwrap_err();

    let cause = std::error::Error::source(&err).expect("exhausted error has a source");
    assert_eq!(cause.to_string(), "ping failed: connection refused");
    let driver = cause.source().expect("connect error has a driver cause");
    assert_eq!(driver.to_string(), "connection refused");
}
