use crate::error::IdentityError;
use cardly_domain::config::LoginConfig;
use moka::sync::Cache;
use std::time::Duration;

/// Bound on tracked e-mails.
const MAX_TRACKED: u64 = 100_000;

#[derive(Debug, Clone, Copy)]
struct Failures {
    count: u32,
    locked_until: Option<i64>,
}

/// Counts consecutive failed logins per e-mail and locks the e-mail out once the
/// configured maximum is reached.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    failures: Cache<String, Failures>,
    max_failures: u32,
    lockout_seconds: i64,
}

impl LoginThrottle {
    pub fn new(config: &LoginConfig) -> Self {
        let lockout_seconds = i64::try_from(config.lockout_seconds).unwrap_or(i64::MAX / 2);
        Self {
            failures: Cache::builder()
                .max_capacity(MAX_TRACKED)
                .time_to_idle(Duration::from_secs(config.lockout_seconds.max(1)))
                .build(),
            max_failures: config.max_failures.max(1),
            lockout_seconds,
        }
    }

    /// Fails with [`IdentityError::Locked`] while `email` is locked out.
    pub fn check(&self, email: &str, now: i64) -> Result<(), IdentityError> {
        match self.failures.get(email).and_then(|f| f.locked_until) {
            Some(until) if until > now => {
                Err(IdentityError::Locked { retry_after: until - now, context: None })
            }
            _ => Ok(()),
        }
    }

    /// Records a failure and reports whether it triggered a lockout.
    pub fn record_failure(&self, email: &str, now: i64) -> bool {
        let previous = self.failures.get(email);
        let count = match previous {
            // A lockout that ran out starts a fresh series.
            Some(Failures { locked_until: Some(until), .. }) if until <= now => 1,
            Some(f) => f.count.saturating_add(1),
            None => 1,
        };
        let locked_until =
            (count >= self.max_failures).then(|| now.saturating_add(self.lockout_seconds));
        self.failures.insert(email.to_owned(), Failures { count, locked_until });
        locked_until.is_some()
    }

    pub fn clear(&self, email: &str) {
        self.failures.invalidate(email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle() -> LoginThrottle {
        LoginThrottle::new(&LoginConfig { max_failures: 3, lockout_seconds: 60 })
    }

    #[test]
    fn locks_after_max_failures() {
        let throttle = throttle();
        assert!(!throttle.record_failure("a@x.io", 100));
        assert!(!throttle.record_failure("a@x.io", 101));
        assert!(throttle.check("a@x.io", 101).is_ok());
        assert!(throttle.record_failure("a@x.io", 102));

        match throttle.check("a@x.io", 112) {
            Err(IdentityError::Locked { retry_after, .. }) => assert_eq!(retry_after, 50),
            other => panic!("expected lockout, got {other:?}"),
        }
        assert!(throttle.check("b@x.io", 112).is_ok());
    }

    #[test]
    fn lockout_expires_and_restarts_the_series() {
        let throttle = throttle();
        for t in 0..3 {
            throttle.record_failure("a@x.io", t);
        }
        assert!(throttle.check("a@x.io", 200).is_ok());
        assert!(!throttle.record_failure("a@x.io", 200));
    }

    #[test]
    fn success_clears_the_counter() {
        let throttle = throttle();
        throttle.record_failure("a@x.io", 0);
        throttle.record_failure("a@x.io", 1);
        throttle.clear("a@x.io");
        assert!(!throttle.record_failure("a@x.io", 2));
    }
}
