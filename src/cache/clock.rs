//! Time source for cache expiry.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
  now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
  pub fn new() -> Self {
    Self {
      now: std::sync::Mutex::new(Utc::now()),
    }
  }

  pub fn advance(&self, by: chrono::Duration) {
    let mut now = self.now.lock().unwrap();
    *now += by;
  }
}

#[cfg(test)]
impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap()
  }
}
