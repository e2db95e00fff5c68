use tokio::time::{sleep_until, Duration, Instant};

/// Cancel-and-restart timer: every trigger pushes the deadline out, so a
/// burst of triggers collapses into a single expiry.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Await the live deadline, re-arming when a trigger lands mid-wait.
    /// Returns true when a trigger was pending, false on a quiet timer.
    pub async fn expired(&mut self) -> bool {
        let Some(mut deadline) = self.deadline else {
            return false;
        };
        loop {
            sleep_until(deadline).await;
            match self.deadline {
                Some(later) if later > deadline => deadline = later,
                _ => break,
            }
        }
        self.deadline = None;
        true
    }
}
