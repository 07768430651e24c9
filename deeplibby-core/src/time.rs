//! Time abstraction so debounce and stagger delays can run against a
//! virtual clock in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of "now" and of sleeps.
///
/// Sleep deadlines are fixed when `sleep` is called, not when the returned
/// future is first polled.
pub trait TimeProvider: Send + Sync + std::fmt::Debug + 'static {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> Sleep;
}

/// Production provider backed by the tokio timer.
#[derive(Clone, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Manually advanced clock.
#[derive(Clone, Debug)]
pub struct VirtualTimeProvider {
    inner: Arc<Mutex<VirtualClock>>,
}

#[derive(Debug)]
struct VirtualClock {
    now: Instant,
    timers: Vec<VirtualTimer>,
    next_timer_id: u64,
}

#[derive(Debug)]
struct VirtualTimer {
    id: u64,
    deadline: Instant,
    waker: Option<Waker>,
}

impl VirtualTimeProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VirtualClock {
                now: Instant::now(),
                timers: Vec::new(),
                next_timer_id: 0,
            })),
        }
    }

    /// Advance time and wake every timer whose deadline has passed.
    pub fn advance(&self, duration: Duration) {
        let expired: Vec<Waker> = {
            let mut clock = self.inner.lock();
            clock.now += duration;
            let now = clock.now;
            let mut wakers = Vec::new();
            clock.timers.retain_mut(|timer| {
                if timer.deadline <= now {
                    wakers.extend(timer.waker.take());
                    false
                } else {
                    true
                }
            });
            wakers
        };

        for waker in expired {
            waker.wake();
        }
    }

    /// Advance to the earliest pending deadline, returning the step taken.
    pub fn advance_to_next_timer(&self) -> Option<Duration> {
        let step = {
            let clock = self.inner.lock();
            let next = clock.timers.iter().map(|t| t.deadline).min()?;
            next.saturating_duration_since(clock.now)
        };
        self.advance(step);
        Some(step)
    }

    /// Offsets of the pending timers from now, in ascending order.
    pub fn pending_deadlines(&self) -> Vec<Duration> {
        let clock = self.inner.lock();
        let mut offsets: Vec<Duration> = clock
            .timers
            .iter()
            .map(|t| t.deadline.saturating_duration_since(clock.now))
            .collect();
        offsets.sort();
        offsets
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }
}

impl Default for VirtualTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for VirtualTimeProvider {
    fn now(&self) -> Instant {
        self.inner.lock().now
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        let mut clock = self.inner.lock();
        let deadline = clock.now + duration;
        let id = clock.next_timer_id;
        clock.next_timer_id += 1;
        // Register eagerly so pending_timers sees it before the first poll.
        clock.timers.push(VirtualTimer {
            id,
            deadline,
            waker: None,
        });
        drop(clock);

        Box::pin(VirtualSleep {
            clock: Arc::clone(&self.inner),
            id,
            deadline,
        })
    }
}

struct VirtualSleep {
    clock: Arc<Mutex<VirtualClock>>,
    id: u64,
    deadline: Instant,
}

impl Future for VirtualSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut clock = self.clock.lock();
        if clock.now >= self.deadline {
            return Poll::Ready(());
        }
        if let Some(timer) = clock.timers.iter_mut().find(|t| t.id == self.id)
        {
            timer.waker = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl Drop for VirtualSleep {
    fn drop(&mut self) {
        let id = self.id;
        self.clock.lock().timers.retain(|timer| timer.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn virtual_sleep_completes_after_advance() {
        let provider = VirtualTimeProvider::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let sleep = provider.sleep(Duration::from_secs(5));
        let counter_clone = Arc::clone(&counter);
        let handle = tokio::spawn(async move {
            sleep.await;
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(provider.pending_timers(), 1);

        provider.advance(Duration::from_secs(5));
        handle.await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(provider.pending_timers(), 0);
    }

    #[tokio::test]
    async fn advance_to_next_timer_steps_to_earliest() {
        let provider = VirtualTimeProvider::new();
        let _long = provider.sleep(Duration::from_secs(10));
        let _short = provider.sleep(Duration::from_secs(5));

        assert_eq!(
            provider.pending_deadlines(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
        assert_eq!(
            provider.advance_to_next_timer(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(provider.pending_timers(), 1);
    }

    #[test]
    fn dropped_sleep_unregisters() {
        let provider = VirtualTimeProvider::new();
        let sleep = provider.sleep(Duration::from_millis(100));
        assert_eq!(provider.pending_timers(), 1);
        drop(sleep);
        assert_eq!(provider.pending_timers(), 0);
    }
}
