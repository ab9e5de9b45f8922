use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

/// Identifies one countdown. Every start gets a fresh id so signals from a
/// countdown that was reset or replaced can be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerSignal {
    Tick { id: TimerId, remaining: Duration },
    Timeout { id: TimerId },
}

impl TimerSignal {
    pub fn id(&self) -> TimerId {
        match self {
            TimerSignal::Tick { id, .. } | TimerSignal::Timeout { id } => *id,
        }
    }
}

/// Where a running countdown delivers its signals.
pub trait TickSink: Send + Sync + 'static {
    /// Returns false once the receiving side is gone.
    fn deliver(&self, signal: TimerSignal) -> bool;
}

impl TickSink for std::sync::mpsc::Sender<TimerSignal> {
    fn deliver(&self, signal: TimerSignal) -> bool {
        self.send(signal).is_ok()
    }
}

/// Handle to the background task producing ticks for one countdown.
/// Cancelling (or dropping) it stops any further signals from that task.
#[derive(Debug)]
pub struct TickTask {
    cancelled: Arc<AtomicBool>,
}

impl TickTask {
    fn spawn(
        sink: Arc<dyn TickSink>,
        id: TimerId,
        duration: Duration,
        interval: Duration,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || {
            let started_at = Instant::now();
            loop {
                thread::sleep(interval);
                if flag.load(Ordering::Acquire) {
                    return;
                }

                let elapsed = started_at.elapsed();
                if elapsed >= duration {
                    sink.deliver(TimerSignal::Timeout { id });
                    return;
                }

                let remaining = duration - elapsed;
                if !sink.deliver(TimerSignal::Tick { id, remaining }) {
                    return;
                }
            }
        });

        Self { cancelled }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl Drop for TickTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    pub remaining: Duration,
    pub expired: bool,
}

#[derive(Debug)]
enum Countdown {
    Stopped,
    Running { id: TimerId },
}

/// Countdown for a single test.
///
/// With a sink attached, `start` spawns a [`TickTask`] that feeds signals
/// back through the sink; without one the timer only advances through
/// signals handed to [`TestTimer::on_signal`].
pub struct TestTimer {
    duration: Duration,
    interval: Duration,
    remaining: Duration,
    countdown: Countdown,
    next_id: u64,
    sink: Option<Arc<dyn TickSink>>,
    task: Option<TickTask>,
}

impl std::fmt::Debug for TestTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestTimer")
            .field("duration", &self.duration)
            .field("interval", &self.interval)
            .field("remaining", &self.remaining)
            .field("countdown", &self.countdown)
            .field("scheduled", &self.sink.is_some())
            .finish()
    }
}

impl TestTimer {
    pub fn new(duration: Duration, interval: Duration) -> Self {
        Self {
            duration,
            interval,
            remaining: duration,
            countdown: Countdown::Stopped,
            next_id: 0,
            sink: None,
            task: None,
        }
    }

    pub fn with_sink(duration: Duration, interval: Duration, sink: Arc<dyn TickSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new(duration, interval)
        }
    }

    /// Starts a fresh countdown, replacing any that is live.
    pub fn start(&mut self) -> TimerId {
        self.cancel_task();

        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.remaining = self.duration;
        self.countdown = Countdown::Running { id };

        if let Some(sink) = &self.sink {
            self.task = Some(TickTask::spawn(
                Arc::clone(sink),
                id,
                self.duration,
                self.interval,
            ));
        }

        id
    }

    /// Stops the countdown and restores the full duration without restarting.
    pub fn reset(&mut self) {
        self.cancel_task();
        self.countdown = Countdown::Stopped;
        self.remaining = self.duration;
    }

    /// Applies a signal from the scheduled task. Signals that do not belong
    /// to the live countdown are dropped and yield `None`.
    pub fn on_signal(&mut self, signal: TimerSignal) -> Option<TickOutcome> {
        let live = match self.countdown {
            Countdown::Running { id } => id,
            Countdown::Stopped => {
                trace!(?signal, "timer signal while stopped");
                return None;
            }
        };
        if signal.id() != live {
            trace!(?signal, "stale timer signal");
            return None;
        }

        match signal {
            TimerSignal::Tick { remaining, .. } => {
                self.remaining = remaining.min(self.duration);
                Some(TickOutcome {
                    remaining: self.remaining,
                    expired: false,
                })
            }
            TimerSignal::Timeout { .. } => {
                self.task = None;
                self.countdown = Countdown::Stopped;
                self.remaining = Duration::ZERO;
                Some(TickOutcome {
                    remaining: Duration::ZERO,
                    expired: true,
                })
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.countdown, Countdown::Running { .. })
    }

    /// Id of the live countdown, if any.
    pub fn current_id(&self) -> Option<TimerId> {
        match self.countdown {
            Countdown::Running { id } => Some(id),
            Countdown::Stopped => None,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn elapsed(&self) -> Duration {
        self.duration.saturating_sub(self.remaining)
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    fn manual_timer() -> TestTimer {
        TestTimer::new(Duration::from_secs(5), Duration::from_millis(1))
    }

    #[test]
    fn test_new_timer_is_stopped_with_full_duration() {
        let timer = manual_timer();
        assert!(!timer.is_running());
        assert_eq!(timer.remaining(), Duration::from_secs(5));
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert_eq!(timer.current_id(), None);
    }

    #[test]
    fn test_tick_updates_remaining() {
        let mut timer = manual_timer();
        let id = timer.start();

        let outcome = timer.on_signal(TimerSignal::Tick {
            id,
            remaining: Duration::from_millis(3200),
        });

        assert_eq!(
            outcome,
            Some(TickOutcome {
                remaining: Duration::from_millis(3200),
                expired: false
            })
        );
        assert_eq!(timer.elapsed(), Duration::from_millis(1800));
    }

    #[test]
    fn test_timeout_expires_exactly_once() {
        let mut timer = manual_timer();
        let id = timer.start();

        assert_matches!(
            timer.on_signal(TimerSignal::Timeout { id }),
            Some(TickOutcome { expired: true, .. })
        );
        assert!(!timer.is_running());
        assert_eq!(timer.remaining(), Duration::ZERO);

        assert_eq!(timer.on_signal(TimerSignal::Timeout { id }), None);
    }

    #[test]
    fn test_reset_restores_duration_and_stops() {
        let mut timer = manual_timer();
        let id = timer.start();
        timer.on_signal(TimerSignal::Tick {
            id,
            remaining: Duration::from_secs(1),
        });

        timer.reset();

        assert!(!timer.is_running());
        assert_eq!(timer.remaining(), Duration::from_secs(5));
        assert_eq!(timer.on_signal(TimerSignal::Timeout { id }), None);
    }

    #[test]
    fn test_restart_invalidates_previous_countdown() {
        let mut timer = manual_timer();
        let first = timer.start();
        let second = timer.start();

        assert_ne!(first, second);
        assert_eq!(timer.on_signal(TimerSignal::Timeout { id: first }), None);
        assert!(timer.is_running());
        assert_matches!(
            timer.on_signal(TimerSignal::Timeout { id: second }),
            Some(TickOutcome { expired: true, .. })
        );
    }

    #[test]
    fn test_scheduled_task_delivers_ticks_then_timeout() {
        let (tx, rx) = mpsc::channel();
        let mut timer = TestTimer::with_sink(
            Duration::from_millis(40),
            Duration::from_millis(5),
            Arc::new(tx),
        );
        let id = timer.start();

        let mut ticks = 0;
        loop {
            match rx.recv_timeout(Duration::from_secs(2)).unwrap() {
                TimerSignal::Tick { id: tick_id, .. } => {
                    assert_eq!(tick_id, id);
                    ticks += 1;
                }
                TimerSignal::Timeout { id: timeout_id } => {
                    assert_eq!(timeout_id, id);
                    break;
                }
            }
        }

        assert!(ticks > 0);
        // the task ends after its timeout
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_reset_cancels_scheduled_task() {
        let (tx, rx) = mpsc::channel();
        let mut timer = TestTimer::with_sink(
            Duration::from_millis(50),
            Duration::from_millis(5),
            Arc::new(tx),
        );
        let id = timer.start();
        timer.reset();

        // allow the task to observe the cancellation
        std::thread::sleep(Duration::from_millis(100));
        let delivered: Vec<TimerSignal> = rx.try_iter().collect();
        assert!(!delivered.contains(&TimerSignal::Timeout { id }));
    }
}
