use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEventKind};
#[cfg(unix)]
use signal_hook::{
    consts::{SIGHUP, SIGINT, SIGTERM},
    iterator::{Handle, Signals},
};
use thiserror::Error;
#[cfg(unix)]
use tracing::warn;
use tracing::{error, trace};

#[cfg(unix)]
use crate::keymap::Command;
use crate::timer::{TickSink, TimerSignal};
use crate::typing_test::TestEvent;

/// What travels over the single event queue.
#[derive(Debug)]
pub enum QueueEvent {
    Test(TestEvent),
    /// The terminal stopped producing input.
    InputFailed(io::Error),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("terminal input failed: {0}")]
    Input(#[from] io::Error),
    #[error("event queue disconnected")]
    Disconnected,
}

/// Sending half of the queue, handed to every producer.
#[derive(Clone, Debug)]
pub struct QueueSender {
    tx: Sender<QueueEvent>,
}

impl QueueSender {
    pub fn send(&self, event: TestEvent) -> bool {
        self.tx.send(QueueEvent::Test(event)).is_ok()
    }

    pub fn tick_sink(&self) -> Arc<dyn TickSink> {
        Arc::new(self.clone())
    }
}

impl TickSink for QueueSender {
    fn deliver(&self, signal: TimerSignal) -> bool {
        self.send(TestEvent::Timer(signal))
    }
}

/// The queue every event source feeds and the runner drains.
pub fn event_queue() -> (QueueSender, Receiver<QueueEvent>) {
    let (tx, rx) = mpsc::channel();
    (QueueSender { tx }, rx)
}

/// Source of queued events (keyboard, resize, timer).
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QueueEvent, RecvTimeoutError>;
}

/// Production event source: a crossterm reader thread feeding the queue.
pub struct CrosstermEventSource {
    rx: Receiver<QueueEvent>,
}

impl CrosstermEventSource {
    pub fn new(sender: QueueSender, rx: Receiver<QueueEvent>) -> Self {
        let tx = sender.tx;

        thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    QueueEvent::Test(TestEvent::Key(key))
                }
                Ok(CtEvent::Resize(w, h)) => QueueEvent::Test(TestEvent::Resize(w, h)),
                Ok(_) => continue,
                Err(e) => {
                    error!(error = %e, "terminal read failed");
                    let _ = tx.send(QueueEvent::InputFailed(e));
                    break;
                }
            };

            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QueueEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Turns termination signals into quit commands on the queue, so they take
/// the same path as the quit key. Raw mode disables the terminal's own
/// ctrl+c handling, which leaves these as the only way an outside SIGINT
/// reaches the loop.
#[cfg(unix)]
#[derive(Debug)]
pub struct SignalForwarder {
    handle: Handle,
    thread: Option<thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalForwarder {
    pub fn spawn(sender: QueueSender) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = thread::spawn(move || {
            for signal in signals.forever() {
                warn!(signal, "termination signal received");
                if !sender.send(TestEvent::Command(Command::Quit)) {
                    break;
                }
            }
        });

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalForwarder {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<QueueEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QueueEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QueueEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls events off the queue one at a time.
pub struct Runner<E: EventSource> {
    event_source: E,
    poll_interval: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, poll_interval: Duration) -> Self {
        Self {
            event_source,
            poll_interval,
        }
    }

    /// Blocks up to the poll interval; `Ok(None)` when nothing arrived.
    pub fn step(&self) -> Result<Option<TestEvent>, RuntimeError> {
        self.step_for(self.poll_interval)
    }

    /// Like [`Runner::step`] but with an explicit wait.
    pub fn step_for(&self, timeout: Duration) -> Result<Option<TestEvent>, RuntimeError> {
        match self.event_source.recv_timeout(timeout) {
            Ok(QueueEvent::Test(ev)) => {
                trace!(event = ?ev, "dequeued");
                Ok(Some(ev))
            }
            Ok(QueueEvent::InputFailed(e)) => Err(RuntimeError::Input(e)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(RuntimeError::Disconnected),
        }
    }
}

/// Coalesces state changes into frames at most one `interval` apart.
///
/// Timer ticks arrive much faster than a terminal is worth redrawing, so
/// the loop marks the view dirty per event and only draws when a frame is
/// due.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    idle_wait: Duration,
    last_frame: Option<Instant>,
    dirty: bool,
}

impl FramePacer {
    /// `idle_wait` bounds how long the loop blocks when nothing needs drawing.
    pub fn new(interval: Duration, idle_wait: Duration) -> Self {
        Self {
            interval,
            idle_wait,
            last_frame: None,
            dirty: true,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn should_draw(&self, now: Instant) -> bool {
        self.dirty
            && self
                .last_frame
                .map_or(true, |at| now.duration_since(at) >= self.interval)
    }

    pub fn drawn(&mut self, now: Instant) {
        self.last_frame = Some(now);
        self.dirty = false;
    }

    /// How long the loop may wait for the next event before a frame is due.
    pub fn wait(&self, now: Instant) -> Duration {
        if !self.dirty {
            return self.idle_wait;
        }
        self.last_frame.map_or(Duration::ZERO, |at| {
            self.interval.saturating_sub(now.duration_since(at))
        })
    }
}
