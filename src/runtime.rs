use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tracing::debug;

/// What the app loop reacts to
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// Time to refresh the HUD
    Tick,
}

/// Anything that can feed [`AppEvent`]s to the [`Runner`]
pub trait AppEventSource: Send + 'static {
    /// Waits at most `timeout` for the next event
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || forward_terminal_events(&tx));
        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

// Runs until the terminal read fails or the receiving side is gone
fn forward_terminal_events(tx: &Sender<AppEvent>) {
    loop {
        let app_event = match event::read() {
            // some terminals report releases, which would type every key twice
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Release => continue,
            Ok(Event::Key(key)) => AppEvent::Key(key),
            Ok(Event::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "terminal event reader stopped");
                return;
            }
        };

        if tx.send(app_event).is_err() {
            return;
        }
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How often the HUD is refreshed
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Scripted events for headless runs
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    /// A source together with the sender that scripts it
    pub fn channel() -> (Sender<AppEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Merges an event source with a HUD ticker, one event per [`Runner::step`].
///
/// Ticks are due once per interval even while keys keep arriving, so the
/// HUD keeps refreshing during fast typing.
pub struct Runner<E: AppEventSource, T: Ticker> {
    source: E,
    ticker: T,
    last_tick: Instant,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(source: E, ticker: T) -> Self {
        Self {
            source,
            ticker,
            last_tick: Instant::now(),
        }
    }

    /// Blocks until the next event or until the tick is due, whichever
    /// comes first
    pub fn step(&mut self) -> AppEvent {
        let due_in = self
            .ticker
            .interval()
            .saturating_sub(self.last_tick.elapsed());

        if !due_in.is_zero() {
            if let Ok(ev) = self.source.recv_timeout(due_in) {
                return ev;
            }
        }

        self.last_tick = Instant::now();
        AppEvent::Tick
    }
}
