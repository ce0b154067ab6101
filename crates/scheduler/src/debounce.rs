//! Generation-checked debouncing
//!
//! Collapses bursts of change notifications into one delayed trigger

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Generation value meaning "nothing scheduled"
pub const NEUTRAL_GENERATION: u64 = 0;

/// Delay used when none is configured
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

type Action = Arc<dyn Fn() + Send + Sync>;

/// Counters describing what a [`DebouncedTask`] has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceStats {
    /// Calls to `notify_change`
    pub notified: u64,
    /// Triggers fired after the delay (or by `flush`)
    pub fired: u64,
    /// Scheduled triggers replaced by a later notification or cancelled
    pub superseded: u64,
    /// Triggers fired through `fire_now`
    pub immediate: u64,
}

#[derive(Default)]
struct Counters {
    notified: AtomicU64,
    fired: AtomicU64,
    superseded: AtomicU64,
    immediate: AtomicU64,
}

/// A debounced action with its own generation counter and timer
///
/// Every `notify_change` bumps the generation and arms a timer that captured
/// the new value. When the timer expires it fires the action only if the
/// generation still equals the captured value, resetting it to
/// [`NEUTRAL_GENERATION`]. A burst of notifications closer together than the
/// delay therefore fires exactly once, `delay` after the last of them.
///
/// At most one timer is alive at a time: arming a new one aborts the previous
/// timer, which the generation check would have dropped anyway.
pub struct DebouncedTask {
    /// Quiet period required before firing
    delay: Duration,

    /// Current generation, shared with the armed timer
    generation: Arc<AtomicU64>,

    /// Action run when a trigger fires
    action: Action,

    /// Runtime the timers are spawned on
    runtime: Handle,

    /// Latest armed timer; its lock also serializes generation updates
    pending: Mutex<Option<JoinHandle<()>>>,

    stats: Arc<Counters>,
}

impl DebouncedTask {
    /// Create a debounced action on the current tokio runtime
    pub fn new<F>(delay: Duration, action: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Handle::try_current()
            .context("Debounced task must be created inside a tokio runtime")?;
        Ok(Self::with_handle(delay, runtime, action))
    }

    /// Create a debounced action whose timers run on `runtime`
    pub fn with_handle<F>(delay: Duration, runtime: Handle, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(NEUTRAL_GENERATION)),
            action: Arc::new(action),
            runtime,
            pending: Mutex::new(None),
            stats: Arc::new(Counters::default()),
        }
    }

    /// Record a change and (re)arm the trigger
    ///
    /// Returns the generation captured by the armed timer.
    pub fn notify_change(&self) -> u64 {
        let mut pending = self.pending.lock();

        // A non-neutral previous value means the armed timer has not fired, and
        // the bump below guarantees it never will
        let previous = self.generation.fetch_add(1, Ordering::SeqCst);
        let captured = previous + 1;
        self.stats.notified.fetch_add(1, Ordering::Relaxed);
        if previous != NEUTRAL_GENERATION {
            self.stats.superseded.fetch_add(1, Ordering::Relaxed);
        }

        let generation = Arc::clone(&self.generation);
        let action = Arc::clone(&self.action);
        let stats = Arc::clone(&self.stats);
        let delay = self.delay;

        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            if generation
                .compare_exchange(
                    captured,
                    NEUTRAL_GENERATION,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                debug!("Debounce trigger fired (generation {})", captured);
                stats.fired.fetch_add(1, Ordering::Relaxed);
                action();
            } else {
                trace!("Debounce trigger {} superseded", captured);
            }
        });

        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }

        trace!("Armed debounce trigger (generation {}, delay {:?})", captured, delay);
        captured
    }

    /// Run the action right away, bypassing the delay
    ///
    /// The generation is left untouched, so an armed trigger still fires.
    pub fn fire_now(&self) {
        self.stats.immediate.fetch_add(1, Ordering::Relaxed);
        debug!("Firing immediately");
        (self.action)();
    }

    /// Fire an armed trigger now instead of waiting for its delay
    ///
    /// Returns `false` if nothing was armed.
    pub fn flush(&self) -> bool {
        if !self.disarm() {
            return false;
        }

        self.stats.fired.fetch_add(1, Ordering::Relaxed);
        debug!("Flushed pending debounce trigger");
        (self.action)();
        true
    }

    /// Drop an armed trigger without firing it
    ///
    /// Returns `false` if nothing was armed.
    pub fn cancel(&self) -> bool {
        let cancelled = self.disarm();
        if cancelled {
            self.stats.superseded.fetch_add(1, Ordering::Relaxed);
            debug!("Cancelled pending debounce trigger");
        }
        cancelled
    }

    /// Whether a trigger is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != NEUTRAL_GENERATION
    }

    /// Current generation value
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn stats(&self) -> DebounceStats {
        DebounceStats {
            notified: self.stats.notified.load(Ordering::Relaxed),
            fired: self.stats.fired.load(Ordering::Relaxed),
            superseded: self.stats.superseded.load(Ordering::Relaxed),
            immediate: self.stats.immediate.load(Ordering::Relaxed),
        }
    }

    /// Reset the generation and abort the armed timer
    ///
    /// Competes with the timer on the same compare-exchange, so exactly one
    /// of them wins an armed generation.
    fn disarm(&self) -> bool {
        let mut pending = self.pending.lock();

        let current = self.generation.load(Ordering::SeqCst);
        if current == NEUTRAL_GENERATION {
            return false;
        }

        if self
            .generation
            .compare_exchange(
                current,
                NEUTRAL_GENERATION,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return false;
        }

        if let Some(timer) = pending.take() {
            timer.abort();
        }
        true
    }
}

impl Drop for DebouncedTask {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().take() {
            timer.abort();
        }
    }
}
