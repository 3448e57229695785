//! Poll timer: an owned, named, restartable interval task.
//!
//! Both polling loops (schedule dispatch and water monitor) run on one of
//! these.  The timer is decoupled from what it drives: it just invokes a
//! job closure on every tick and awaits it before waiting for the next.
//!
//! ```text
//!   start() ──▶ tick (immediate) ──▶ job().await ──▶ tick (+period) ──▶ job().await ──▶ …
//!   stop()  ──▶ signal loop ──▶ job in flight runs to completion ──▶ loop exits
//! ```
//!
//! Jobs run on the current thread via [`tokio::task::spawn_local`], so
//! [`PollTimer::start`] must be called inside a [`tokio::task::LocalSet`].
//! A job is never re-entered: a slow job delays the next tick, and ticks
//! missed meanwhile are skipped rather than bunched.  A job is never
//! cancelled by the timer either; only the wait between jobs is.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest accepted period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to one started loop.
struct Running {
    task: JoinHandle<()>,
    stop: Rc<Notify>,
}

pub struct PollTimer {
    name: &'static str,
    period: Duration,
    running: Option<Running>,
}

impl PollTimer {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period: period.max(MIN_PERIOD),
            running: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking.  Runs `job` once immediately, then every period.
    ///
    /// Returns `false` (and does nothing) if the timer is already running.
    pub fn start<F, Fut>(&mut self, mut job: F) -> bool
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        if self.is_running() {
            debug!("PollTimer '{}': already running", self.name);
            return false;
        }

        let period = self.period;
        let name = self.name;
        let stop = Rc::new(Notify::new());
        let stop_signal = stop.clone();
        let task = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    () = stop_signal.notified() => break,
                    _ = ticker.tick() => {}
                }
                debug!("PollTimer '{}': tick", name);
                job().await;
            }
            debug!("PollTimer '{}': loop exited", name);
        });
        self.running = Some(Running { task, stop });
        info!("PollTimer '{}': started (every {:?})", self.name, self.period);
        true
    }

    /// Stop ticking.  Returns `false` if the timer was not running.
    ///
    /// A job in flight is left to finish; no further job is started.
    pub fn stop(&mut self) -> bool {
        match self.running.take() {
            Some(running) => {
                // Stores a permit if the loop is busy in a job.
                running.stop.notify_one();
                info!("PollTimer '{}': stopped", self.name);
                true
            }
            None => false,
        }
    }

    /// Stop ticking and wait for the job in flight, if any, to finish.
    /// Returns `false` if the timer was not running.
    pub async fn drain(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };
        running.stop.notify_one();
        if let Err(e) = running.task.await {
            warn!("PollTimer '{}': loop ended abnormally ({})", self.name, e);
        }
        info!("PollTimer '{}': drained", self.name);
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.task.is_finished())
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop.notify_one();
        }
    }
}
