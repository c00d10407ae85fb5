//! # Render Thread
//!
//! One named OS thread owns every attached plugin instance and ticks them
//! serially, once per frame. Other threads talk to it only through a command
//! channel.
//!
//! ```text
//!   control thread                         render thread
//!   ──────────────                         ─────────────
//!   attach(instance) ──Attach──┐
//!   inspect(f)       ──Inspect─┼──► recv_deadline(next_frame)
//!   tick_now()       ──Tick────┤      ├── command  ─► handle, keep waiting
//!   stop()           ──Stop────┘      └── deadline ─► tick every plugin
//!
//!   producers ──Updater<T>::update──► UpdateGate (never through the channel)
//! ```
//!
//! Commands are handled between tick passes, so an `Inspect` closure always
//! sees fully finalized artifacts. Once a frame is due it runs before the next
//! queued command, so a busy control thread cannot starve the tick.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use vizsync_core::{PluginCore, PluginInstance, TickOutcome, Tickable};

use crate::config::RenderThreadConfig;
use crate::error::{HostError, HostResult};

/// Closure run on the render thread against the attached plugins.
type InspectFn = Box<dyn FnOnce(&mut [Box<dyn Tickable>]) + Send>;

enum Command {
    Attach(Box<dyn Tickable>),
    Inspect(InspectFn),
    Tick(Sender<TickStats>),
    Stop,
}

/// Counters of a render thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tick passes over all plugins.
    pub frames: u64,
    /// Plugin ticks, busy and idle.
    pub ticks: u64,
    /// Plugin ticks that found their gate dirty.
    pub busy_ticks: u64,
    /// Plugin ticks that found nothing to do.
    pub idle_ticks: u64,
    /// Merge hooks invoked.
    pub merges: u64,
    /// Longest single plugin tick (microseconds).
    pub worst_tick_us: u64,
    /// Plugin ticks over the slow-tick budget.
    pub slow_ticks: u64,
}

impl TickStats {
    fn record(&mut self, outcome: TickOutcome, elapsed: Duration, budget: Duration) -> bool {
        self.ticks += 1;
        match outcome {
            TickOutcome::Idle => self.idle_ticks += 1,
            TickOutcome::Updated { merged } => {
                self.busy_ticks += 1;
                self.merges += merged as u64;
            }
        }
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.worst_tick_us = self.worst_tick_us.max(us);
        let slow = elapsed > budget;
        if slow {
            self.slow_ticks += 1;
        }
        slow
    }
}

/// Handle to a running render thread.
///
/// Dropping the handle stops the thread and joins it.
pub struct RenderThread {
    commands: Sender<Command>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<Mutex<TickStats>>,
    name: String,
}

impl RenderThread {
    /// Starts a render thread with no plugin attached.
    ///
    /// # Errors
    ///
    /// - [`HostError::Config`] if `config` fails validation
    /// - [`HostError::Spawn`] if the OS cannot start the thread
    pub fn spawn(config: RenderThreadConfig) -> HostResult<Self> {
        config.validate()?;

        let (commands, receiver) = unbounded();
        let stats = Arc::new(Mutex::new(TickStats::default()));
        let name = config.thread_name.clone();

        let thread_stats = Arc::clone(&stats);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Consumer::new(config, thread_stats).run(&receiver))
            .map_err(HostError::Spawn)?;

        Ok(Self {
            commands,
            handle: Some(handle),
            stats,
            name,
        })
    }

    /// Hands a plugin instance over to the render thread.
    ///
    /// Take [`Updater`](vizsync_core::Updater)s and the adapter registry from
    /// the instance before attaching it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AlreadyStopped`] if the thread is gone.
    pub fn attach<P: PluginCore>(&self, instance: PluginInstance<P>) -> HostResult<()> {
        self.attach_boxed(Box::new(instance))
    }

    /// Hands an already type-erased instance over to the render thread.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AlreadyStopped`] if the thread is gone.
    pub fn attach_boxed(&self, instance: Box<dyn Tickable>) -> HostResult<()> {
        self.send(Command::Attach(instance))
    }

    /// Runs `f` on the render thread between two tick passes and returns its
    /// result. Blocks until `f` has run.
    ///
    /// # Errors
    ///
    /// - [`HostError::AlreadyStopped`] if the thread is gone
    /// - [`HostError::ThreadPanicked`] if the thread died before replying
    pub fn inspect<R, F>(&self, f: F) -> HostResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut [Box<dyn Tickable>]) -> R + Send + 'static,
    {
        let (reply, result) = bounded(1);
        self.send(Command::Inspect(Box::new(move |plugins: &mut [Box<dyn Tickable>]| {
            let _ = reply.send(f(plugins));
        })))?;
        result.recv().map_err(|_| HostError::ThreadPanicked)
    }

    /// Runs one tick pass immediately, outside the frame schedule, and
    /// returns the counters after it.
    ///
    /// # Errors
    ///
    /// - [`HostError::AlreadyStopped`] if the thread is gone
    /// - [`HostError::ThreadPanicked`] if the thread died before replying
    pub fn tick_now(&self) -> HostResult<TickStats> {
        let (reply, result) = bounded(1);
        self.send(Command::Tick(reply))?;
        result.recv().map_err(|_| HostError::ThreadPanicked)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> TickStats {
        *self.stats.lock()
    }

    /// Name of the render thread.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true until [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the thread, joins it and returns the final counters.
    ///
    /// Attached plugin instances are dropped on the render thread.
    ///
    /// # Errors
    ///
    /// - [`HostError::AlreadyStopped`] on a second call
    /// - [`HostError::ThreadPanicked`] if the thread died abnormally
    pub fn stop(&mut self) -> HostResult<TickStats> {
        let handle = self.handle.take().ok_or(HostError::AlreadyStopped)?;
        let _ = self.commands.send(Command::Stop);
        handle.join().map_err(|_| HostError::ThreadPanicked)?;
        Ok(self.stats())
    }

    fn send(&self, command: Command) -> HostResult<()> {
        if self.handle.is_none() {
            return Err(HostError::AlreadyStopped);
        }
        self.commands.send(command).map_err(|_| HostError::AlreadyStopped)
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::Stop);
            if handle.join().is_err() {
                tracing::error!(thread = %self.name, "render thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for RenderThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderThread")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

/// State living on the render thread.
struct Consumer {
    config: RenderThreadConfig,
    plugins: Vec<Box<dyn Tickable>>,
    stats: Arc<Mutex<TickStats>>,
}

impl Consumer {
    fn new(config: RenderThreadConfig, stats: Arc<Mutex<TickStats>>) -> Self {
        Self {
            config,
            plugins: Vec::new(),
            stats,
        }
    }

    fn run(mut self, commands: &Receiver<Command>) {
        let period = self.config.frame_period();
        tracing::info!(
            thread = %self.config.thread_name,
            fps = self.config.target_fps,
            "render thread started"
        );

        let mut next_frame = Instant::now() + period;
        loop {
            // A due frame goes ahead of queued commands.
            let received = if Instant::now() >= next_frame {
                Err(RecvTimeoutError::Timeout)
            } else {
                commands.recv_deadline(next_frame)
            };
            match received {
                Ok(Command::Attach(plugin)) => {
                    tracing::debug!(plugin = plugin.name(), "plugin attached");
                    self.plugins.push(plugin);
                }
                Ok(Command::Inspect(f)) => f(self.plugins.as_mut_slice()),
                Ok(Command::Tick(reply)) => {
                    self.frame();
                    let _ = reply.send(*self.stats.lock());
                }
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    self.frame();
                    next_frame += period;
                    let now = Instant::now();
                    if next_frame < now {
                        // Missed frames are dropped, not replayed.
                        next_frame = now + period;
                    }
                }
            }
        }

        let stats = *self.stats.lock();
        tracing::info!(
            thread = %self.config.thread_name,
            plugins = self.plugins.len(),
            frames = stats.frames,
            busy_ticks = stats.busy_ticks,
            merges = stats.merges,
            "render thread stopped"
        );
    }

    /// One tick pass over every plugin, in attach order.
    fn frame(&mut self) {
        let budget = self.config.slow_tick_budget();
        let mut stats = *self.stats.lock();
        stats.frames += 1;

        for plugin in &mut self.plugins {
            let start = Instant::now();
            let outcome = plugin.tick();
            let elapsed = start.elapsed();

            if stats.record(outcome, elapsed, budget) && self.config.log_slow_ticks {
                tracing::warn!(
                    plugin = plugin.name(),
                    elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                    budget_us = self.config.slow_tick_budget_us,
                    "slow tick"
                );
            }
        }

        *self.stats.lock() = stats;
    }
}
