/* src/kernel.rs */
//! # Speculative Kernel
//!
//! Owns the arena table, the run flag and the worker registry.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──run()──▶ Running ──interrupt()──▶ Paused ──resume()──▶ Running
//!    │                  │                       │
//!    └──────────────────┴───────stop()──────────┴──▶ Stopped (terminal)
//! ```
//!
//! The run flag starts set, so workers spawned before `run()` make progress.
//! `run()` is a polling health monitor: the first worker found no longer
//! executing (panicked or returned) is logged and the kernel is interrupted.
//! It never restarts anything; [`SpeculativeKernel::respawn_exited`] is the
//! separate, explicit restart path.
//!
//! ## Locking
//!
//! The arena table sits behind one mutex held for exactly one table operation.
//! The worker registry has its own mutex; when both are needed the registry is
//! taken first. The run flag and lifecycle state change together under a
//! small control lock, so `state()` and `is_running()` never disagree.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use std::{
    any::Any,
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use hashbrown::HashMap as FastMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::metrics::{Counter, Gauge};
use crate::state_vector::{Snapshot, StateVector};

/// Identifier assigned to each spawned worker.
pub type WorkerId = u64;

type ArenaTable = FastMap<String, Vec<Snapshot>, ahash::RandomState>;

type WorkerEntry = Arc<dyn Fn(KernelHandle, String, StateVector) + Send + Sync + 'static>;

type TaskEntry = Arc<dyn Fn(KernelHandle) + Send + Sync + 'static>;

// =====================================================================================
// STATES & STATUS REPORTING
// =====================================================================================

/// Kernel lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelState {
    /// Constructed; monitor not yet started
    Created = 0,
    /// Monitor active, run flag set
    Running = 1,
    /// Run flag cleared by `interrupt()` or crash detection
    Paused = 2,
    /// All workers joined; terminal
    Stopped = 3,
}

impl KernelState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => KernelState::Created,
            1 => KernelState::Running,
            2 => KernelState::Paused,
            _ => KernelState::Stopped,
        }
    }
}

impl fmt::Display for KernelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelState::Created => write!(f, "created"),
            KernelState::Running => write!(f, "running"),
            KernelState::Paused => write!(f, "paused"),
            KernelState::Stopped => write!(f, "stopped"),
        }
    }
}

/// How a worker stopped executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerExit {
    /// Entry point returned normally
    Returned,
    /// Entry point panicked with this message
    Panicked(String),
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Returned => write!(f, "exited without panicking"),
            WorkerExit::Panicked(message) => write!(f, "panicked: {message}"),
        }
    }
}

/// Point-in-time view of one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatus {
    /// Worker id
    pub id: WorkerId,
    /// Thread name
    pub name: String,
    /// Arena the worker publishes into, when spawned through `spawn_worker`
    pub arena: Option<String>,
    /// Whether the worker thread is still executing
    pub alive: bool,
    /// Recorded exit, once observed
    pub exit: Option<WorkerExit>,
    /// Number of supervised restarts
    pub restarts: u32,
    /// Exited without a respawn recipe and no longer monitored
    pub retired: bool,
}

/// Why [`SpeculativeKernel::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunExit {
    /// The run flag was cleared by someone else
    Interrupted,
    /// A worker stopped executing; the kernel interrupted itself
    WorkerCrashed {
        /// Worker name
        worker: String,
        /// Exit description
        reason: String,
    },
}

impl RunExit {
    /// The crash as a [`KernelError::WorkerCrashed`], if there was one.
    pub fn crash(&self) -> Option<KernelError> {
        match self {
            RunExit::Interrupted => None,
            RunExit::WorkerCrashed { worker, reason } => Some(KernelError::WorkerCrashed {
                worker: worker.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Serializable kernel statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelStats {
    /// Lifecycle state
    pub state: KernelState,
    /// Snapshot count per arena
    pub arenas: BTreeMap<String, usize>,
    /// Sum of all arena lengths
    pub total_snapshots: usize,
    /// Allocations appended
    pub accepted_allocations: u64,
    /// Allocations dropped because their arena was missing
    pub rejected_allocations: u64,
    /// Per-worker status
    pub workers: Vec<WorkerStatus>,
    /// Capture time
    pub captured_at: DateTime<Utc>,
}

// =====================================================================================
// SHARED CORE & HANDLE
// =====================================================================================

struct KernelShared {
    config: KernelConfig,
    running: AtomicBool,
    state: AtomicU8,
    // Serializes writers of `running` + `state` so the pair never disagrees.
    control: Mutex<()>,
    arenas: Mutex<ArenaTable>,
    accepted: Counter,
    rejected: Counter,
}

impl KernelShared {
    fn state(&self) -> KernelState {
        KernelState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `next` unless already stopped. Returns false if stopped.
    fn transition(&self, next: KernelState) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != KernelState::Stopped as u8).then_some(next as u8)
            })
            .is_ok()
    }

    /// Clear the run flag and move to `Paused` (no-op on the state once stopped).
    fn pause(&self) {
        let _control = self.control.lock();
        self.running.store(false, Ordering::Release);
        self.transition(KernelState::Paused);
    }

    /// Set the run flag and move to `Running`. Returns false if stopped.
    fn unpause(&self) -> bool {
        let _control = self.control.lock();
        if !self.transition(KernelState::Running) {
            return false;
        }
        self.running.store(true, Ordering::Release);
        true
    }

    /// Enter `Running` if the flag is still set. Returns false if stopped.
    fn start_monitor(&self) -> bool {
        let _control = self.control.lock();
        if self.state() == KernelState::Stopped {
            return false;
        }
        if self.running.load(Ordering::Acquire) {
            self.transition(KernelState::Running);
        }
        true
    }

    /// Clear the run flag and enter the terminal state.
    fn halt(&self) {
        let _control = self.control.lock();
        self.running.store(false, Ordering::Release);
        self.state.store(KernelState::Stopped as u8, Ordering::Release);
    }

    fn create_arena(&self, name: String) {
        let replaced = self.arenas.lock().insert(name.clone(), Vec::new()).is_some();
        if replaced {
            warn!(arena = %name, "Arena recreated; previous snapshots discarded");
        } else {
            debug!(arena = %name, "Arena created");
        }
    }

    fn try_allocate(&self, arena: &str, snapshot: Snapshot) -> Result<usize> {
        let appended = {
            let mut table = self.arenas.lock();
            table.get_mut(arena).map(|snapshots| {
                snapshots.push(snapshot);
                snapshots.len()
            })
        };
        match appended {
            Some(len) => {
                self.accepted.increment(1);
                Ok(len)
            }
            None => {
                self.rejected.increment(1);
                Err(KernelError::ArenaNotFound(arena.to_string()))
            }
        }
    }

    fn last_snapshot(&self, arena: &str) -> Option<Snapshot> {
        self.arenas.lock().get(arena).and_then(|snapshots| snapshots.last().cloned())
    }
}

/// Cheap, cloneable view of the kernel handed to worker entry points.
#[derive(Clone)]
pub struct KernelHandle {
    shared: Arc<KernelShared>,
}

impl KernelHandle {
    /// Whether workers should keep making progress.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Kernel configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.shared.config
    }

    /// Create (or reset) an arena.
    pub fn create_arena(&self, name: impl Into<String>) {
        self.shared.create_arena(name.into());
    }

    /// Append a snapshot, returning the arena's new length.
    pub fn try_allocate(&self, arena: &str, snapshot: Snapshot) -> Result<usize> {
        self.shared.try_allocate(arena, snapshot)
    }

    /// Append a snapshot; a missing arena is logged and ignored.
    ///
    /// Returns whether the snapshot was stored.
    pub fn allocate(&self, arena: &str, snapshot: Snapshot) -> bool {
        match self.shared.try_allocate(arena, snapshot) {
            Ok(_) => true,
            Err(err) => {
                error!(arena, error = %err, "Allocation rejected");
                false
            }
        }
    }
}

impl fmt::Debug for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelHandle")
            .field("running", &self.is_running())
            .field("state", &self.shared.state())
            .finish()
    }
}

// =====================================================================================
// WORKER REGISTRY
// =====================================================================================

/// How an exited worker is started again by `respawn_exited`.
enum Recipe {
    /// Restart from the arena's last snapshot, else from `initial`
    Worker {
        arena: String,
        initial: StateVector,
        entry: WorkerEntry,
    },
    /// Relaunch the same closure; it carries its own state
    Task { entry: TaskEntry },
}

struct WorkerSlot {
    id: WorkerId,
    name: String,
    arena: Option<String>,
    handle: Option<JoinHandle<()>>,
    exit: Option<WorkerExit>,
    restarts: u32,
    retired: bool,
    recipe: Option<Recipe>,
}

impl WorkerSlot {
    fn task(id: WorkerId, name: String, handle: JoinHandle<()>, recipe: Option<Recipe>) -> Self {
        Self {
            id,
            name,
            arena: None,
            handle: Some(handle),
            exit: None,
            restarts: 0,
            retired: false,
            recipe,
        }
    }

    fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Join a finished thread (if not already joined) and return its exit.
    fn reap(&mut self) -> WorkerExit {
        if let Some(handle) = self.handle.take() {
            self.exit = Some(join_worker(handle));
        }
        self.exit.clone().unwrap_or(WorkerExit::Returned)
    }

    fn status(&self) -> WorkerStatus {
        WorkerStatus {
            id: self.id,
            name: self.name.clone(),
            arena: self.arena.clone(),
            alive: self.is_alive(),
            exit: self.exit.clone(),
            restarts: self.restarts,
            retired: self.retired,
        }
    }
}

fn join_worker(handle: JoinHandle<()>) -> WorkerExit {
    match handle.join() {
        Ok(()) => WorkerExit::Returned,
        Err(payload) => WorkerExit::Panicked(panic_message(&*payload)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =====================================================================================
// SPECULATIVE KERNEL
// =====================================================================================

/// Concurrency controller for workers evolving state into named arenas.
pub struct SpeculativeKernel {
    shared: Arc<KernelShared>,
    workers: Mutex<Vec<WorkerSlot>>,
    next_worker_id: AtomicU64,
    live_workers: Gauge,
}

impl SpeculativeKernel {
    /// Create a kernel. The run flag starts set.
    pub fn new(config: KernelConfig) -> Self {
        let shared = Arc::new(KernelShared {
            config,
            running: AtomicBool::new(true),
            state: AtomicU8::new(KernelState::Created as u8),
            control: Mutex::new(()),
            arenas: Mutex::new(ArenaTable::with_hasher(ahash::RandomState::new())),
            accepted: Counter::new("arena_allocations_accepted"),
            rejected: Counter::new("arena_allocations_rejected"),
        });
        Self {
            shared,
            workers: Mutex::new(Vec::new()),
            next_worker_id: AtomicU64::new(1),
            live_workers: Gauge::new("kernel_live_workers"),
        }
    }

    /// Create a kernel with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(KernelConfig::default())
    }

    /// Handle for worker entry points.
    pub fn handle(&self) -> KernelHandle {
        KernelHandle { shared: Arc::clone(&self.shared) }
    }

    /// Kernel configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.shared.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> KernelState {
        self.shared.state()
    }

    /// Whether the run flag is set.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    // ---------------------------------------------------------------------------------
    // Arena table
    // ---------------------------------------------------------------------------------

    /// Insert an empty arena under `name`, replacing any existing one.
    pub fn create_arena(&self, name: impl Into<String>) {
        self.shared.create_arena(name.into());
    }

    /// Append a snapshot; a missing arena is logged and ignored.
    pub fn allocate(&self, arena: &str, snapshot: Snapshot) -> bool {
        self.handle().allocate(arena, snapshot)
    }

    /// Names of all arenas, sorted.
    pub fn arena_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.arenas.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy of an arena's snapshots in arrival order.
    pub fn snapshots(&self, arena: &str) -> Option<Vec<Snapshot>> {
        self.shared.arenas.lock().get(arena).cloned()
    }

    /// Most recent snapshot in an arena.
    pub fn last_snapshot(&self, arena: &str) -> Option<Snapshot> {
        self.shared.last_snapshot(arena)
    }

    /// Number of snapshots in an arena.
    pub fn arena_len(&self, arena: &str) -> Option<usize> {
        self.shared.arenas.lock().get(arena).map(Vec::len)
    }

    // ---------------------------------------------------------------------------------
    // Workers
    // ---------------------------------------------------------------------------------

    /// Spawn a worker running `entry(handle, arena, state)` on its own thread.
    ///
    /// The entry point and initial state are retained so the worker can later
    /// be re-spawned by [`Self::respawn_exited`].
    pub fn spawn_worker<F>(
        &self,
        arena: impl Into<String>,
        state: StateVector,
        entry: F,
    ) -> Result<WorkerId>
    where
        F: Fn(KernelHandle, String, StateVector) + Send + Sync + 'static,
    {
        let arena = arena.into();
        let entry: WorkerEntry = Arc::new(entry);
        let mut workers = self.workers.lock();
        self.ensure_not_stopped()?;

        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("{arena}/worker-{id}");
        let handle = {
            let (entry, arena, state) = (Arc::clone(&entry), arena.clone(), state.clone());
            self.launch(&name, move |kernel| entry(kernel, arena, state))?
        };

        info!(worker = %name, arena = %arena, "Worker spawned");
        workers.push(WorkerSlot {
            id,
            name,
            arena: Some(arena.clone()),
            handle: Some(handle),
            exit: None,
            restarts: 0,
            retired: false,
            recipe: Some(Recipe::Worker { arena, initial: state, entry }),
        });
        Ok(id)
    }

    /// Spawn an arbitrary task bound to the kernel. Tasks are monitored and
    /// joined like workers but are never re-spawned.
    pub fn spawn_task<F>(&self, name: &str, task: F) -> Result<WorkerId>
    where
        F: FnOnce(KernelHandle) + Send + 'static,
    {
        let mut workers = self.workers.lock();
        self.ensure_not_stopped()?;

        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("{name}/task-{id}");
        let handle = self.launch(&name, task)?;

        info!(worker = %name, "Task spawned");
        workers.push(WorkerSlot::task(id, name, handle, None));
        Ok(id)
    }

    /// Spawn a task that [`Self::respawn_exited`] relaunches after it exits.
    ///
    /// The closure is invoked again as-is, so any state it evolves must live
    /// in what it captures (e.g. a [`crate::interaction::SharedState`]).
    pub fn spawn_restartable_task<F>(&self, name: &str, task: F) -> Result<WorkerId>
    where
        F: Fn(KernelHandle) + Send + Sync + 'static,
    {
        let entry: TaskEntry = Arc::new(task);
        let mut workers = self.workers.lock();
        self.ensure_not_stopped()?;

        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("{name}/task-{id}");
        let handle = {
            let entry = Arc::clone(&entry);
            self.launch(&name, move |kernel| entry(kernel))?
        };

        info!(worker = %name, "Restartable task spawned");
        workers.push(WorkerSlot::task(id, name, handle, Some(Recipe::Task { entry })));
        Ok(id)
    }

    /// Status of every retained worker, in spawn order.
    pub fn worker_statuses(&self) -> Vec<WorkerStatus> {
        self.workers.lock().iter().map(WorkerSlot::status).collect()
    }

    fn launch<F>(&self, name: &str, body: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(KernelHandle) + Send + 'static,
    {
        let kernel = self.handle();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || body(kernel))?;
        Ok(handle)
    }

    fn ensure_not_stopped(&self) -> Result<()> {
        if self.state() == KernelState::Stopped {
            Err(KernelError::KernelStopped)
        } else {
            Ok(())
        }
    }

    // ---------------------------------------------------------------------------------
    // Control
    // ---------------------------------------------------------------------------------

    /// Poll worker liveness until the run flag clears.
    ///
    /// The first worker found no longer executing is logged at error level and
    /// the kernel interrupts itself. Sleeps `poll_interval` between scans.
    pub fn run(&self) -> RunExit {
        if !self.shared.start_monitor() {
            warn!("Run requested on a stopped kernel");
            return RunExit::Interrupted;
        }
        info!(poll_interval_ms = self.config().poll_interval_ms, "Kernel health monitor started");

        let poll_interval = self.config().poll_interval();
        while self.is_running() {
            if let Some(crash) = self.first_exited_worker() {
                self.interrupt();
                return crash;
            }
            thread::sleep(poll_interval);
        }

        info!(state = %self.state(), "Kernel health monitor exiting");
        RunExit::Interrupted
    }

    fn first_exited_worker(&self) -> Option<RunExit> {
        let mut workers = self.workers.lock();
        let slot = workers.iter_mut().find(|slot| !slot.retired && !slot.is_alive())?;
        let exit = slot.reap();
        error!(
            worker = %slot.name,
            arena = slot.arena.as_deref().unwrap_or("-"),
            reason = %exit,
            "Worker crashed"
        );
        Some(RunExit::WorkerCrashed { worker: slot.name.clone(), reason: exit.to_string() })
    }

    /// Clear the run flag. Idempotent.
    pub fn interrupt(&self) {
        warn!("Interrupt signal received. Pausing workers...");
        self.shared.pause();
    }

    /// Set the run flag again. Idempotent.
    ///
    /// Workers that already exited stay exited.
    pub fn resume(&self) {
        if !self.shared.unpause() {
            warn!("Resume ignored: kernel is stopped");
            return;
        }
        info!("Resuming execution...");
    }

    /// Re-spawn every exited worker that carries a respawn recipe.
    ///
    /// Workers from `spawn_worker` restart from the last snapshot in their
    /// arena, or from their initial state when the arena is empty or was
    /// recreated. Tasks from `spawn_restartable_task` are relaunched as-is.
    /// Exited tasks from `spawn_task` cannot be re-spawned; they are retired
    /// so the monitor stops reporting them. Call after [`Self::resume`]; while paused nothing
    /// changes. Returns how many workers were restarted.
    pub fn respawn_exited(&self) -> Result<usize> {
        let mut workers = self.workers.lock();
        self.ensure_not_stopped()?;
        if !self.is_running() {
            warn!("Respawn ignored: kernel is paused");
            return Ok(0);
        }

        let mut respawned = 0;
        for slot in workers.iter_mut() {
            if slot.retired || slot.is_alive() {
                continue;
            }
            let Some(recipe) = slot.recipe.as_ref() else {
                let exit = slot.reap();
                slot.retired = true;
                warn!(worker = %slot.name, exit = %exit, "Task retired; it has no respawn recipe");
                continue;
            };
            let restart: Box<dyn FnOnce(KernelHandle) + Send> = match recipe {
                Recipe::Worker { arena, initial, entry } => {
                    let state = self
                        .shared
                        .last_snapshot(arena)
                        .and_then(|snapshot| StateVector::from_components(snapshot.components).ok())
                        .unwrap_or_else(|| initial.clone());
                    let (arena, entry) = (arena.clone(), Arc::clone(entry));
                    Box::new(move |kernel: KernelHandle| entry(kernel, arena, state))
                }
                Recipe::Task { entry } => {
                    let entry = Arc::clone(entry);
                    Box::new(move |kernel: KernelHandle| entry(kernel))
                }
            };

            let previous = slot.reap();
            let handle = self.launch(&slot.name, restart)?;
            slot.handle = Some(handle);
            slot.exit = None;
            slot.restarts += 1;
            respawned += 1;
            info!(
                worker = %slot.name,
                restarts = slot.restarts,
                previous_exit = %previous,
                "Worker respawned"
            );
        }
        Ok(respawned)
    }

    /// Block until no worker is executing or `timeout` elapses, polling at the
    /// configured interval. Returns whether every worker had exited.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let idle = self.workers.lock().iter().all(|slot| !slot.is_alive());
            if idle {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(self.config().poll_interval());
        }
    }

    /// Clear the run flag and join every worker. Terminal.
    ///
    /// Blocks until all workers return; cancellation is cooperative.
    pub fn stop(&self) {
        info!("Stopping kernel...");

        let handles: Vec<(WorkerId, JoinHandle<()>)> = {
            let mut workers = self.workers.lock();
            self.shared.halt();
            workers
                .iter_mut()
                .filter_map(|slot| slot.handle.take().map(|handle| (slot.id, handle)))
                .collect()
        };

        let joined = handles.len();
        let exits: Vec<(WorkerId, WorkerExit)> =
            handles.into_iter().map(|(id, handle)| (id, join_worker(handle))).collect();

        let mut workers = self.workers.lock();
        for (id, exit) in exits {
            if let Some(slot) = workers.iter_mut().find(|slot| slot.id == id) {
                if let WorkerExit::Panicked(ref message) = exit {
                    warn!(worker = %slot.name, panic = %message, "Worker had panicked before stop");
                }
                slot.exit = Some(exit);
            }
        }
        self.live_workers.set(0.0);
        info!(joined, "Kernel stopped");
    }

    /// Snapshot of counters, arena sizes and worker statuses.
    pub fn stats(&self) -> KernelStats {
        let workers = self.worker_statuses();
        let arenas: BTreeMap<String, usize> = self
            .shared
            .arenas
            .lock()
            .iter()
            .map(|(name, snapshots)| (name.clone(), snapshots.len()))
            .collect();

        let alive = workers.iter().filter(|w| w.alive).count();
        self.live_workers.set(alive as f64);

        KernelStats {
            state: self.state(),
            total_snapshots: arenas.values().sum(),
            arenas,
            accepted_allocations: self.shared.accepted.get(),
            rejected_allocations: self.shared.rejected.get(),
            workers,
            captured_at: Utc::now(),
        }
    }
}

impl Drop for SpeculativeKernel {
    fn drop(&mut self) {
        if self.state() != KernelState::Stopped {
            // Detached workers still hold the shared core; let them wind down.
            self.shared.running.store(false, Ordering::Release);
        }
    }
}

impl fmt::Debug for SpeculativeKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeculativeKernel")
            .field("state", &self.state())
            .field("running", &self.is_running())
            .field("workers", &self.workers.lock().len())
            .finish()
    }
}
