/* src/lib.rs */
#![warn(missing_docs)]
//! # Specula: Speculative Execution Kernel
//!
//! A small concurrency controller. Worker threads evolve unit-norm state
//! vectors and publish snapshots into named, append-only arenas while the
//! kernel polls their health and can globally pause, resume or stop progress.
//!
//! ## Components
//!
//! - [`state_vector::StateVector`] unit-sphere state with rotation and interaction
//! - [`algebraic::AlgebraicState`] complex-coefficient quaternions
//! - [`interaction`] lock-ordered interaction between workers' shared states
//! - [`kernel::SpeculativeKernel`] arena table, run flag, worker registry, monitor
//! - [`worker`] default worker entry points
//!
//! ```no_run
//! use specula::{kernel::SpeculativeKernel, state_vector::StateVector, worker::rotation_task};
//!
//! let kernel = SpeculativeKernel::with_defaults();
//! kernel.create_arena("arena1");
//! kernel.spawn_worker("arena1", StateVector::new(3)?, rotation_task)?;
//! let exit = kernel.run();
//! kernel.stop();
//! # Ok::<(), specula::KernelError>(())
//! ```
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

pub mod algebraic;
pub mod config;
pub mod error;
pub mod interaction;
pub mod kernel;
pub mod metrics;
pub mod state_vector;
pub mod worker;

pub use algebraic::{rotate_algebraic, AlgebraicState, Complex};
pub use config::{KernelConfig, RestartPolicy, WorkerConfig};
pub use error::{KernelError, Result};
pub use interaction::{interact_shared, SharedState};
pub use kernel::{KernelHandle, KernelState, KernelStats, RunExit, SpeculativeKernel, WorkerExit, WorkerStatus};
pub use state_vector::{cross_product, RotationConvention, Snapshot, StateVector};
