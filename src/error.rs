/* src/error.rs */
//! # Kernel Error Taxonomy
//!
//! Numeric and construction failures are local to the call that raised them.
//! Lifecycle failures (a worker exiting) only ever flip the kernel's run flag
//! and are reported back to the monitor through [`crate::kernel::RunExit`].
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use thiserror::Error;

/// Unified error type for the speculative kernel.
#[derive(Error, Debug)]
pub enum KernelError {
    /// Normalization of a zero-length or non-finite vector.
    #[error("Degenerate state: cannot normalize vector with norm {norm}")]
    DegenerateState {
        /// Euclidean norm of the offending vector
        norm: f64,
    },

    /// Rotation requested about a zero-length (or non-finite) axis.
    #[error("Invalid rotation axis: axis must be a finite, non-zero 3-vector")]
    InvalidAxis,

    /// An algebraic state was built from the wrong number of components.
    #[error("Invalid arity: expected {expected} components, found {found}")]
    InvalidArity {
        /// Required component count
        expected: usize,
        /// Supplied component count
        found: usize,
    },

    /// Operation is only defined for a specific dimensionality.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Dimensionality the operation requires
        expected: usize,
        /// Dimensionality of the operand
        found: usize,
    },

    /// Allocation targeted an arena that was never created.
    #[error("Arena '{0}' does not exist")]
    ArenaNotFound(String),

    /// A worker stopped executing while the kernel was running.
    #[error("Worker {worker} crashed: {reason}")]
    WorkerCrashed {
        /// Worker name
        worker: String,
        /// Panic payload or exit description
        reason: String,
    },

    /// Both operands of a shared interaction are the same instance.
    #[error("Aliased interaction: state {id} cannot interact with itself")]
    AliasedInteraction {
        /// Identifier of the aliased shared state
        id: u64,
    },

    /// The kernel has been stopped and accepts no new work.
    #[error("Kernel stopped")]
    KernelStopped,

    /// Invalid or unreadable configuration.
    #[error("Configuration Error: {0}")]
    Configuration(String),

    /// I/O failure, including thread spawn failures.
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
