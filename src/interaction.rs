/* src/interaction.rs */
//! Shared state vectors and deadlock-free pairwise interaction across workers.
//!
//! Locks are always taken in ascending id order, so two workers interacting
//! with each other from opposite sides cannot deadlock.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::{Mutex, MutexGuard};

use crate::error::{KernelError, Result};
use crate::state_vector::StateVector;

static NEXT_SHARED_ID: AtomicU64 = AtomicU64::new(1);

/// A state vector that several workers may touch, tagged with a stable id.
#[derive(Debug, Clone)]
pub struct SharedState {
    id: u64,
    cell: Arc<Mutex<StateVector>>,
}

impl SharedState {
    /// Wrap a state, assigning it a process-unique id.
    pub fn new(state: StateVector) -> Self {
        Self {
            id: NEXT_SHARED_ID.fetch_add(1, Ordering::Relaxed),
            cell: Arc::new(Mutex::new(state)),
        }
    }

    /// Stable lock-ordering id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Exclusive access for the guard's lifetime.
    pub fn lock(&self) -> MutexGuard<'_, StateVector> {
        self.cell.lock()
    }

    /// Copy of the current state.
    pub fn get(&self) -> StateVector {
        self.cell.lock().clone()
    }
}

/// Run [`StateVector::interact`] on two shared states under both locks.
///
/// Returns the coupling vector. Interacting a state with itself (or a clone of
/// its handle) fails with [`KernelError::AliasedInteraction`].
pub fn interact_shared(a: &SharedState, b: &SharedState) -> Result<[f64; 3]> {
    if a.id == b.id {
        return Err(KernelError::AliasedInteraction { id: a.id });
    }

    let (first, second) = if a.id < b.id { (a, b) } else { (b, a) };
    let mut first_guard = first.cell.lock();
    let mut second_guard = second.cell.lock();

    if a.id < b.id {
        first_guard.interact(&mut second_guard)
    } else {
        second_guard.interact(&mut first_guard)
    }
}
