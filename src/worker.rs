/* src/worker.rs */
//! Default worker entry points.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use std::thread;

use tracing::{debug, error, info, trace};

use crate::interaction::{interact_shared, SharedState};
use crate::kernel::KernelHandle;
use crate::state_vector::StateVector;

/// Rotate `state` by the configured step and publish it into `arena` until
/// the kernel's run flag clears.
///
/// A rotation error (e.g. a state that is not three-dimensional) ends the
/// worker, which the kernel's monitor then reports.
pub fn rotation_task(kernel: KernelHandle, arena: String, mut state: StateVector) {
    let config = kernel.config().worker.clone();
    let step = config.step_interval();
    info!(arena = %arena, "Rotation worker started");

    while kernel.is_running() {
        if let Err(err) =
            state.rotate_with(config.rotation_axis, config.rotation_angle, config.convention)
        {
            error!(arena = %arena, error = %err, "Rotation failed; worker exiting");
            return;
        }
        kernel.allocate(&arena, state.snapshot());
        debug!(arena = %arena, components = ?state.components(), "Task rotated state");

        if !step.is_zero() {
            thread::sleep(step);
        }
    }

    info!(arena = %arena, "Rotation worker observed stop signal");
}

/// Like [`rotation_task`] on a shared state, additionally interacting with
/// `peer` every `interaction_every` steps.
pub fn coupled_task(kernel: KernelHandle, arena: String, own: SharedState, peer: SharedState) {
    let config = kernel.config().worker.clone();
    let step = config.step_interval();
    let every = u64::from(config.interaction_every.max(1));
    let mut steps: u64 = 0;
    info!(arena = %arena, state = own.id(), peer = peer.id(), "Coupled worker started");

    while kernel.is_running() {
        let snapshot = {
            let mut state = own.lock();
            if let Err(err) =
                state.rotate_with(config.rotation_axis, config.rotation_angle, config.convention)
            {
                error!(arena = %arena, error = %err, "Rotation failed; worker exiting");
                return;
            }
            state.snapshot()
        };
        kernel.allocate(&arena, snapshot);

        steps += 1;
        if steps % every == 0 {
            match interact_shared(&own, &peer) {
                Ok(coupling) => trace!(arena = %arena, ?coupling, "Interacted with peer"),
                Err(err) => {
                    error!(arena = %arena, error = %err, "Interaction failed; worker exiting");
                    return;
                }
            }
        }

        if !step.is_zero() {
            thread::sleep(step);
        }
    }

    info!(arena = %arena, steps, "Coupled worker observed stop signal");
}
