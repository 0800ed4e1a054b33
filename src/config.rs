/* src/config.rs */
//! # Kernel Configuration
//!
//! Polling cadence for the health monitor, the evolution step applied by the
//! default workers, and the restart policy applied by supervising drivers.
//! Loadable from YAML or JSON; every field has a default.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use std::{fs, path::Path, time::Duration};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::state_vector::RotationConvention;

/// What a supervising driver does after the monitor reports a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Crash pauses the kernel; `resume()` only flips the run flag.
    FlagOnly,
    /// Exited workers are re-spawned from their arena's last snapshot.
    RespawnFromLastSnapshot {
        /// Upper bound on supervised restarts per kernel run
        max_restarts: u32,
    },
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy::FlagOnly
    }
}

/// Evolution step applied by the default worker entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Axis of the per-step rotation
    pub rotation_axis: [f64; 3],
    /// Angle of the per-step rotation, radians
    pub rotation_angle: f64,
    /// Trig convention used to build the rotation matrix
    pub convention: RotationConvention,
    /// Pause between steps; zero means no pause
    pub step_interval_ms: u64,
    /// Coupled workers interact with their peer every this many steps
    pub interaction_every: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            rotation_axis: [1.0, 0.0, 0.0],
            rotation_angle: std::f64::consts::PI / 100.0,
            convention: RotationConvention::FullAngle,
            step_interval_ms: 1,
            interaction_every: 16,
        }
    }
}

impl WorkerConfig {
    /// Step pause as a `Duration`.
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

/// Speculative kernel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Sleep between worker health scans in `run()`
    pub poll_interval_ms: u64,
    /// Default worker evolution settings
    pub worker: WorkerConfig,
    /// Restart policy for supervising drivers
    pub restart_policy: RestartPolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5,
            worker: WorkerConfig::default(),
            restart_policy: RestartPolicy::default(),
        }
    }
}

impl KernelConfig {
    /// Health-scan interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load from a `.yaml`/`.yml` file, or JSON for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let config: Self = load_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would busy-spin the monitor or break rotation.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(KernelError::Configuration(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        let axis = self.worker.rotation_axis;
        let norm = axis.iter().map(|x| x * x).sum::<f64>().sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(KernelError::Configuration(
                "worker.rotation_axis must be a finite, non-zero vector".to_string(),
            ));
        }
        if !self.worker.rotation_angle.is_finite() {
            return Err(KernelError::Configuration(
                "worker.rotation_angle must be finite".to_string(),
            ));
        }
        if self.worker.interaction_every == 0 {
            return Err(KernelError::Configuration(
                "worker.interaction_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deserialize any configuration document from a `.yaml`/`.yml` file, or
/// JSON for any other extension. Callers embedding [`KernelConfig`] in a
/// larger document validate it themselves.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let parsed = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        _ => serde_json::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| KernelError::Configuration(format!("{}: {e}", path.display())))
}
