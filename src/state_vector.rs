/* src/state_vector.rs */
//! # State Vectors
//!
//! Unit-norm real vectors carried by worker tasks. Every mutation re-normalizes,
//! so `‖components‖₂ == 1` holds after construction, `rotate` and `interact`.
//!
//! ## Rotation conventions
//!
//! [`StateVector::rotate`] applies the canonical Rodrigues matrix for the full
//! angle (right-handed: `[1,0,0]` about `+z` by `π/2` lands on `[0,1,0]`).
//! [`RotationConvention::HalfAngle`] evaluates the same matrix with `angle / 2`
//! and therefore turns the vector by half the requested angle. Both are kept and
//! tested independently; neither is derived from the other.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// Default dimensionality of a freshly drawn state.
pub const DEFAULT_DIMENSIONS: usize = 3;

/// Trig convention used when building the rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationConvention {
    /// Canonical axis-angle rotation by `angle`
    #[default]
    FullAngle,
    /// Matrix evaluated at `angle / 2`; turns by half the requested angle
    HalfAngle,
}

impl RotationConvention {
    /// Angle actually fed to the Rodrigues matrix.
    fn effective_angle(self, angle: f64) -> f64 {
        match self {
            RotationConvention::FullAngle => angle,
            RotationConvention::HalfAngle => angle / 2.0,
        }
    }
}

/// Immutable copy of a state's components at the moment it was published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unit-norm components
    pub components: Vec<f64>,
    /// Wall-clock capture time
    pub recorded_at: DateTime<Utc>,
}

/// A normalized vector on the unit sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct StateVector {
    components: Vec<f64>,
}

impl StateVector {
    /// Draw `dimensions` components uniformly from `[0, 1)` using the thread RNG.
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::random(dimensions, &mut rand::rng())
    }

    /// Draw components from an injected randomness source.
    pub fn random<R: Rng + ?Sized>(dimensions: usize, rng: &mut R) -> Result<Self> {
        let components = (0..dimensions).map(|_| rng.random::<f64>()).collect();
        Self::from_components(components)
    }

    /// Deterministic draw for reproducible runs.
    pub fn seeded(dimensions: usize, seed: u64) -> Result<Self> {
        Self::random(dimensions, &mut StdRng::seed_from_u64(seed))
    }

    /// Build from caller-supplied components, normalizing them.
    pub fn from_components(components: Vec<f64>) -> Result<Self> {
        Ok(Self { components: normalized(components)? })
    }

    /// Number of components.
    pub fn dimensions(&self) -> usize {
        self.components.len()
    }

    /// Current components (always unit norm).
    pub fn components(&self) -> &[f64] {
        &self.components
    }

    /// Copy the current components for publication into an arena.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { components: self.components.clone(), recorded_at: Utc::now() }
    }

    /// Rotate about `axis` by `angle` radians using the full-angle convention.
    pub fn rotate(&mut self, axis: [f64; 3], angle: f64) -> Result<()> {
        self.rotate_with(axis, angle, RotationConvention::FullAngle)
    }

    /// Rotate about `axis` using an explicit trig convention.
    ///
    /// Only defined for three-dimensional states. The axis is normalized first.
    pub fn rotate_with(
        &mut self,
        axis: [f64; 3],
        angle: f64,
        convention: RotationConvention,
    ) -> Result<()> {
        self.require_three()?;
        let [x, y, z] = unit_axis(axis)?;
        let theta = convention.effective_angle(angle);
        let (s, c) = theta.sin_cos();
        let t = 1.0 - c;

        let matrix = [
            [c + x * x * t, x * y * t - z * s, x * z * t + y * s],
            [y * x * t + z * s, c + y * y * t, y * z * t - x * s],
            [z * x * t - y * s, z * y * t + x * s, c + z * z * t],
        ];

        let rotated = matrix
            .iter()
            .map(|row| row.iter().zip(&self.components).map(|(m, v)| m * v).sum())
            .collect();
        self.components = normalized(rotated)?;
        Ok(())
    }

    /// Couple two states through their cross product.
    ///
    /// The same coupling vector is added to both operands before each is
    /// re-normalized independently. Returns that coupling vector. Neither
    /// operand is modified when an error is returned.
    pub fn interact(&mut self, other: &mut StateVector) -> Result<[f64; 3]> {
        self.require_three()?;
        other.require_three()?;

        let a = [self.components[0], self.components[1], self.components[2]];
        let b = [other.components[0], other.components[1], other.components[2]];
        let coupling = cross_product(a, b);

        let next_self = normalized(a.iter().zip(coupling).map(|(s, i)| s + i).collect())?;
        let next_other = normalized(b.iter().zip(coupling).map(|(s, i)| s + i).collect())?;
        self.components = next_self;
        other.components = next_other;
        Ok(coupling)
    }

    /// Sum of squared components. Always ≈ 1 under the normalization invariant.
    pub fn measure(&self) -> f64 {
        self.components.iter().map(|x| x * x).sum()
    }

    fn require_three(&self) -> Result<()> {
        if self.components.len() == 3 {
            Ok(())
        } else {
            Err(KernelError::DimensionMismatch { expected: 3, found: self.components.len() })
        }
    }
}

impl TryFrom<Vec<f64>> for StateVector {
    type Error = KernelError;

    fn try_from(components: Vec<f64>) -> Result<Self> {
        Self::from_components(components)
    }
}

impl From<StateVector> for Vec<f64> {
    fn from(state: StateVector) -> Self {
        state.components
    }
}

/// Right-handed 3D cross product `a × b`.
pub fn cross_product(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn euclidean_norm(values: &[f64]) -> f64 {
    values.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn normalized(mut values: Vec<f64>) -> Result<Vec<f64>> {
    let norm = euclidean_norm(&values);
    if norm == 0.0 || !norm.is_finite() {
        return Err(KernelError::DegenerateState { norm });
    }
    for value in &mut values {
        *value /= norm;
    }
    Ok(values)
}

fn unit_axis(axis: [f64; 3]) -> Result<[f64; 3]> {
    let norm = euclidean_norm(&axis);
    if norm == 0.0 || !norm.is_finite() {
        return Err(KernelError::InvalidAxis);
    }
    Ok([axis[0] / norm, axis[1] / norm, axis[2] / norm])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_1_SQRT_2};

    const TOLERANCE: f64 = 1e-9;

    fn assert_unit(state: &StateVector) {
        assert!((euclidean_norm(state.components()) - 1.0).abs() < TOLERANCE);
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < TOLERANCE, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_new_is_normalized() {
        let state = StateVector::new(DEFAULT_DIMENSIONS).unwrap();
        assert_eq!(state.dimensions(), 3);
        assert_unit(&state);

        let wide = StateVector::new(16).unwrap();
        assert_eq!(wide.dimensions(), 16);
        assert_unit(&wide);
    }

    #[test]
    fn test_zero_dimensions_is_degenerate() {
        assert!(matches!(StateVector::new(0), Err(KernelError::DegenerateState { .. })));
    }

    #[test]
    fn test_zero_and_non_finite_components_rejected() {
        assert!(matches!(
            StateVector::from_components(vec![0.0, 0.0, 0.0]),
            Err(KernelError::DegenerateState { .. })
        ));
        assert!(matches!(
            StateVector::from_components(vec![f64::NAN, 1.0, 0.0]),
            Err(KernelError::DegenerateState { .. })
        ));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = StateVector::seeded(3, 42).unwrap();
        let b = StateVector::seeded(3, 42).unwrap();
        let c = StateVector::seeded(3, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rotate_x_about_z_quarter_turn() {
        let mut state = StateVector::from_components(vec![1.0, 0.0, 0.0]).unwrap();
        state.rotate([0.0, 0.0, 1.0], FRAC_PI_2).unwrap();
        assert_close(state.components(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_half_angle_convention_turns_half_as_far() {
        let mut state = StateVector::from_components(vec![1.0, 0.0, 0.0]).unwrap();
        state
            .rotate_with([0.0, 0.0, 1.0], FRAC_PI_2, RotationConvention::HalfAngle)
            .unwrap();
        assert_close(state.components(), &[FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0]);
    }

    #[test]
    fn test_rotate_normalizes_axis() {
        let mut a = StateVector::from_components(vec![1.0, 0.0, 0.0]).unwrap();
        let mut b = a.clone();
        a.rotate([0.0, 0.0, 5.0], 0.3).unwrap();
        b.rotate([0.0, 0.0, 1.0], 0.3).unwrap();
        assert_close(a.components(), b.components());
    }

    #[test]
    fn test_rotate_zero_axis_fails_without_mutation() {
        let mut state = StateVector::seeded(3, 7).unwrap();
        let before = state.clone();
        assert!(matches!(state.rotate([0.0, 0.0, 0.0], 1.0), Err(KernelError::InvalidAxis)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_rotate_requires_three_dimensions() {
        let mut state = StateVector::seeded(4, 1).unwrap();
        assert!(matches!(
            state.rotate([1.0, 0.0, 0.0], 1.0),
            Err(KernelError::DimensionMismatch { expected: 3, found: 4 })
        ));
    }

    #[test]
    fn test_cross_product_is_right_handed() {
        assert_eq!(cross_product([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
        assert_eq!(cross_product([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]), [1.0, 0.0, 0.0]);
        assert_eq!(cross_product([2.0, 3.0, 4.0], [5.0, 6.0, 7.0]), [-3.0, 6.0, -3.0]);
    }

    #[test]
    fn test_interact_applies_same_coupling_to_both() {
        let mut a = StateVector::seeded(3, 11).unwrap();
        let mut b = StateVector::seeded(3, 12).unwrap();
        let a0 = a.components().to_vec();
        let b0 = b.components().to_vec();

        let coupling = a.interact(&mut b).unwrap();
        assert_eq!(coupling, cross_product([a0[0], a0[1], a0[2]], [b0[0], b0[1], b0[2]]));

        let expected_a = normalized(a0.iter().zip(coupling).map(|(s, i)| s + i).collect()).unwrap();
        let expected_b = normalized(b0.iter().zip(coupling).map(|(s, i)| s + i).collect()).unwrap();
        assert_close(a.components(), &expected_a);
        assert_close(b.components(), &expected_b);
        assert_unit(&a);
        assert_unit(&b);
    }

    #[test]
    fn test_interact_parallel_states_is_identity() {
        let mut a = StateVector::from_components(vec![0.0, 1.0, 0.0]).unwrap();
        let mut b = a.clone();
        let coupling = a.interact(&mut b).unwrap();
        assert_eq!(coupling, [0.0, 0.0, 0.0]);
        assert_close(a.components(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_measure_is_unit() {
        let state = StateVector::seeded(5, 99).unwrap();
        assert!((state.measure() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_deserialize_normalizes() {
        let state: StateVector = serde_json::from_str("[3.0, 4.0, 0.0]").unwrap();
        assert_close(state.components(), &[0.6, 0.8, 0.0]);
        assert!(serde_json::from_str::<StateVector>("[0.0, 0.0]").is_err());
    }

    proptest! {
        #[test]
        fn prop_rotation_preserves_norm(
            components in prop::array::uniform3(-10.0f64..10.0),
            axis in prop::array::uniform3(-10.0f64..10.0),
            angle in -20.0f64..20.0,
            half in any::<bool>(),
        ) {
            prop_assume!(euclidean_norm(&components) > 1e-6);
            prop_assume!(euclidean_norm(&axis) > 1e-6);
            let convention = if half { RotationConvention::HalfAngle } else { RotationConvention::FullAngle };

            let mut state = StateVector::from_components(components.to_vec()).unwrap();
            state.rotate_with(axis, angle, convention).unwrap();
            prop_assert!((euclidean_norm(state.components()) - 1.0).abs() < TOLERANCE);
        }

        #[test]
        fn prop_interact_keeps_both_unit(
            a in prop::array::uniform3(-10.0f64..10.0),
            b in prop::array::uniform3(-10.0f64..10.0),
        ) {
            prop_assume!(euclidean_norm(&a) > 1e-6 && euclidean_norm(&b) > 1e-6);
            let mut sa = StateVector::from_components(a.to_vec()).unwrap();
            let mut sb = StateVector::from_components(b.to_vec()).unwrap();
            sa.interact(&mut sb).unwrap();
            prop_assert!((sa.measure() - 1.0).abs() < TOLERANCE);
            prop_assert!((sb.measure() - 1.0).abs() < TOLERANCE);
        }
    }
}
