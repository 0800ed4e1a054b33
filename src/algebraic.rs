/* src/algebraic.rs */
//! # Algebraic States
//!
//! Quaternions with complex coefficients (`a + b·i + c·j + d·k`, each of `a..d`
//! complex). Values are immutable: every operation yields a new state.
//!
//! [`rotate_algebraic`] is a separate, component-wise rotation of the four
//! complex values and is not the matrix rotation of
//! [`crate::state_vector::StateVector::rotate`]; the two act on different
//! representations and are not expected to agree.
/*▫~•◦────────────────────────────────────────────────────────────────────────────────────‣
 * © 2025 ArcMoon Studios ◦ SPDX-License-Identifier MIT OR Apache-2.0 ◦ Author: Lord Xyn ✶
 *///◦────────────────────────────────────────────────────────────────────────────────────‣

use std::{
    fmt,
    ops::{Add, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// Number of components in an [`AlgebraicState`].
pub const ALGEBRAIC_ARITY: usize = 4;

// =====================================================================================
// COMPLEX SCALARS
// =====================================================================================

/// A complex number `re + im·i`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    /// Real part
    pub re: f64,
    /// Imaginary part
    pub im: f64,
}

impl Complex {
    /// Complex zero.
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    /// Construct from parts.
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Purely real value.
    pub const fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    /// Complex conjugate.
    pub fn conj(self) -> Self {
        Self { re: self.re, im: -self.im }
    }

    /// Squared magnitude.
    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// Magnitude.
    pub fn abs(self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Scale by a real factor.
    pub fn scale(self, factor: f64) -> Self {
        Self { re: self.re * factor, im: self.im * factor }
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { re: self.re + rhs.re, im: self.im + rhs.im }
    }
}

impl Sub for Complex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { re: self.re - rhs.re, im: self.im - rhs.im }
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl Neg for Complex {
    type Output = Self;

    fn neg(self) -> Self {
        Self { re: -self.re, im: -self.im }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{}-{}i", self.re, -self.im)
        } else {
            write!(f, "{}+{}i", self.re, self.im)
        }
    }
}

// =====================================================================================
// ALGEBRAIC STATE
// =====================================================================================

/// Quaternion-like 4-tuple of complex numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlgebraicState {
    q: [Complex; ALGEBRAIC_ARITY],
}

impl AlgebraicState {
    /// Build from the scalar part `a` and the `i`, `j`, `k` parts.
    pub const fn new(a: Complex, b: Complex, c: Complex, d: Complex) -> Self {
        Self { q: [a, b, c, d] }
    }

    /// Build from a slice, which must hold exactly four components.
    pub fn from_components(components: &[Complex]) -> Result<Self> {
        let q: [Complex; ALGEBRAIC_ARITY] =
            components.try_into().map_err(|_| KernelError::InvalidArity {
                expected: ALGEBRAIC_ARITY,
                found: components.len(),
            })?;
        Ok(Self { q })
    }

    /// The four components in `(a, b, c, d)` order.
    pub fn components(&self) -> [Complex; ALGEBRAIC_ARITY] {
        self.q
    }

    /// Hamilton product `self · other`. Not commutative.
    pub fn multiply(&self, other: &AlgebraicState) -> AlgebraicState {
        let [a1, b1, c1, d1] = self.q;
        let [a2, b2, c2, d2] = other.q;
        AlgebraicState::new(
            a1 * a2 - b1 * b2 - c1 * c2 - d1 * d2,
            a1 * b2 + b1 * a2 + c1 * d2 - d1 * c2,
            a1 * c2 - b1 * d2 + c1 * a2 + d1 * b2,
            a1 * d2 + b1 * c2 - c1 * b2 + d1 * a2,
        )
    }

    /// Quaternion conjugate: keeps the scalar part, negates `b`, `c`, `d`.
    pub fn conjugate(&self) -> AlgebraicState {
        let [a, b, c, d] = self.q;
        AlgebraicState::new(a, -b, -c, -d)
    }

    /// Complex conjugate of every component.
    pub fn complex_conjugate(&self) -> AlgebraicState {
        let [a, b, c, d] = self.q;
        AlgebraicState::new(a.conj(), b.conj(), c.conj(), d.conj())
    }

    /// Euclidean norm over the complex magnitudes of all four components.
    pub fn norm(&self) -> f64 {
        self.q.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
    }
}

impl TryFrom<Vec<Complex>> for AlgebraicState {
    type Error = KernelError;

    fn try_from(components: Vec<Complex>) -> Result<Self> {
        Self::from_components(&components)
    }
}

impl Mul for AlgebraicState {
    type Output = AlgebraicState;

    fn mul(self, rhs: AlgebraicState) -> AlgebraicState {
        self.multiply(&rhs)
    }
}

/// Rotate each complex component of `state` by the half-angle quaternion for
/// `axis` / `angle`.
///
/// With `r = cos(angle/2)` and `(i, j, k) = axis · sin(angle/2)`, each component
/// `u + v·i` maps to `(r·u − i·v − j·v) + (r·v + i·u + k·v)·i`. The axis is used
/// as given, without normalization.
pub fn rotate_algebraic(state: &AlgebraicState, axis: [f64; 3], angle: f64) -> AlgebraicState {
    let (sin_half, r) = (angle / 2.0).sin_cos();
    let [i, j, k] = axis.map(|component| component * sin_half);

    let q = state.q.map(|value| {
        let q_r = r * value.re - i * value.im;
        let q_i = r * value.im + i * value.re;
        let q_j = j * value.im;
        let q_k = k * value.im;
        Complex::new(q_r - q_j, q_i + q_k)
    });
    AlgebraicState { q }
}
