//! Quaternion algebra for attitude composition
//!
//! This module provides the rotation algebra the scan-direction calculation
//! needs: axis-angle construction, the Hamilton product, conjugation, and
//! vector rotation, in both scalar and structure-of-arrays batched form.
//! [`Quaternion`] is an immutable value type; batched evaluation over
//! [`QuaternionBatch`] applies exactly the same elementwise arithmetic as the
//! scalar path.

use nalgebra::Vector3;
use std::ops::Mul;

/// A quaternion representing a rotation in 3D space.
///
/// Rotation quaternions are unit-norm. Construction via
/// [`Quaternion::from_axis_angle`] with a unit axis guarantees this, and the
/// Hamilton product of unit quaternions preserves it. Applying a non-unit
/// quaternion through [`Quaternion::rotate_vector`] yields a scaled result
/// rather than a pure rotation; that is a documented precondition, checked
/// only in debug builds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// Real/scalar component.
    pub w: f64,
    /// First imaginary component (i).
    pub x: f64,
    /// Second imaginary component (j).
    pub y: f64,
    /// Third imaginary component (k).
    pub z: f64,
}

impl Quaternion {
    /// Create a new quaternion from raw components.
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity quaternion (no rotation).
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Create a rotation quaternion from a unit axis and an angle in radians.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        let half = angle / 2.0;
        let s = half.sin();
        Self {
            w: half.cos(),
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
    }

    /// Quaternion norm.
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// The conjugate, which for a unit quaternion is its inverse rotation.
    pub fn conjugate(&self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Rotate a 3-vector: the vector part of q · (0, v) · q*.
    pub fn rotate_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        debug_assert!(
            (self.norm() - 1.0).abs() < 1e-9,
            "rotation quaternion must be unit-norm (norm = {})",
            self.norm()
        );
        let p = Quaternion::new(0.0, v.x, v.y, v.z);
        let r = *self * p * self.conjugate();
        Vector3::new(r.x, r.y, r.z)
    }
}

// Hamilton product. Non-commutative, associative.
impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

/// Structure-of-arrays batch of quaternions for vectorized evaluation.
///
/// Lanes are parallel `Vec<f64>` arrays; every operation is elementwise with
/// no cross-sample interaction, so results match the scalar path applied per
/// element.
#[derive(Debug, Clone, Default)]
pub struct QuaternionBatch {
    w: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl QuaternionBatch {
    /// Number of quaternions in the batch.
    pub fn len(&self) -> usize {
        self.w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }

    /// Rotation quaternions around a shared unit axis, one per angle.
    pub fn from_axis_angle(axis: &Vector3<f64>, angles: &[f64]) -> Self {
        let mut batch = Self::with_capacity(angles.len());
        for &angle in angles {
            batch.push(Quaternion::from_axis_angle(axis, angle));
        }
        batch
    }

    /// A batch repeating the same quaternion `n` times.
    pub fn repeat(q: Quaternion, n: usize) -> Self {
        Self {
            w: vec![q.w; n],
            x: vec![q.x; n],
            y: vec![q.y; n],
            z: vec![q.z; n],
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            w: Vec::with_capacity(n),
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, q: Quaternion) {
        self.w.push(q.w);
        self.x.push(q.x);
        self.y.push(q.y);
        self.z.push(q.z);
    }

    /// The i-th quaternion of the batch.
    pub fn get(&self, i: usize) -> Quaternion {
        Quaternion::new(self.w[i], self.x[i], self.y[i], self.z[i])
    }

    /// Elementwise Hamilton product. Both batches must have the same length.
    pub fn hamilton(&self, rhs: &Self) -> Self {
        assert_eq!(self.len(), rhs.len(), "batch length mismatch");
        let mut out = Self::with_capacity(self.len());
        for i in 0..self.len() {
            out.push(self.get(i) * rhs.get(i));
        }
        out
    }

    /// Rotate a shared 3-vector by each quaternion in the batch.
    pub fn rotate_vector(&self, v: &Vector3<f64>) -> Vec<Vector3<f64>> {
        (0..self.len()).map(|i| self.get(i).rotate_vector(v)).collect()
    }

    /// Rotate the i-th vector by the i-th quaternion, elementwise over
    /// parallel arrays.
    pub fn rotate_each(&self, vs: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        assert_eq!(self.len(), vs.len(), "batch length mismatch");
        vs.iter()
            .enumerate()
            .map(|(i, v)| self.get(i).rotate_vector(v))
            .collect()
    }
}
