use fastrand::Rng;
use nalgebra::{Dyn, OVector};

use super::domain::Domain;

/// The base trait for [`Objective`](super::Objective) functions.
///
/// A problem only states the scalar type and the domain over which the
/// minimization is performed.
pub trait Problem {
    /// Type of the scalar, usually f32 or f64.
    type Field: RealField + Copy;

    /// Gets the domain (dimensionality and bound constraints) of the problem.
    fn domain(&self) -> Domain<Self::Field>;
}

/// Extension trait for `nalgebra::RealField` with handy constants.
pub trait RealField: nalgebra::RealField {
    /// Machine epsilon.
    const EPSILON: Self;

    /// Square root of the machine epsilon.
    const EPSILON_SQRT: Self;
}

impl RealField for f32 {
    const EPSILON: Self = f32::EPSILON;
    const EPSILON_SQRT: Self = 0.00034526698;
}

impl RealField for f64 {
    const EPSILON: Self = f64::EPSILON;
    const EPSILON_SQRT: Self = 0.000000014901161193847656;
}

/// Field types that can be sampled by the random number generator used
/// throughout the crate.
///
/// The crate never instantiates its own randomness. All stochastic pieces
/// (population seeding, mutation, selection draws) go through a
/// caller-supplied [`Rng`], so runs are reproducible given a fixed seed.
pub trait Sample: RealField + Copy {
    /// Samples a value uniformly from `[lower, upper]`.
    fn sample_uniform(lower: Self, upper: Self, rng: &mut Rng) -> Self;

    /// Samples an arbitrary value when no finite bounds are available. The
    /// distribution is heavy-tailed so that all magnitudes are reachable.
    fn sample_any(rng: &mut Rng) -> Self;
}

impl Sample for f32 {
    fn sample_uniform(lower: Self, upper: Self, rng: &mut Rng) -> Self {
        lower + (upper - lower) * rng.f32()
    }

    fn sample_any(rng: &mut Rng) -> Self {
        f64::sample_any(rng) as f32
    }
}

impl Sample for f64 {
    fn sample_uniform(lower: Self, upper: Self, rng: &mut Rng) -> Self {
        lower + (upper - lower) * rng.f64()
    }

    fn sample_any(rng: &mut Rng) -> Self {
        // Standard Cauchy via inverse transform.
        (std::f64::consts::PI * (rng.f64() - 0.5)).tan()
    }
}

/// A minimizer found by an algorithm: the point paired with its objective
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimum<T: RealField + Copy> {
    x: OVector<T, Dyn>,
    value: T,
}

impl<T: RealField + Copy> Optimum<T> {
    pub(crate) fn new(x: OVector<T, Dyn>, value: T) -> Self {
        Self { x, value }
    }

    /// Gets the found point.
    pub fn x(&self) -> &OVector<T, Dyn> {
        &self.x
    }

    /// Gets the objective value at [`x`](Optimum::x).
    pub fn value(&self) -> T {
        self.value
    }

    /// Consumes the optimum, returning the point and its value.
    pub fn into_inner(self) -> (OVector<T, Dyn>, T) {
        (self.x, self.value)
    }
}
