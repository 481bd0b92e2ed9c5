//! Testing objectives and utilities useful for benchmarking, debugging and
//! smoke testing.
//!
//! [`Sphere`] is recommended for first tests. [`Ellipsoid`] adds anisotropic
//! curvature and [`Rosenbrock`] a narrow curved valley.
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)
//!
//! \[2\] [Numerical Methods for Unconstrained Optimization and Nonlinear
//! Equations](https://epubs.siam.org/doi/book/10.1137/1.9781611971200)

#![allow(unused)]

use nalgebra::{
    dvector,
    storage::{Storage, StorageMut},
    Dyn, IsContiguous, OVector, Vector,
};

use crate::core::{Domain, Gradient, Objective, Optimum, Problem};

/// Extension of the [`Objective`] trait that provides additional information
/// that is useful for testing the algorithms.
pub trait TestFunction: Objective
where
    Self::Field: approx::RelativeEq,
{
    /// Standard initial values for the objective. Using the same initial
    /// values is essential for fair comparison of methods.
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>>;

    /// A set of global optima (if known and finite). This is mostly just for
    /// information, for example to know how close an algorithm got even if it
    /// failed. For testing if a given point is a global optimum,
    /// [`TestFunction::is_optimum`] should be used.
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        Vec::new()
    }

    /// Tests if given point is a global optimum, given the tolerance `eps`.
    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.optima().iter().any(|optimum| (x - optimum).norm() <= eps)
    }
}

/// Sphere function \[1\].
///
/// A strictly convex quadratic bowl with its single global minimum in the
/// origin.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    n: usize,
}

impl Sphere {
    /// Initializes the objective with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self { n }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Sphere {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.n)
    }
}

impl Objective for Sphere {
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.iter().map(|xi| xi * xi).sum()
    }
}

impl Gradient for Sphere {
    fn gradient<Sx, Sgx>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sgx>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sgx: StorageMut<Self::Field, Dyn>,
    {
        gx.iter_mut()
            .zip(x.iter())
            .for_each(|(gi, xi)| *gi = 2.0 * xi);
    }
}

impl TestFunction for Sphere {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![OVector::from_element_generic(
            Dyn(self.n),
            nalgebra::Const::<1>,
            3.0,
        )]
    }

    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![OVector::zeros_generic(Dyn(self.n), nalgebra::Const::<1>)]
    }
}

/// Axis-aligned ellipsoid function \[1\].
///
/// A strictly convex quadratic with curvature growing along the coordinate
/// index, so gradient directions are biased and straight gradient descent
/// zigzags.
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    n: usize,
}

impl Ellipsoid {
    /// Initializes the objective with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self { n }
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Ellipsoid {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.n)
    }
}

impl Objective for Ellipsoid {
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.iter()
            .enumerate()
            .map(|(i, xi)| (i + 1) as f64 * xi * xi)
            .sum()
    }
}

impl Gradient for Ellipsoid {
    fn gradient<Sx, Sgx>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sgx>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sgx: StorageMut<Self::Field, Dyn>,
    {
        gx.iter_mut()
            .zip(x.iter().enumerate())
            .for_each(|(gi, (i, xi))| *gi = 2.0 * (i + 1) as f64 * xi);
    }
}

impl TestFunction for Ellipsoid {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![OVector::from_element_generic(
            Dyn(self.n),
            nalgebra::Const::<1>,
            3.0,
        )]
    }

    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![OVector::zeros_generic(Dyn(self.n), nalgebra::Const::<1>)]
    }
}

/// [Rosenbrock function](https://en.wikipedia.org/wiki/Rosenbrock_function)
/// \[1,2\] (also known as Rosenbrock's valley or banana function).
///
/// The global minimum is inside a long, narrow, parabolic shaped flat valley.
/// The challenge is to find the solution inside the valley.
#[derive(Debug, Clone, Copy)]
pub struct Rosenbrock {
    a: f64,
    b: f64,
}

impl Rosenbrock {
    /// Initializes the objective with given parameters. The classic choice is
    /// `a = 1` and `b = 100`.
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }
}

impl Default for Rosenbrock {
    fn default() -> Self {
        Self::new(1.0, 100.0)
    }
}

impl Problem for Rosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(2)
    }
}

impl Objective for Rosenbrock {
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (self.a - x[0]).powi(2) + self.b * (x[1] - x[0] * x[0]).powi(2)
    }
}

impl Gradient for Rosenbrock {
    fn gradient<Sx, Sgx>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sgx>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sgx: StorageMut<Self::Field, Dyn>,
    {
        gx[0] = -2.0 * (self.a - x[0]) - 4.0 * self.b * x[0] * (x[1] - x[0] * x[0]);
        gx[1] = 2.0 * self.b * (x[1] - x[0] * x[0]);
    }
}

impl TestFunction for Rosenbrock {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![-1.2, 1.0], dvector![6.39, -0.221]]
    }

    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![dvector![self.a, self.a * self.a]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_evaluation_is_idempotent() {
        let f = Rosenbrock::default();
        let x = dvector![-1.2, 1.0];

        let first = f.value(&x);
        for _ in 0..10 {
            assert_eq!(f.value(&x), first);
        }
    }

    #[test]
    fn gradients_vanish_in_optima() {
        let sphere = Sphere::new(3);
        let ellipsoid = Ellipsoid::new(3);
        let rosenbrock = Rosenbrock::default();

        for x in sphere.optima() {
            let mut gx = x.clone_owned();
            sphere.gradient(&x, &mut gx);
            assert_eq!(gx.norm(), 0.0);
        }

        for x in ellipsoid.optima() {
            let mut gx = x.clone_owned();
            ellipsoid.gradient(&x, &mut gx);
            assert_eq!(gx.norm(), 0.0);
        }

        for x in rosenbrock.optima() {
            let mut gx = x.clone_owned();
            rosenbrock.gradient(&x, &mut gx);
            approx::assert_abs_diff_eq!(gx.norm(), 0.0);
        }
    }
}
