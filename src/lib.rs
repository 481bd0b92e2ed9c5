#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # Downhill
//!
//! A pure Rust library of iterative numerical optimization algorithms for
//! minimizing a scalar objective function over real vectors.
//!
//! This library provides three algorithm families written entirely in Rust: a
//! gradient-based descent framework with backtracking line search, a
//! derivative-free simplex search and a population-based stochastic search.
//! Bound constraints for variables are supported first-class. All algorithms
//! implement the same style of interface which gives full control over the
//! process, and every run can be instrumented with a [performance
//! trace](Trace) recording per-iteration states and evaluation counts.
//!
//! ## Algorithms
//!
//! * [Conjugate gradient](algo::conjugate_gradient) -- Recommended when the
//!   exact gradient is available; converges fast on smooth convex objectives.
//! * [Nelder-Mead](algo::nelder_mead) -- Derivative-free simplex search,
//!   useful for low-dimensionality problems without a usable gradient.
//! * [Genetic algorithm](algo::genetic) -- Population-based global search in
//!   a bounded region, useful when the objective has many local minima.
//!
//! ## Problem
//!
//! The problem of unconstrained minimization is about finding values of *n*
//! variables in which a scalar function of those variables attains its lowest
//! value. Mathematically, the problem is formulated as
//!
//! ```text
//! minimize f(x)
//!
//! where x = { x1, ..., xn }
//! ```
//!
//! Moreover, it is possible to add bound constraints to the variables. That
//! is:
//!
//! ```text
//! Li <= xi <= Ui for some bounds [L, U] for every i
//! ```
//!
//! The bounds can be negative/positive infinity, effectively making the
//! variable unconstrained.
//!
//! More sophisticated constraints (such as (in)equalities consisting of
//! multiple variables) are currently out of the scope of this library.
//!
//! When it comes to code, the objective is any type that implements the
//! [`Objective`] and [`Problem`] traits, and, for gradient-based algorithms,
//! the [`Gradient`] trait.
//!
//! ```rust
//! // Downhill is based on the `nalgebra` crate.
//! use downhill::nalgebra as na;
//! use downhill::{Domain, Objective, Problem};
//! use na::{Dyn, IsContiguous};
//!
//! // An objective is represented by a type.
//! struct Rosenbrock {
//!     a: f64,
//!     b: f64,
//! }
//!
//! impl Problem for Rosenbrock {
//!     // The numeric type. Usually f64 or f32.
//!     type Field = f64;
//!
//!     // Specification for the domain. At the very least, the dimension
//!     // must be known.
//!     fn domain(&self) -> Domain<Self::Field> {
//!         Domain::unconstrained(2)
//!     }
//! }
//!
//! impl Objective for Rosenbrock {
//!     // Calculate the objective value in a trial point.
//!     fn value<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//!     where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!     {
//!         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
//!     }
//! }
//! ```
//!
//! The previous example used unconstrained variables, but it is also possible
//! to specify bounds.
//!
//! ```rust
//! # use downhill::nalgebra as na;
//! # use downhill::*;
//! #
//! # struct Rosenbrock {
//! #     a: f64,
//! #     b: f64,
//! # }
//! #
//! impl Problem for Rosenbrock {
//! #     type Field = f64;
//!     // ...
//!
//!     fn domain(&self) -> Domain<Self::Field> {
//!         [(-10.0, 10.0), (-10.0, 10.0)].into_iter().collect()
//!     }
//! }
//! ```
//!
//! ## Minimizing
//!
//! When you have your objective available, pick an algorithm and run it.
//!
//! ```rust
//! use downhill::algo::NelderMead;
//! # use downhill::nalgebra as na;
//! # use downhill::{Domain, Objective, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Rosenbrock {
//! #     a: f64,
//! #     b: f64,
//! # }
//! #
//! # impl Problem for Rosenbrock {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Objective for Rosenbrock {
//! #     fn value<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
//! #     }
//! # }
//!
//! let f = Rosenbrock { a: 1.0, b: 1.0 };
//! let dom = f.domain();
//! let mut nelder_mead = NelderMead::new(&f, &dom);
//!
//! let initial = vec![
//!     na::dvector![-10.0, -5.0],
//!     na::dvector![-10.0, 5.0],
//!     na::dvector![10.0, -5.0],
//! ];
//!
//! let (result, _) = nelder_mead.minimize(&f, &initial, false);
//! let result = result.expect("initial simplex was not empty");
//!
//! println!("found value {} in {:?}", result.value(), result.x());
//! ```
//!
//! Passing `true` for the last argument makes the algorithm record a
//! [`Trace`]: the complete per-iteration history of its internal state
//! together with [`Counters`] of objective and gradient evaluations.
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
mod core;
pub mod population;
pub mod trace;

pub use core::*;
pub use trace::{Counters, Trace};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
