//! Conjugate gradient descent.
//!
//! [Conjugate
//! gradient](https://en.wikipedia.org/wiki/Nonlinear_conjugate_gradient_method)
//! is a gradient-based descent method. Each iteration moves along a search
//! direction by a step length chosen by the [line
//! search](crate::algo::line_search) and then combines the new negative
//! gradient with the previous direction, scaled by the Fletcher-Reeves
//! coefficient, to maintain approximate conjugacy between successive
//! directions.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [Function minimization by conjugate
//! gradients](https://academic.oup.com/comjnl/article/7/2/149/335311)

use getset::{CopyGetters, Getters, Setters};
use log::debug;
use nalgebra::{convert, DimName, Dyn, OVector, U1};
use thiserror::Error;

use super::line_search::{Backtracking, LineSearchError, LineSearchOptions};
use crate::core::{Domain, Gradient, Optimum, Problem};
use crate::trace::{assemble, Counters, Trace};

/// Options for [`ConjugateGradient`] descent.
#[derive(Debug, CopyGetters, Getters, Setters)]
pub struct ConjugateGradientOptions<P: Problem> {
    /// Gradient norm below which the run is considered converged. Default:
    /// `1e-6`.
    #[getset(get_copy = "pub", set = "pub")]
    tolerance: P::Field,
    /// Options of the inner line search.
    #[getset(get = "pub", set = "pub")]
    line_search: LineSearchOptions<P>,
}

// Not derived, because that would put a `Clone` bound on `P` itself.
impl<P: Problem> Clone for ConjugateGradientOptions<P> {
    fn clone(&self) -> Self {
        Self {
            tolerance: self.tolerance,
            line_search: self.line_search.clone(),
        }
    }
}

impl<P: Problem> Default for ConjugateGradientOptions<P> {
    fn default() -> Self {
        Self {
            tolerance: convert(1e-6),
            line_search: LineSearchOptions::default(),
        }
    }
}

/// Error returned from [`ConjugateGradient`] descent.
///
/// Both variants are fatal for the run; no partial result is produced.
#[derive(Debug, Error)]
pub enum ConjugateGradientError {
    /// The line search found no acceptable step length.
    #[error("line search failed: {0}")]
    LineSearch(#[from] LineSearchError),
    /// The squared gradient norm vanished, so the Fletcher-Reeves coefficient
    /// is undefined.
    #[error("gradient vanished, the conjugate direction update is undefined")]
    DegenerateGradient,
}

/// Conjugate gradient descent with Fletcher-Reeves direction update.
///
/// See [module](self) documentation for more details.
pub struct ConjugateGradient<P: Problem> {
    options: ConjugateGradientOptions<P>,
    line_search: Backtracking<P>,
    grad: OVector<P::Field, Dyn>,
    grad_new: OVector<P::Field, Dyn>,
    dir: OVector<P::Field, Dyn>,
}

impl<P: Problem> ConjugateGradient<P> {
    /// Initializes the descent with default options.
    pub fn new(p: &P, dom: &Domain<P::Field>) -> Self {
        Self::with_options(p, dom, ConjugateGradientOptions::default())
    }

    /// Initializes the descent with given options.
    pub fn with_options(p: &P, dom: &Domain<P::Field>, options: ConjugateGradientOptions<P>) -> Self {
        let dim = Dyn(dom.dim());
        let line_search = Backtracking::with_options(p, dom, options.line_search.clone());

        Self {
            options,
            line_search,
            grad: OVector::zeros_generic(dim, U1::name()),
            grad_new: OVector::zeros_generic(dim, U1::name()),
            dir: OVector::zeros_generic(dim, U1::name()),
        }
    }
}

impl<F: Gradient> ConjugateGradient<F> {
    /// Minimizes the objective starting from `x0`.
    ///
    /// The iteration `x <- x + a*p` runs until the gradient norm falls to the
    /// [tolerance](ConjugateGradientOptions::tolerance). There is no
    /// iteration cap; for objectives that are not well-behaved the run is
    /// expected to end with an error from the line search instead. When
    /// `trace` is requested, the returned [`Trace`] holds the point reached
    /// by every iteration.
    pub fn minimize(
        &mut self,
        f: &F,
        x0: OVector<F::Field, Dyn>,
        trace: bool,
    ) -> Result<
        (
            Optimum<F::Field>,
            Option<Trace<OVector<F::Field, Dyn>>>,
        ),
        ConjugateGradientError,
    > {
        let Self {
            options,
            line_search,
            grad,
            grad_new,
            dir,
        } = self;

        let mut counters = Counters::new();
        let mut snapshots = if trace { Some(Vec::new()) } else { None };

        let mut x = x0;

        f.gradient(&x, grad);
        counters.count_gradient();
        let mut fx = f.value(&x);
        counters.count_objective();

        dir.copy_from(grad);
        dir.neg_mut();

        while grad.norm() > options.tolerance {
            let gg = grad.norm_squared();
            if gg == convert(0.0) {
                return Err(ConjugateGradientError::DegenerateGradient);
            }

            let step = line_search.search(f, &x, fx, grad, dir, &mut counters)?;
            x.axpy(step, dir, convert(1.0));

            f.gradient(&x, grad_new);
            counters.count_gradient();
            fx = f.value(&x);
            counters.count_objective();

            // Fletcher-Reeves ratio of squared gradient norms. The previous
            // direction is never reset to the plain negative gradient.
            let beta = grad_new.norm_squared() / gg;
            dir.iter_mut()
                .zip(grad_new.iter())
                .for_each(|(di, gi)| *di = beta * *di - *gi);

            grad.copy_from(grad_new);

            if let Some(snapshots) = snapshots.as_mut() {
                snapshots.push(x.clone());
            }

            debug!("step = {}\t|grad| = {}\tfx = {}", step, grad.norm(), fx);
        }

        Ok((Optimum::new(x, fx), assemble(snapshots, counters)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::*;

    #[test]
    fn sphere_from_3_4() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut descent = ConjugateGradient::new(&f, &dom);

        let (optimum, _) = descent
            .minimize(&f, nalgebra::dvector![3.0, 4.0], false)
            .unwrap();

        assert!(f.is_optimum(optimum.x(), 1e-6));

        let mut gx = optimum.x().clone_owned();
        f.gradient(optimum.x(), &mut gx);
        assert!(gx.norm() <= 1e-6);
    }

    #[test]
    fn sphere_exact_evaluation_counts() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut descent = ConjugateGradient::new(&f, &dom);

        let (optimum, trace) = descent
            .minimize(&f, nalgebra::dvector![3.0, 4.0], true)
            .unwrap();
        let trace = trace.unwrap();

        // The first backtracking trial overshoots, the second lands exactly
        // in the minimum, so the whole run is a single iteration.
        assert_eq!(optimum.value(), 0.0);
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.counters().objective(), 4);
        assert_eq!(trace.counters().gradient(), 2);
    }

    #[test]
    fn ellipsoid() {
        let f = Ellipsoid::new(2);
        let dom = f.domain();
        let mut descent = ConjugateGradient::new(&f, &dom);

        let (optimum, trace) = descent
            .minimize(&f, nalgebra::dvector![3.0, 4.0], true)
            .unwrap();
        let trace = trace.unwrap();

        assert!(f.is_optimum(optimum.x(), 1e-4));
        assert!(!trace.is_empty());
        assert!(trace.counters().objective() >= trace.len());

        // Every snapshot is a complete point of the right dimension.
        assert!(trace.snapshots().iter().all(|x| x.nrows() == 2));
    }

    #[test]
    fn already_converged_start() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut descent = ConjugateGradient::new(&f, &dom);

        let (optimum, trace) = descent
            .minimize(&f, nalgebra::dvector![0.0, 0.0], true)
            .unwrap();
        let trace = trace.unwrap();

        assert_eq!(optimum.value(), 0.0);
        assert!(trace.is_empty());
        assert_eq!(trace.counters().gradient(), 1);
    }
}
