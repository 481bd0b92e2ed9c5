//! Backtracking line search.
//!
//! Given a point and a descent direction, a [line
//! search](https://en.wikipedia.org/wiki/Line_search) looks for a step length
//! that yields a sufficient decrease of the objective along the direction.
//! This implementation backtracks from an initial step, shrinking it until
//! the Armijo condition
//!
//! ```text
//! f(x + a*p) <= f(x) + c1 * a * (grad f(x) . p)
//! ```
//!
//! is satisfied. It is used by the [descent
//! framework](crate::algo::conjugate_gradient).
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{convert, storage::Storage, Dyn, DimName, IsContiguous, OVector, Vector, U1};
use thiserror::Error;

use crate::core::{Domain, Objective, Problem};
use crate::trace::Counters;

/// Options for [`Backtracking`] line search.
#[derive(Debug, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct LineSearchOptions<P: Problem> {
    /// Step length tried first. Default: `1`.
    initial_step: P::Field,
    /// Coefficient of the sufficient decrease (Armijo) condition. Default:
    /// `1e-4`.
    sufficient_decrease: P::Field,
    /// Factor by which the step length shrinks after a rejected trial.
    /// Default: `0.5`.
    shrink_factor: P::Field,
    /// Maximum number of trial evaluations before giving up. Default: `40`.
    max_trials: usize,
}

// Not derived, because that would put a `Clone` bound on `P` itself.
impl<P: Problem> Clone for LineSearchOptions<P> {
    fn clone(&self) -> Self {
        Self {
            initial_step: self.initial_step,
            sufficient_decrease: self.sufficient_decrease,
            shrink_factor: self.shrink_factor,
            max_trials: self.max_trials,
        }
    }
}

impl<P: Problem> Default for LineSearchOptions<P> {
    fn default() -> Self {
        Self {
            initial_step: convert(1.0),
            sufficient_decrease: convert(1e-4),
            shrink_factor: convert(0.5),
            max_trials: 40,
        }
    }
}

/// Error returned from [`Backtracking`] line search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineSearchError {
    /// No step length satisfying the sufficient decrease condition was found
    /// within the trial budget. Fatal for the enclosing descent run.
    #[error("no step length satisfies the sufficient decrease condition")]
    NoStepFound,
}

/// Backtracking line search.
///
/// See [module](self) documentation for more details.
pub struct Backtracking<P: Problem> {
    options: LineSearchOptions<P>,
    x_trial: OVector<P::Field, Dyn>,
}

impl<P: Problem> Backtracking<P> {
    /// Initializes the line search with default options.
    pub fn new(p: &P, dom: &Domain<P::Field>) -> Self {
        Self::with_options(p, dom, LineSearchOptions::default())
    }

    /// Initializes the line search with given options.
    pub fn with_options(_: &P, dom: &Domain<P::Field>, options: LineSearchOptions<P>) -> Self {
        Self {
            options,
            x_trial: OVector::zeros_generic(Dyn(dom.dim()), U1::name()),
        }
    }
}

impl<F: Objective> Backtracking<F> {
    /// Chooses a step length along `p` from `x`.
    ///
    /// `fx` and `gx` must be the objective value and the gradient in `x`. The
    /// direction `p` must be a descent direction (`gx . p < 0`); this is not
    /// verified here and is the responsibility of the direction update rule
    /// of the caller.
    ///
    /// Every trial costs one objective evaluation counted in `counters`.
    pub fn search<Sx, Sg, Sp>(
        &mut self,
        f: &F,
        x: &Vector<F::Field, Dyn, Sx>,
        fx: F::Field,
        gx: &Vector<F::Field, Dyn, Sg>,
        p: &Vector<F::Field, Dyn, Sp>,
        counters: &mut Counters,
    ) -> Result<F::Field, LineSearchError>
    where
        Sx: Storage<F::Field, Dyn> + IsContiguous,
        Sg: Storage<F::Field, Dyn>,
        Sp: Storage<F::Field, Dyn>,
    {
        let LineSearchOptions {
            initial_step,
            sufficient_decrease,
            shrink_factor,
            max_trials,
        } = self.options.clone();

        let slope = gx.dot(p);
        let mut step = initial_step;

        for _ in 0..max_trials {
            self.x_trial
                .iter_mut()
                .zip(x.iter().zip(p.iter()))
                .for_each(|(ti, (xi, pi))| *ti = *xi + step * *pi);

            let f_trial = f.value(&self.x_trial);
            counters.count_objective();

            if f_trial <= fx + sufficient_decrease * step * slope {
                debug!("accepted step {} with value {}", step, f_trial);
                return Ok(step);
            }

            step *= shrink_factor;
        }

        Err(LineSearchError::NoStepFound)
    }
}
