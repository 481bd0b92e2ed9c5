//! Nelder-Mead (simplex) search.
//!
//! [Nelder-Mead](https://en.wikipedia.org/wiki/Nelder%E2%80%93Mead_method) is
//! a popular derivative-free optimization algorithm. It keeps a
//! [simplex](https://en.wikipedia.org/wiki/Simplex) of candidate points and
//! transforms it by reflection, expansion, contraction and shrinkage based on
//! comparisons of the objective values. Unlike the textbook formulation, the
//! simplex may hold any number of points greater than one, not necessarily
//! _n + 1_.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [A simplex method for function
//! minimization](https://academic.oup.com/comjnl/article/7/4/308/354237)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{convert, DimName, Dyn, OVector, U1};

use crate::core::{Domain, Objective, Optimum, Problem, RealField};
use crate::population::cmp_fitness;
use crate::trace::{assemble, Counters, Trace};

/// An ordered collection of candidate points paired with their objective
/// values.
///
/// The value of every entry equals the objective evaluated in its point
/// (non-finite values are stored as positive infinity). The search replaces
/// the simplex wholesale each iteration, so a [trace](crate::Trace) can
/// retain every historical simplex without aliasing.
#[derive(Debug, Clone)]
pub struct Simplex<T: RealField + Copy> {
    points: Vec<OVector<T, Dyn>>,
    values: Vec<T>,
}

impl<T: RealField + Copy> Simplex<T> {
    fn with_capacity(size: usize) -> Self {
        Self {
            points: Vec::with_capacity(size),
            values: Vec::with_capacity(size),
        }
    }

    fn push(&mut self, x: OVector<T, Dyn>, value: T) {
        self.points.push(x);
        self.values.push(value);
    }

    /// Gets the number of points in the simplex.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Determines whether the simplex holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Gets the points in their original order.
    pub fn points(&self) -> &[OVector<T, Dyn>] {
        &self.points
    }

    /// Gets the objective values, matching the order of
    /// [`points`](Simplex::points).
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Gets the index of the point with the lowest value, if any.
    pub fn best(&self) -> Option<usize> {
        (0..self.len()).min_by(|lhs, rhs| cmp_fitness(self.values[*lhs], self.values[*rhs]))
    }

    /// Gets the spread of values across the simplex (the difference between
    /// the highest and the lowest value). Zero for less than two points.
    pub fn spread(&self) -> T {
        let mut min = None::<T>;
        let mut max = None::<T>;

        for value in self.values.iter().copied() {
            min = Some(min.map_or(value, |m| if value < m { value } else { m }));
            max = Some(max.map_or(value, |m| if value > m { value } else { m }));
        }

        match (min, max) {
            (Some(min), Some(max)) => max - min,
            _ => convert(0.0),
        }
    }
}

/// Options for [`NelderMead`] search.
#[derive(Debug, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct NelderMeadOptions<P: Problem> {
    /// Maximum number of iterations. Default: `1000`.
    max_steps: usize,
    /// Maximum number of objective evaluations, checked between iterations.
    /// Default: `10000`.
    max_obj_evals: usize,
    /// Convergence tolerance on the spread of values across the simplex.
    /// Default: square root of the machine epsilon.
    tolerance: P::Field,
    /// Coefficient for the reflection operation. Default: `1`.
    reflection_coeff: P::Field,
    /// Coefficient for the expansion operation. Default: `2`.
    expansion_coeff: P::Field,
    /// Coefficient for the contraction operations. Default: `0.5`.
    contraction_coeff: P::Field,
    /// Coefficient for the shrink operation. Default: `0.5`.
    shrink_coeff: P::Field,
}

// Not derived, because that would put a `Clone` bound on `P` itself.
impl<P: Problem> Clone for NelderMeadOptions<P> {
    fn clone(&self) -> Self {
        Self {
            max_steps: self.max_steps,
            max_obj_evals: self.max_obj_evals,
            tolerance: self.tolerance,
            reflection_coeff: self.reflection_coeff,
            expansion_coeff: self.expansion_coeff,
            contraction_coeff: self.contraction_coeff,
            shrink_coeff: self.shrink_coeff,
        }
    }
}

impl<P: Problem> Default for NelderMeadOptions<P> {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            max_obj_evals: 10_000,
            tolerance: P::Field::EPSILON_SQRT,
            reflection_coeff: convert(1.0),
            expansion_coeff: convert(2.0),
            contraction_coeff: convert(0.5),
            shrink_coeff: convert(0.5),
        }
    }
}

/// Nelder-Mead search.
///
/// See [module](self) documentation for more details.
pub struct NelderMead<P: Problem> {
    options: NelderMeadOptions<P>,
    centroid: OVector<P::Field, Dyn>,
    reflection: OVector<P::Field, Dyn>,
    expansion: OVector<P::Field, Dyn>,
    contraction: OVector<P::Field, Dyn>,
}

impl<P: Problem> NelderMead<P> {
    /// Initializes Nelder-Mead search with default options.
    pub fn new(p: &P, dom: &Domain<P::Field>) -> Self {
        Self::with_options(p, dom, NelderMeadOptions::default())
    }

    /// Initializes Nelder-Mead search with given options.
    pub fn with_options(_: &P, dom: &Domain<P::Field>, options: NelderMeadOptions<P>) -> Self {
        let dim = Dyn(dom.dim());

        Self {
            options,
            centroid: OVector::zeros_generic(dim, U1::name()),
            reflection: OVector::zeros_generic(dim, U1::name()),
            expansion: OVector::zeros_generic(dim, U1::name()),
            contraction: OVector::zeros_generic(dim, U1::name()),
        }
    }
}

impl<F: Objective> NelderMead<F> {
    /// Minimizes the objective over simplices built from the given initial
    /// points.
    ///
    /// The run ends when the spread of values falls to the
    /// [tolerance](NelderMeadOptions::tolerance) or one of the budgets is
    /// exhausted; hitting a budget is ordinary termination, not an error. The
    /// best point of the final simplex is returned, or `None` when no initial
    /// point was given. When `trace` is requested, the returned [`Trace`]
    /// holds the whole simplex produced by every iteration.
    pub fn minimize(
        &mut self,
        f: &F,
        initial: &[OVector<F::Field, Dyn>],
        trace: bool,
    ) -> (
        Option<Optimum<F::Field>>,
        Option<Trace<Simplex<F::Field>>>,
    ) {
        let NelderMeadOptions {
            max_steps,
            max_obj_evals,
            tolerance,
            reflection_coeff,
            expansion_coeff,
            contraction_coeff,
            shrink_coeff,
        } = self.options.clone();

        let Self {
            centroid,
            reflection,
            expansion,
            contraction,
            ..
        } = self;

        let mut counters = Counters::new();
        let mut snapshots = if trace { Some(Vec::new()) } else { None };

        let mut simplex = Simplex::with_capacity(initial.len());
        for x in initial {
            let value = nan_to_inf(f.value(x));
            counters.count_objective();
            simplex.push(x.clone(), value);
        }

        let k = simplex.len();

        if k < 2 {
            // Not enough points for any simplex transformation. The best of
            // what was given (if anything) is the answer.
            let best = simplex
                .best()
                .map(|i| Optimum::new(simplex.points[i].clone(), simplex.values[i]));
            return (best, assemble(snapshots, counters));
        }

        let mut sort_perm = (0..k).collect::<Vec<_>>();
        let mut steps = 0;

        loop {
            // Establish the ordering of simplex points. Ties keep their
            // previous relative order.
            sort_perm.sort_by(|lhs, rhs| cmp_fitness(simplex.values[*lhs], simplex.values[*rhs]));

            if steps >= max_steps
                || counters.objective() >= max_obj_evals
                || simplex.spread() <= tolerance
            {
                break;
            }

            let best = sort_perm[0];
            let second_worst = sort_perm[k - 2];
            let worst = sort_perm[k - 1];

            // Centroid of all points but the worst.
            centroid.fill(convert(0.0));
            for i in &sort_perm[..k - 1] {
                *centroid += &simplex.points[*i];
            }
            *centroid /= convert((k - 1) as f64);

            offset_from(reflection, centroid, &simplex.points[worst], reflection_coeff);
            let reflection_value = nan_to_inf(f.value(reflection));
            counters.count_objective();

            let operation = if reflection_value < simplex.values[best] {
                // The reflected point is the best so far. Try to go farther
                // along the same direction.
                offset_from(expansion, centroid, &simplex.points[worst], expansion_coeff);
                let expansion_value = nan_to_inf(f.value(expansion));
                counters.count_objective();

                if expansion_value < reflection_value {
                    simplex.points[worst].copy_from(expansion);
                    simplex.values[worst] = expansion_value;
                    "expansion"
                } else {
                    simplex.points[worst].copy_from(reflection);
                    simplex.values[worst] = reflection_value;
                    "reflection"
                }
            } else if reflection_value < simplex.values[second_worst] {
                // An ordinary improvement. Just replace the worst point.
                simplex.points[worst].copy_from(reflection);
                simplex.values[worst] = reflection_value;
                "reflection"
            } else {
                // The reflected point would still be the worst or the second
                // to worst. Try a contraction.
                let (contraction_value, accepted) =
                    if reflection_value < simplex.values[worst] {
                        // Contract on the outer side, toward the reflection.
                        offset_from(
                            contraction,
                            centroid,
                            &simplex.points[worst],
                            contraction_coeff,
                        );
                        let value = nan_to_inf(f.value(contraction));
                        (value, value <= reflection_value)
                    } else {
                        // Contract on the inner side, toward the worst point.
                        // Strict improvement over the worst value is required.
                        offset_from(
                            contraction,
                            centroid,
                            &simplex.points[worst],
                            -contraction_coeff,
                        );
                        let value = nan_to_inf(f.value(contraction));
                        (value, value < simplex.values[worst])
                    };
                counters.count_objective();

                if accepted {
                    simplex.points[worst].copy_from(contraction);
                    simplex.values[worst] = contraction_value;
                    "contraction"
                } else {
                    // The contraction did not improve anything. Shrink the
                    // whole simplex toward the best point.
                    for i in &sort_perm[1..] {
                        let (best_point, shrunk) = pick_two(&mut simplex.points, best, *i);
                        shrunk
                            .iter_mut()
                            .zip(best_point.iter())
                            .for_each(|(xi, bi)| *xi = *bi + shrink_coeff * (*xi - *bi));

                        simplex.values[*i] = nan_to_inf(f.value(&*shrunk));
                        counters.count_objective();
                    }
                    "shrink"
                }
            };

            steps += 1;

            if let Some(snapshots) = snapshots.as_mut() {
                snapshots.push(simplex.clone());
            }

            debug!(
                "performed {},\tvalues = {} - {}",
                operation,
                simplex.values[sort_perm[0]],
                simplex.values[sort_perm[k - 1]]
            );
        }

        let best = sort_perm[0];
        let optimum = Optimum::new(simplex.points[best].clone(), simplex.values[best]);

        (Some(optimum), assemble(snapshots, counters))
    }
}

/// Computes `out = from + t * (from - away)`, the point on the line through
/// `away` and `from`, mirrored behind `from` for positive `t`.
fn offset_from<T: RealField + Copy>(
    out: &mut OVector<T, Dyn>,
    from: &OVector<T, Dyn>,
    away: &OVector<T, Dyn>,
    t: T,
) {
    out.iter_mut()
        .zip(from.iter().zip(away.iter()))
        .for_each(|(oi, (fi, ai))| *oi = *fi + t * (*fi - *ai));
}

/// Gets mutable access to two distinct entries of a slice.
fn pick_two<E>(entries: &mut [E], first: usize, second: usize) -> (&E, &mut E) {
    assert!(first != second);

    if first < second {
        let (head, tail) = entries.split_at_mut(second);
        (&head[first], &mut tail[0])
    } else {
        let (head, tail) = entries.split_at_mut(first);
        (&tail[0], &mut head[second])
    }
}

fn nan_to_inf<T: RealField + Copy>(value: T) -> T {
    if value.is_finite() {
        value
    } else {
        // Not finite also covers NaN and negative infinity.
        convert(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::*;

    fn initial_simplex() -> Vec<OVector<f64, Dyn>> {
        vec![
            nalgebra::dvector![3.0, 4.0],
            nalgebra::dvector![4.0, 3.0],
            nalgebra::dvector![5.0, 5.0],
        ]
    }

    #[test]
    fn sphere_improves_on_initial_simplex() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = NelderMeadOptions::default();
        options.set_tolerance(0.0).set_max_obj_evals(500);
        let mut nelder_mead = NelderMead::with_options(&f, &dom, options);

        let (optimum, _) = nelder_mead.minimize(&f, &initial_simplex(), false);
        let optimum = optimum.unwrap();

        // The best initial point is (3, 4) with value 25.
        assert!(optimum.value() < 25.0);
    }

    #[test]
    fn sphere_converges() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut nelder_mead = NelderMead::new(&f, &dom);

        let (optimum, _) = nelder_mead.minimize(&f, &initial_simplex(), false);

        assert!(optimum.unwrap().value() < 1e-4);
    }

    #[test]
    fn best_not_worse_than_any_initial_point() {
        let f = Rosenbrock::new(1.0, 100.0);
        let dom = f.domain();
        let mut nelder_mead = NelderMead::new(&f, &dom);

        let initial = vec![
            nalgebra::dvector![-1.2, 1.0],
            nalgebra::dvector![0.0, 0.0],
            nalgebra::dvector![2.0, -1.0],
            nalgebra::dvector![1.5, 1.5],
        ];
        let initial_values = initial.iter().map(|x| f.value(x)).collect::<Vec<_>>();

        let (optimum, _) = nelder_mead.minimize(&f, &initial, false);
        let optimum = optimum.unwrap();

        assert!(initial_values.iter().all(|v| optimum.value() <= *v));
    }

    #[test]
    fn empty_simplex_gives_no_result() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut nelder_mead = NelderMead::new(&f, &dom);

        let (optimum, trace) = nelder_mead.minimize(&f, &[], true);
        let trace = trace.unwrap();

        assert!(optimum.is_none());
        assert!(trace.is_empty());
        assert_eq!(trace.counters().objective(), 0);
    }

    #[test]
    fn single_point_is_returned_without_iterating() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut nelder_mead = NelderMead::new(&f, &dom);

        let (optimum, trace) = nelder_mead.minimize(&f, &[nalgebra::dvector![1.0, 2.0]], true);
        let optimum = optimum.unwrap();
        let trace = trace.unwrap();

        assert_eq!(optimum.value(), 5.0);
        assert!(trace.is_empty());
        assert_eq!(trace.counters().objective(), 1);
    }

    #[test]
    fn trace_snapshots_are_complete_simplices() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = NelderMeadOptions::default();
        options.set_max_steps(10);
        let mut nelder_mead = NelderMead::with_options(&f, &dom, options);

        let (_, trace) = nelder_mead.minimize(&f, &initial_simplex(), true);
        let trace = trace.unwrap();

        assert_eq!(trace.len(), 10);

        for simplex in trace.snapshots() {
            assert_eq!(simplex.len(), 3);
            // Stored values match re-evaluation of the objective, which is
            // idempotent for an unchanged point.
            for (x, value) in simplex.points().iter().zip(simplex.values()) {
                assert_eq!(f.value(x), *value);
            }
        }
    }

    #[test]
    fn evaluation_budget_terminates_the_run() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = NelderMeadOptions::default();
        options
            .set_tolerance(0.0)
            .set_max_steps(usize::MAX)
            .set_max_obj_evals(500);
        let mut nelder_mead = NelderMead::with_options(&f, &dom, options);

        let (optimum, trace) = nelder_mead.minimize(&f, &initial_simplex(), true);
        let trace = trace.unwrap();

        assert!(optimum.is_some());
        assert!(trace.counters().objective() >= 500);
        // The budget is checked between iterations, so the overshoot is at
        // most one iteration worth of evaluations.
        assert!(trace.counters().objective() < 505);
    }

    #[test]
    fn accepts_non_clone_objective() {
        use nalgebra::{storage::Storage, IsContiguous, Vector};

        struct Paraboloid {
            offset: f64,
        }

        impl Problem for Paraboloid {
            type Field = f64;

            fn domain(&self) -> Domain<Self::Field> {
                Domain::unconstrained(2)
            }
        }

        impl Objective for Paraboloid {
            fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
            where
                Sx: Storage<Self::Field, Dyn> + IsContiguous,
            {
                (x[0] - self.offset).powi(2) + x[1].powi(2)
            }
        }

        let f = Paraboloid { offset: 1.0 };
        let dom = f.domain();
        let mut nelder_mead = NelderMead::new(&f, &dom);

        let (optimum, _) = nelder_mead.minimize(&f, &initial_simplex(), false);

        assert!(optimum.unwrap().value() < 1e-4);
    }

    #[test]
    fn inner_contraction_requires_strict_improvement() {
        use nalgebra::{storage::Storage, IsContiguous, Vector};

        // A step function where the inner contraction point evaluates exactly
        // to the worst value, so it must be rejected and the simplex shrunk.
        struct Plateau;

        impl Problem for Plateau {
            type Field = f64;

            fn domain(&self) -> Domain<Self::Field> {
                Domain::unconstrained(1)
            }
        }

        impl Objective for Plateau {
            fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
            where
                Sx: Storage<Self::Field, Dyn> + IsContiguous,
            {
                if x[0] < 0.0 {
                    2.0
                } else if x[0] == 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }

        let f = Plateau;
        let dom = f.domain();

        let mut options = NelderMeadOptions::default();
        options.set_max_steps(1);
        let mut nelder_mead = NelderMead::with_options(&f, &dom, options);

        // Best is 0 with value 0, worst is 1 with value 1. The reflection
        // (-1) evaluates to 2 and the inner contraction (0.5) evaluates to 1,
        // matching the worst value without improving on it.
        let initial = vec![nalgebra::dvector![0.0], nalgebra::dvector![1.0]];
        let (optimum, trace) = nelder_mead.minimize(&f, &initial, true);
        let trace = trace.unwrap();

        // Two initial evaluations, reflection, contraction, plus one shrink
        // evaluation of the single non-best point.
        assert_eq!(trace.counters().objective(), 5);
        assert_eq!(optimum.unwrap().value(), 0.0);
    }
}
