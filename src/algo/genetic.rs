//! Genetic algorithm.
//!
//! A [genetic algorithm](https://en.wikipedia.org/wiki/Genetic_algorithm) is
//! a population-based stochastic search. Each generation is produced from the
//! previous one by elitism (the best individuals survive unchanged),
//! crossover (combining two selected parents) and mutation (perturbing one
//! selected parent), with every individual kept inside the rectangular
//! domain.
//!
//! # References
//!
//! \[1\] [Genetic
//! Algorithms](https://link.springer.com/book/10.1007/978-3-662-44874-8)

use fastrand::Rng;
use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{convert, DimName, Dyn, OVector, U1};

use crate::core::{Domain, Objective, Optimum, Problem, Sample};
use crate::population::{Generation, SelectionScheme};
use crate::trace::{assemble, Counters, Trace};

/// Options for the [`Genetic`] algorithm.
#[derive(Debug, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct GeneticOptions<P: Problem> {
    /// Number of individuals in every generation. Default: `50`.
    population_size: usize,
    /// Number of best individuals that survive into the next generation
    /// unchanged, clamped to the population size. With a zero count the best
    /// fitness is not guaranteed to be non-worsening across generations.
    /// Default: `1`.
    elite_count: usize,
    /// Fraction of the non-elite slots filled by crossover of two parents,
    /// the rest being filled by mutation of one parent. Must be in `[0, 1]`.
    /// Default: `0.8`.
    crossover_fraction: f64,
    /// Probability of perturbing a coordinate during mutation. Default:
    /// `0.1`.
    mutation_probability: f64,
    /// Size of the mutation perturbation, relative to the width of the domain
    /// in the perturbed coordinate. Default: `0.1`.
    mutation_scale: P::Field,
    /// Strategy for selecting parents. Default:
    /// [`FitnessProportionate`](SelectionScheme::FitnessProportionate).
    selection: SelectionScheme,
    /// Maximum number of generations. Default: `100`.
    max_steps: usize,
    /// Maximum number of objective evaluations, checked between generations.
    /// Default: `10000`.
    max_obj_evals: usize,
}

// Not derived, because that would put a `Clone` bound on `P` itself.
impl<P: Problem> Clone for GeneticOptions<P> {
    fn clone(&self) -> Self {
        Self {
            population_size: self.population_size,
            elite_count: self.elite_count,
            crossover_fraction: self.crossover_fraction,
            mutation_probability: self.mutation_probability,
            mutation_scale: self.mutation_scale,
            selection: self.selection,
            max_steps: self.max_steps,
            max_obj_evals: self.max_obj_evals,
        }
    }
}

impl<P: Problem> Default for GeneticOptions<P> {
    fn default() -> Self {
        Self {
            population_size: 50,
            elite_count: 1,
            crossover_fraction: 0.8,
            mutation_probability: 0.1,
            mutation_scale: convert(0.1),
            selection: SelectionScheme::FitnessProportionate,
            max_steps: 100,
            max_obj_evals: 10_000,
        }
    }
}

/// Genetic algorithm.
///
/// See [module](self) documentation for more details.
pub struct Genetic<P: Problem> {
    options: GeneticOptions<P>,
    rng: Rng,
}

impl<P: Problem> Genetic<P> {
    /// Initializes the genetic algorithm with default options.
    ///
    /// All randomness of the run (population seeding, selection draws and
    /// mutation) comes from the given generator, so a fixed seed makes the
    /// whole run reproducible.
    pub fn new(p: &P, dom: &Domain<P::Field>, rng: Rng) -> Self {
        Self::with_options(p, dom, rng, GeneticOptions::default())
    }

    /// Initializes the genetic algorithm with given options.
    pub fn with_options(
        _: &P,
        _: &Domain<P::Field>,
        rng: Rng,
        options: GeneticOptions<P>,
    ) -> Self {
        Self { options, rng }
    }
}

impl<F: Objective> Genetic<F>
where
    F::Field: Sample,
{
    /// Minimizes the objective over the domain.
    ///
    /// The initial generation takes up to
    /// [`population_size`](GeneticOptions::population_size) individuals from
    /// `initial` (projected into the domain) and tops the rest up by uniform
    /// sampling; an empty slice means a fully random start. The run ends when
    /// one of the budgets is exhausted, which is ordinary termination, not an
    /// error. The best individual of the final generation is returned, or
    /// `None` when the population size is zero. When `trace` is requested,
    /// the returned [`Trace`] holds the whole generation produced by every
    /// step.
    pub fn minimize(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        initial: &[OVector<F::Field, Dyn>],
        trace: bool,
    ) -> (
        Option<Optimum<F::Field>>,
        Option<Trace<Generation<F::Field>>>,
    ) {
        let GeneticOptions {
            population_size,
            elite_count,
            crossover_fraction,
            mutation_probability,
            mutation_scale,
            selection,
            max_steps,
            max_obj_evals,
        } = self.options.clone();
        let rng = &mut self.rng;

        let elite_count = elite_count.min(population_size);

        let mut counters = Counters::new();
        let mut snapshots = if trace { Some(Vec::new()) } else { None };

        let mut generation = Generation::with_capacity(population_size);
        for x in initial.iter().take(population_size) {
            let mut x = x.clone();
            dom.project(&mut x);

            let fitness = f.value(&x);
            counters.count_objective();
            generation.push(x, fitness);
        }
        while generation.len() < population_size {
            let mut x = OVector::zeros_generic(Dyn(dom.dim()), U1::name());
            dom.sample(&mut x, rng);

            let fitness = f.value(&x);
            counters.count_objective();
            generation.push(x, fitness);
        }

        if generation.is_empty() {
            return (None, assemble(snapshots, counters));
        }

        let rest = population_size - elite_count;
        let crossover_count = ((crossover_fraction * rest as f64).round() as usize).min(rest);
        let mutation_count = rest - crossover_count;

        let mut steps = 0;

        while steps < max_steps && counters.objective() < max_obj_evals {
            // All parents of this generation are selected in one call, which
            // lets stochastic universal sampling spread its pointers over the
            // whole demand.
            let parents = selection.select(&generation, 2 * crossover_count + mutation_count, rng);

            let mut next = Generation::with_capacity(population_size);

            for i in &generation.sorted_indices()[..elite_count] {
                next.push(
                    generation.individuals()[*i].clone(),
                    generation.fitness()[*i],
                );
            }

            for pair in 0..crossover_count {
                let first = &generation.individuals()[parents[2 * pair]];
                let second = &generation.individuals()[parents[2 * pair + 1]];

                // Uniform crossover takes every coordinate from either parent
                // with equal probability.
                let mut child = first.clone();
                child.iter_mut().zip(second.iter()).for_each(|(ci, si)| {
                    if rng.bool() {
                        *ci = *si;
                    }
                });

                dom.project(&mut child);
                let fitness = f.value(&child);
                counters.count_objective();
                next.push(child, fitness);
            }

            for single in 0..mutation_count {
                let parent = &generation.individuals()[parents[2 * crossover_count + single]];

                let mut child = parent.clone();
                mutate(&mut child, dom, mutation_probability, mutation_scale, rng);

                dom.project(&mut child);
                let fitness = f.value(&child);
                counters.count_objective();
                next.push(child, fitness);
            }

            generation = next;
            steps += 1;

            if let Some(snapshots) = snapshots.as_mut() {
                snapshots.push(generation.clone());
            }

            if let Some(best) = generation.best() {
                debug!(
                    "generation {},\tbest fitness = {}",
                    steps,
                    generation.fitness()[best]
                );
            }
        }

        let optimum = generation
            .best()
            .map(|i| Optimum::new(generation.individuals()[i].clone(), generation.fitness()[i]));

        (optimum, assemble(snapshots, counters))
    }
}

/// Perturbs each coordinate with the given probability by a uniform offset
/// scaled to the domain width, or by a heavy-tailed offset where the width is
/// not finite.
fn mutate<T: Sample>(
    x: &mut OVector<T, Dyn>,
    dom: &Domain<T>,
    probability: f64,
    scale: T,
    rng: &mut Rng,
) {
    for (i, xi) in x.iter_mut().enumerate() {
        if rng.f64() >= probability {
            continue;
        }

        let width = dom.upper()[i] - dom.lower()[i];
        *xi += if width.is_finite() {
            let half: T = width * scale * convert(0.5);
            T::sample_uniform(-half, half, rng)
        } else {
            T::sample_any(rng) * scale
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::*;

    fn sphere_setup() -> (Sphere, Domain<f64>) {
        let f = Sphere::new(2);
        let dom = Domain::rect(vec![-5.0, -5.0], vec![5.0, 5.0]);
        (f, dom)
    }

    fn best_fitness(generation: &Generation<f64>) -> f64 {
        generation.fitness()[generation.best().unwrap()]
    }

    #[test]
    fn elitism_makes_best_fitness_non_worsening() {
        let (f, dom) = sphere_setup();

        let mut options = GeneticOptions::default();
        options
            .set_population_size(20)
            .set_elite_count(2)
            .set_max_steps(50);
        let mut genetic = Genetic::with_options(&f, &dom, Rng::with_seed(1234), options);

        let (optimum, trace) = genetic.minimize(&f, &dom, &[], true);
        let trace = trace.unwrap();

        assert!(optimum.is_some());
        assert!(trace
            .snapshots()
            .windows(2)
            .all(|pair| best_fitness(&pair[1]) <= best_fitness(&pair[0])));
    }

    #[test]
    fn no_elitism_forfeits_monotonicity() {
        let (f, dom) = sphere_setup();

        // Without elites and with violent mutation, the best individual is
        // regularly lost between generations.
        let mut options = GeneticOptions::default();
        options
            .set_population_size(2)
            .set_elite_count(0)
            .set_crossover_fraction(0.0)
            .set_mutation_probability(1.0)
            .set_mutation_scale(1.0)
            .set_max_steps(100);
        let mut genetic = Genetic::with_options(&f, &dom, Rng::with_seed(5), options);

        let (optimum, trace) = genetic.minimize(&f, &dom, &[], true);
        let trace = trace.unwrap();

        assert!(optimum.is_some());
        assert!(trace
            .snapshots()
            .windows(2)
            .any(|pair| best_fitness(&pair[1]) > best_fitness(&pair[0])));
    }

    #[test]
    fn all_elites_make_the_population_static() {
        let (f, dom) = sphere_setup();

        let mut options = GeneticOptions::default();
        options
            .set_population_size(4)
            .set_elite_count(4)
            .set_max_steps(10);
        let mut genetic = Genetic::with_options(&f, &dom, Rng::with_seed(99), options);

        let (_, trace) = genetic.minimize(&f, &dom, &[], true);
        let trace = trace.unwrap();

        // Only the initial generation is ever evaluated.
        assert_eq!(trace.counters().objective(), 4);

        let mut initial = trace.snapshots()[0].fitness().to_vec();
        initial.sort_by(|lhs, rhs| lhs.total_cmp(rhs));

        for generation in trace.snapshots() {
            let mut fitness = generation.fitness().to_vec();
            fitness.sort_by(|lhs, rhs| lhs.total_cmp(rhs));
            assert_eq!(fitness, initial);
        }
    }

    #[test]
    fn fixed_seed_gives_deterministic_output() {
        let (f, dom) = sphere_setup();

        let run = || {
            let mut options = GeneticOptions::default();
            options
                .set_population_size(20)
                .set_elite_count(2)
                .set_max_obj_evals(1000);
            let mut genetic = Genetic::with_options(&f, &dom, Rng::with_seed(2024), options);
            genetic.minimize(&f, &dom, &[], false)
        };

        let (first, _) = run();
        let (second, _) = run();

        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(first.x(), second.x());
        assert_eq!(first.value(), second.value());
    }

    #[test]
    fn population_stays_within_bounds() {
        let (f, dom) = sphere_setup();

        let mut options = GeneticOptions::default();
        options.set_population_size(10).set_max_steps(20);
        let mut genetic = Genetic::with_options(&f, &dom, Rng::with_seed(7), options);

        // The seed individual lies outside the bounds and must be projected.
        let seed = vec![nalgebra::dvector![10.0, -10.0]];
        let (_, trace) = genetic.minimize(&f, &dom, &seed, true);
        let trace = trace.unwrap();

        for generation in trace.snapshots() {
            assert_eq!(generation.len(), 10);
            for x in generation.individuals() {
                assert!(!dom.project(&mut x.clone()));
            }
        }
    }

    #[test]
    fn empty_population_gives_no_result() {
        let (f, dom) = sphere_setup();

        let mut options = GeneticOptions::default();
        options.set_population_size(0);
        let mut genetic = Genetic::with_options(&f, &dom, Rng::with_seed(0), options);

        let (optimum, trace) = genetic.minimize(&f, &dom, &[], true);
        let trace = trace.unwrap();

        assert!(optimum.is_none());
        assert!(trace.is_empty());
        assert_eq!(trace.counters().objective(), 0);
    }

    #[test]
    fn improves_on_random_start() {
        let (f, dom) = sphere_setup();
        let mut genetic = Genetic::new(&f, &dom, Rng::with_seed(42));

        let (optimum, trace) = genetic.minimize(&f, &dom, &[], true);
        let optimum = optimum.unwrap();
        let trace = trace.unwrap();

        let initial_best = best_fitness(&trace.snapshots()[0]);
        assert!(optimum.value() <= initial_best);
    }
}
