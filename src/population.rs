//! Abstractions and types for population-based search.
//!
//! The most important types are [`Generation`] and [`SelectionScheme`], used
//! by the [genetic algorithm](crate::algo::Genetic).

use std::cmp::Ordering;

use fastrand::Rng;
use nalgebra::{convert, Dyn, OVector};

use crate::core::{RealField, Sample};

/// One generation in a population-based algorithm.
///
/// A generation is an ordered collection of individuals (points) paired with
/// their fitness, where fitness is the objective value and lower is better.
/// There is one important invariant: the fitness of an individual always
/// equals the objective evaluated in its point. The genetic algorithm
/// produces a fresh generation each step, which makes it possible to retain
/// every historical generation in the [trace](crate::Trace) without aliasing.
#[derive(Debug, Clone)]
pub struct Generation<T: RealField + Copy> {
    individuals: Vec<OVector<T, Dyn>>,
    fitness: Vec<T>,
}

impl<T: RealField + Copy> Generation<T> {
    pub(crate) fn with_capacity(size: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(size),
            fitness: Vec::with_capacity(size),
        }
    }

    pub(crate) fn push(&mut self, x: OVector<T, Dyn>, fitness: T) {
        self.individuals.push(x);
        self.fitness.push(fitness);
    }

    /// Gets the number of individuals.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Determines whether the generation holds no individuals.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Gets the individuals in their original order.
    pub fn individuals(&self) -> &[OVector<T, Dyn>] {
        &self.individuals
    }

    /// Gets the fitness values, matching the order of
    /// [`individuals`](Generation::individuals).
    pub fn fitness(&self) -> &[T] {
        &self.fitness
    }

    /// Gets the index of the individual with the lowest fitness, if any.
    ///
    /// Individuals with non-finite fitness are ordered after all individuals
    /// with finite fitness.
    pub fn best(&self) -> Option<usize> {
        (0..self.len()).min_by(|lhs, rhs| cmp_fitness(self.fitness[*lhs], self.fitness[*rhs]))
    }

    /// Gets the indices of the individuals ordered by fitness from low to
    /// high.
    pub(crate) fn sorted_indices(&self) -> Vec<usize> {
        let mut indices = (0..self.len()).collect::<Vec<_>>();
        indices.sort_by(|lhs, rhs| cmp_fitness(self.fitness[*lhs], self.fitness[*rhs]));
        indices
    }
}

/// Compares two fitness values, ordering finite values before non-finite
/// ones.
pub(crate) fn cmp_fitness<T: RealField + Copy>(lhs: T, rhs: T) -> Ordering {
    if lhs.is_finite() && rhs.is_finite() {
        lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal)
    } else if lhs.is_finite() {
        Ordering::Less
    } else if rhs.is_finite() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Strategy for selecting parent individuals from a generation.
///
/// Every variant exposes a single capability: given a generation, produce a
/// weighted or randomized marginal selection of parents. Since lower fitness
/// is better, the weight-based variants invert fitness so that better
/// individuals get higher weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionScheme {
    /// Probability of selection is proportional to the inverted-fitness
    /// weight of the individual (roulette wheel).
    FitnessProportionate,
    /// A single random offset with evenly spaced pointers over the cumulative
    /// weight distribution selects all parents in one pass, with lower
    /// variance than independent proportional draws.
    StochasticUniversalSampling,
    /// Repeatedly samples a pair of individuals and selects the better one
    /// with the given probability, the other one otherwise. The probability
    /// makes the selection pressure a tunable parameter.
    Tournament {
        /// Probability of the better individual winning the tournament.
        probability: f64,
    },
}

impl SelectionScheme {
    /// Selects `count` parent indices from the generation.
    ///
    /// # Panics
    ///
    /// Panics if the generation is empty and `count > 0`.
    pub fn select<T: Sample>(
        &self,
        generation: &Generation<T>,
        count: usize,
        rng: &mut Rng,
    ) -> Vec<usize> {
        if count == 0 {
            return Vec::new();
        }

        assert!(
            !generation.is_empty(),
            "cannot select parents from an empty generation"
        );

        match self {
            SelectionScheme::FitnessProportionate => {
                match CumulativeWeights::from_fitness(&generation.fitness) {
                    Some(weights) => (0..count).map(|_| weights.spin(rng)).collect(),
                    None => uniform_draws(generation.len(), count, rng),
                }
            }
            SelectionScheme::StochasticUniversalSampling => {
                match CumulativeWeights::from_fitness(&generation.fitness) {
                    Some(weights) => weights.spaced_pointers(count, rng),
                    None => uniform_draws(generation.len(), count, rng),
                }
            }
            SelectionScheme::Tournament { probability } => (0..count)
                .map(|_| {
                    let first = rng.usize(0..generation.len());
                    let mut second = rng.usize(0..generation.len());
                    if generation.len() > 1 {
                        while second == first {
                            second = rng.usize(0..generation.len());
                        }
                    }

                    let (better, other) =
                        match cmp_fitness(generation.fitness[first], generation.fitness[second]) {
                            Ordering::Greater => (second, first),
                            _ => (first, second),
                        };

                    if rng.f64() < *probability {
                        better
                    } else {
                        other
                    }
                })
                .collect(),
        }
    }
}

fn uniform_draws(len: usize, count: usize, rng: &mut Rng) -> Vec<usize> {
    (0..count).map(|_| rng.usize(0..len)).collect()
}

/// Cumulative inverted-fitness weights for proportional selection.
struct CumulativeWeights<T> {
    cumulative: Vec<T>,
    total: T,
}

impl<T: Sample> CumulativeWeights<T> {
    /// Builds the weights, giving higher weight to lower fitness. Returns
    /// `None` when no individual has a finite fitness, in which case the
    /// caller should fall back to uniform selection.
    fn from_fitness(fitness: &[T]) -> Option<Self> {
        let mut best = None::<T>;
        let mut worst = None::<T>;
        for f in fitness.iter().copied().filter(|f| f.is_finite()) {
            best = Some(best.map_or(f, |b| if f < b { f } else { b }));
            worst = Some(worst.map_or(f, |w| if f > w { f } else { w }));
        }

        let (best, worst) = match (best, worst) {
            (Some(best), Some(worst)) => (best, worst),
            _ => return None,
        };

        // A positive offset keeps the worst finite individual selectable and
        // makes the distribution uniform when all fitness values are equal.
        let span = worst - best;
        let offset: T = if span > convert(0.0) {
            span * convert(1e-3)
        } else {
            convert(1.0)
        };

        let mut total: T = convert(0.0);
        let cumulative = fitness
            .iter()
            .map(|f| {
                if f.is_finite() {
                    total += worst - *f + offset;
                }
                total
            })
            .collect();

        Some(Self { cumulative, total })
    }

    /// One independent roulette wheel spin.
    fn spin(&self, rng: &mut Rng) -> usize {
        let needle = T::sample_uniform(convert(0.0), self.total, rng);
        self.find(needle)
    }

    /// Selects `count` indices with a single spin and evenly spaced pointers.
    fn spaced_pointers(&self, count: usize, rng: &mut Rng) -> Vec<usize> {
        let step = self.total / convert(count as f64);
        let start = T::sample_uniform(convert(0.0), step, rng);

        (0..count)
            .map(|k| self.find(start + step * convert(k as f64)))
            .collect()
    }

    fn find(&self, needle: T) -> usize {
        self.cumulative
            .iter()
            .position(|cum| needle < *cum)
            .unwrap_or(self.cumulative.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation(fitness: &[f64]) -> Generation<f64> {
        let mut generation = Generation::with_capacity(fitness.len());
        for (i, f) in fitness.iter().enumerate() {
            generation.push(nalgebra::dvector![i as f64], *f);
        }
        generation
    }

    #[test]
    fn best_prefers_finite() {
        let generation = generation(&[3.0, f64::NAN, 1.0, f64::INFINITY]);
        assert_eq!(generation.best(), Some(2));
    }

    #[test]
    fn proportionate_prefers_low_fitness() {
        let generation = generation(&[0.0, 100.0]);
        let mut rng = Rng::with_seed(3);

        let picks = SelectionScheme::FitnessProportionate.select(&generation, 1000, &mut rng);
        let better = picks.iter().filter(|i| **i == 0).count();

        // Weights are roughly 100.1 : 0.1.
        assert!(better > 950);
    }

    #[test]
    fn sus_selects_in_one_pass() {
        let generation = generation(&[1.0, 1.0, 1.0, 1.0]);
        let mut rng = Rng::with_seed(11);

        // Equal fitness means uniform weights, so evenly spaced pointers must
        // visit every individual exactly once.
        let mut picks = SelectionScheme::StochasticUniversalSampling.select(&generation, 4, &mut rng);
        picks.sort_unstable();
        assert_eq!(picks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn tournament_with_full_pressure_picks_better() {
        let generation = generation(&[5.0, 1.0]);
        let mut rng = Rng::with_seed(17);

        let picks =
            SelectionScheme::Tournament { probability: 1.0 }.select(&generation, 50, &mut rng);
        assert!(picks.iter().all(|i| *i == 1));
    }
}
