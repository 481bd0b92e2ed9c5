//! Problem domain definition (dimensionality, bound constraints).

use fastrand::Rng;
use na::{Dim, DimName};
use nalgebra as na;
use nalgebra::{storage::StorageMut, OVector, Vector};

use super::base::{RealField, Sample};

/// Domain for a problem.
///
/// The domain is a rectangular region given by lower and upper bound vectors.
/// Positive and negative infinity can be used to leave a variable unbounded in
/// that direction.
#[derive(Debug, Clone)]
pub struct Domain<T: RealField + Copy> {
    lower: OVector<T, na::Dyn>,
    upper: OVector<T, na::Dyn>,
}

impl<T: RealField + Copy> Domain<T> {
    /// Creates unconstrained domain with given dimensionality.
    pub fn unconstrained(dim: usize) -> Self {
        assert!(dim > 0, "empty domain");

        let inf = T::from_subset(&f64::INFINITY);
        let n = na::Dyn(dim);
        let one = na::Const::<1>;

        Self {
            lower: OVector::from_element_generic(n, one, -inf),
            upper: OVector::from_element_generic(n, one, inf),
        }
    }

    /// Creates rectangular domain with given lower and upper bounds.
    ///
    /// If the entire domain is unconstrained, use [`Domain::unconstrained`]
    /// instead.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are empty, have different lengths or if
    /// `lower[i] > upper[i]` for some `i`.
    pub fn rect(lower: Vec<T>, upper: Vec<T>) -> Self {
        assert!(
            lower.len() == upper.len(),
            "lower and upper have different size"
        );

        let dim = lower.len();
        assert!(dim > 0, "empty domain");
        assert!(
            lower.iter().zip(upper.iter()).all(|(li, ui)| li <= ui),
            "lower bound exceeds upper bound"
        );

        let dim = na::Dyn(dim);
        let lower = OVector::from_vec_generic(dim, na::U1::name(), lower);
        let upper = OVector::from_vec_generic(dim, na::U1::name(), upper);

        Self { lower, upper }
    }

    /// Gets the dimensionality of the domain.
    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// Gets the lower bound vector.
    pub fn lower(&self) -> &OVector<T, na::Dyn> {
        &self.lower
    }

    /// Gets the upper bound vector.
    pub fn upper(&self) -> &OVector<T, na::Dyn> {
        &self.upper
    }

    /// Projects given point into the domain by clamping the coordinates that
    /// are out of bounds.
    ///
    /// Returns true if the point was not feasible before the projection.
    pub fn project<D, Sx>(&self, x: &mut Vector<T, D, Sx>) -> bool
    where
        D: Dim,
        Sx: StorageMut<T, D>,
    {
        let mut not_feasible = false;

        self.lower
            .iter()
            .zip(self.upper.iter())
            .zip(x.iter_mut())
            .for_each(|((li, ui), xi)| {
                if &*xi < li {
                    *xi = *li;
                    not_feasible = true;
                } else if &*xi > ui {
                    *xi = *ui;
                    not_feasible = true;
                }
            });

        not_feasible
    }

    /// Projects given point into the domain in given dimension.
    pub fn project_in<D, Sx>(&self, x: &mut Vector<T, D, Sx>, i: usize) -> bool
    where
        D: Dim,
        Sx: StorageMut<T, D>,
    {
        let li = self.lower[(i, 0)];
        let ui = self.upper[(i, 0)];
        let xi = &mut x[(i, 0)];

        if *xi < li {
            *xi = li;
            true
        } else if *xi > ui {
            *xi = ui;
            true
        } else {
            false
        }
    }

    /// Samples a point in the domain.
    ///
    /// Coordinates with two finite bounds are sampled uniformly within them.
    /// Unbounded coordinates are sampled from a heavy-tailed distribution,
    /// mirrored into the feasible side when one bound is finite.
    pub fn sample<D, Sx>(&self, x: &mut Vector<T, D, Sx>, rng: &mut Rng)
    where
        D: Dim,
        Sx: StorageMut<T, D> + na::IsContiguous,
        T: Sample,
    {
        x.iter_mut()
            .zip(self.lower.iter().copied().zip(self.upper.iter().copied()))
            .for_each(|(xi, (li, ui))| {
                *xi = if !li.is_finite() || !ui.is_finite() {
                    let random = T::sample_any(rng);

                    if li.is_finite() || ui.is_finite() {
                        let clamped = random.max(li).min(ui);
                        let delta = clamped - random;
                        clamped + delta
                    } else {
                        random
                    }
                } else {
                    T::sample_uniform(li, ui, rng)
                };
            });
    }
}

impl<T: RealField + Copy> FromIterator<(T, T)> for Domain<T> {
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let (lower, upper): (Vec<_>, Vec<_>) = iter.into_iter().unzip();
        Self::rect(lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_clamps_out_of_bounds() {
        let dom = Domain::rect(vec![0.0, -1.0], vec![1.0, 1.0]);

        let mut x = nalgebra::dvector![0.5, 0.5];
        assert!(!dom.project(&mut x));
        assert_eq!(x, nalgebra::dvector![0.5, 0.5]);

        let mut x = nalgebra::dvector![-2.0, 3.0];
        assert!(dom.project(&mut x));
        assert_eq!(x, nalgebra::dvector![0.0, 1.0]);
    }

    #[test]
    fn sample_stays_in_bounds() {
        let dom = Domain::rect(vec![-5.0, 0.0], vec![5.0, 0.5]);
        let mut rng = Rng::with_seed(7);
        let mut x = nalgebra::dvector![0.0, 0.0];

        for _ in 0..100 {
            dom.sample(&mut x, &mut rng);
            assert!(!dom.project(&mut x.clone()));
        }
    }
}
