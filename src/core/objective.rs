use nalgebra::{
    storage::{Storage, StorageMut},
    Dyn, IsContiguous, Vector,
};

use super::base::Problem;

/// Definition of an objective function.
///
/// ## Defining an objective
///
/// An objective is any type that implements [`Objective`] and [`Problem`]
/// traits.
///
/// ```rust
/// use downhill::nalgebra as na;
/// use downhill::{Domain, Objective, Problem};
/// use na::{Dyn, IsContiguous};
///
/// struct Sphere;
///
/// impl Problem for Sphere {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::unconstrained(2)
///     }
/// }
///
/// impl Objective for Sphere {
///     fn value<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         x[0].powi(2) + x[1].powi(2)
///     }
/// }
/// ```
///
/// The function must be pure: evaluating it repeatedly in an unchanged point
/// must give the identical value, because the algorithms cache values to avoid
/// recomputation. It must also be total over the domain that the algorithm
/// explores.
pub trait Objective: Problem {
    /// Calculates the objective value in given point.
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}

/// An objective function with a known gradient.
///
/// Required by the gradient-based descent framework
/// ([`ConjugateGradient`](crate::algo::ConjugateGradient)). The supplied
/// gradient must be the true gradient of [`Objective::value`] for the
/// convergence guarantees to hold.
pub trait Gradient: Objective {
    /// Calculates the gradient in given point, storing it into `gx`.
    fn gradient<Sx, Sgx>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        gx: &mut Vector<Self::Field, Dyn, Sgx>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sgx: StorageMut<Self::Field, Dyn>;
}
