//! The collection of implemented algorithms.

pub mod conjugate_gradient;
pub mod genetic;
pub mod line_search;
pub mod nelder_mead;

pub use conjugate_gradient::ConjugateGradient;
pub use genetic::Genetic;
pub use line_search::Backtracking;
pub use nelder_mead::{NelderMead, Simplex};
